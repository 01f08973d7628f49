use clap::{Args, Parser, Subcommand};

use monitor::AlertZone;
use sources::{SourceId, Timeframe};

#[derive(Debug, Parser)]
#[clap(name = "spreadwatch", version, about = "Cross-exchange spread analysis and alerts")]
pub struct Cli {
    /// Emit one JSON object per log line
    #[clap(long, global = true)]
    pub json_logs: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch history for both legs and print the spread report
    Analyze(AnalyzeArgs),
    /// Poll the latest prices and raise alerts until Ctrl-C
    Monitor(MonitorArgs),
}

/// The two legs being compared.
#[derive(Debug, Clone, Args)]
pub struct PairArgs {
    #[clap(long, default_value = "binance-spot")]
    pub source_a: SourceId,

    #[clap(long, default_value = "BTCUSDT")]
    pub symbol_a: String,

    #[clap(long, default_value = "okx")]
    pub source_b: SourceId,

    #[clap(long, default_value = "BTCUSDT")]
    pub symbol_b: String,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[clap(flatten)]
    pub pair: PairArgs,

    #[clap(long, default_value = "1m")]
    pub timeframe: Timeframe,

    /// Candles fetched per leg
    #[clap(long, default_value = "200")]
    pub limit: usize,

    /// Zone cut points in percent, e.g. "0.5,1,2" (default 1,2,3)
    #[clap(long, value_delimiter = ',')]
    pub zone_thresholds: Vec<f64>,

    /// Also list samples whose |spread| reaches this percent (0.5 when
    /// given without a value)
    #[clap(long, num_args = 0..=1, default_missing_value = "0.5")]
    pub opportunities: Option<f64>,

    /// Print the report as JSON instead of text
    #[clap(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct MonitorArgs {
    #[clap(flatten)]
    pub pair: PairArgs,

    #[clap(long, default_value = "5")]
    pub interval_secs: u64,

    /// Minimum time between two alerts, shared by all zones
    #[clap(long, default_value = "10")]
    pub cooldown_secs: u64,

    /// Alert zone, e.g. ">1.0", "<-0.5" or ">2@example.com/siren.mp3"
    #[clap(long = "zone", default_values = [">1.0"])]
    pub zones: Vec<AlertZone>,

    /// Disable alert sounds
    #[clap(long)]
    pub mute: bool,

    /// Enable desktop-style notifications
    #[clap(long)]
    pub notify: bool,
}
