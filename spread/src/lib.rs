//! Spread analysis core.
//!
//! Turns two price series into a spread series and derives:
//! - peak / convergence events and scored entry recommendations
//! - per-zone dwell time and recurrence statistics
//!
//! Everything here is pure, synchronous computation over already-fetched
//! data. Fetching and alerting live in the `sources` and `monitor` crates.

pub mod aligner;
pub mod detector;
pub mod error;
pub mod report;
pub mod scorer;
pub mod types;
pub mod zones;

pub use aligner::align;
pub use detector::{PeakEvent, detect};
pub use error::SpreadError;
pub use report::{SpreadReport, analyze_spread, analyze_spread_parallel, find_opportunities};
pub use scorer::{Recommendation, TOP_RECOMMENDATIONS, score};
pub use types::{PricePoint, SpreadPoint, SpreadSeries};
pub use zones::{Zone, ZoneReport, ZoneSet, ZoneStat, analyze as analyze_zones};
