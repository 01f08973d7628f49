//! Live spread alerting.
//!
//! - [`engine`]: pure alert state machine (zones, shared cooldown, history)
//! - [`feed`]: where live spread samples come from
//! - [`sink`]: where fired alerts go (sound, notification)
//! - [`runner`]: the polling loop with start/stop lifecycle

pub mod clock;
pub mod engine;
pub mod errors;
pub mod feed;
pub mod runner;
pub mod sink;
pub mod zone;

pub use clock::{Clock, SystemClock};
pub use engine::{AlertEngineState, AlertEvent, FiredAlert, HISTORY_LIMIT, TickOutcome, evaluate};
pub use errors::{MonitorError, SinkError};
pub use feed::{LiveFeed, PairFeed};
pub use runner::{AlertMonitor, MonitorConfig, MonitorState};
pub use sink::{AlertSink, DEFAULT_SOUND, LogSink, deliver, normalize_sound_ref};
pub use zone::{AlertZone, Comparator};
