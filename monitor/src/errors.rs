use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("monitor is already running")]
    AlreadyRunning,

    #[error("invalid alert zone {0:?}: expected e.g. \">1.0\" or \"<-0.5@sound-url\"")]
    InvalidZone(String),

    #[error("no alert zone at index {0}")]
    NoSuchZone(usize),

    #[error("polling interval must be greater than zero")]
    ZeroInterval,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SinkError {
    #[error("sound playback failed: {0}")]
    Playback(String),

    #[error("notification failed: {0}")]
    Notification(String),
}
