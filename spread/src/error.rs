use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpreadError {
    #[error("zone list is empty")]
    NoZones,

    #[error("zone thresholds must be strictly ascending: {prev} then {next}")]
    UnorderedZones { prev: f64, next: f64 },

    #[error("zone threshold must be positive, got {0}")]
    NonPositiveThreshold(f64),

    #[error("analysis task failed: {0}")]
    Join(String),
}
