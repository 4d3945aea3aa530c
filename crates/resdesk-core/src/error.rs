use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Why a single raw reservation could not be normalized cleanly.
///
/// Never surfaced past the normalizer: the record is replaced by a fallback
/// and the error is kept alongside it for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record has no date")]
    MissingDate,

    #[error("unparseable date: {0}")]
    InvalidDate(String),
}
