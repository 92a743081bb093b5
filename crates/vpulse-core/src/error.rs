use thiserror::Error;

/// Canonical error type for load-test analysis.
///
/// Only conditions that make a run impossible are errors. An input that
/// parses but yields no usable rows is reported through
/// [`DataStatus::Insufficient`](crate::DataStatus) on a valid report instead.
#[derive(Debug, Error)]
pub enum PulseError {
    /// Input could not be read as tabular data at all. Retrying the same
    /// input reproduces the failure, so callers should not retry.
    #[error("malformed input: {message}")]
    MalformedInput {
        /// Human-readable description of what could not be parsed.
        message: String,
    },

    /// I/O error while reading the input log.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration sources could not be loaded or deserialized.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Report serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl PulseError {
    /// Creates a `MalformedInput` variant.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput {
            message: message.into(),
        }
    }

    /// Returns true when the error is terminal for the input that caused it.
    #[must_use]
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::MalformedInput { .. })
    }
}

impl From<csv::Error> for PulseError {
    fn from(err: csv::Error) -> Self {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => Self::Io(io),
            _ => Self::malformed(message),
        }
    }
}

impl From<serde_json::Error> for PulseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenient result alias for analysis operations.
pub type PulseResult<T> = Result<T, PulseError>;
