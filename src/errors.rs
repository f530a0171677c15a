use thiserror::Error;

pub type Result<T, E = DriverError> = std::result::Result<T, E>;

/// Errors surfaced by the driver core.
///
/// `Argument`, `Unsupported`, `Encoding` and `Config` are raised synchronously,
/// before any operation reaches an executor. Everything else travels through a
/// [`Completion`](crate::completion::Completion) error channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("invalid argument: {0}")]
    Argument(String),

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("Encode error: {0}")]
    Encoding(String),

    #[error("Decode error: {0}")]
    Decoding(String),

    #[error("operation failed: {0}")]
    Operation(String),

    #[error("server error {code}: {message}")]
    Server { code: i32, message: String },

    #[error("iteration aborted: {0}")]
    Iteration(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl DriverError {
    /// True for the error classes reported before any asynchronous work is scheduled.
    #[must_use]
    pub const fn is_synchronous(&self) -> bool {
        matches!(self, Self::Argument(_) | Self::Unsupported(_) | Self::Encoding(_) | Self::Config(_))
    }

    pub(crate) fn argument(name: &str, reason: &str) -> Self {
        Self::Argument(format!("{name}: {reason}"))
    }
}

impl From<std::io::Error> for DriverError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<toml::de::Error> for DriverError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}
