//! Error types for objstor-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for objstor-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for objstor-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invocation or configuration error: unknown command, bad arguments, bad config file
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// The listing producer failed part way through a stream
    #[error("Listing stream failed: {0}")]
    Stream(String),

    /// A failure tied to a specific path or key
    #[error("failed to {action} {target}: {source}")]
    Operation {
        action: &'static str,
        target: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with the action and path/key that caused it
    pub fn context(self, action: &'static str, target: impl Into<String>) -> Self {
        Error::Operation {
            action,
            target: target.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping any `Operation` wrappers
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Operation { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.root_cause() {
            Error::Config(_) | Error::TomlParse(_) | Error::InvalidUrl(_) => 2, // UsageError
            Error::Network(_) | Error::Stream(_) => 3,                         // NetworkError
            Error::Auth(_) => 4,                                               // AuthError
            Error::NotFound(_) => 5,                                           // NotFound
            _ => 1,                                                            // GeneralError
        }
    }
}

/// Attach path/key context to a fallible result
pub trait ResultExt<T> {
    fn context(self, action: &'static str, target: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, action: &'static str, target: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(action, target))
    }
}
