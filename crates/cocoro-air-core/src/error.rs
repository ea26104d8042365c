//! Unified error handling for Cocoro Air.
//!
//! This module provides a common error type shared by the configuration
//! layer and the command-line host.

/// Unified error type for Cocoro Air.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system errors.
    #[error("I/O error: {0}")]
    Io(String),

    /// Validation errors.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for convenience.
pub type Result<T> = std::result::Result<T, Error>;

#[macro_export]
macro_rules! config_err {
    ($msg:expr) => {
        $crate::error::Error::Config($msg.into())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::Config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! validation_err {
    ($msg:expr) => {
        $crate::error::Error::Validation($msg.into())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::Error::Validation(format!($fmt, $($arg)*))
    };
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
