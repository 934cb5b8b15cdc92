use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Trellis's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Trellis's crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs.
#[derive(Debug, Error)]
pub enum Error {
    /// The transducer reported no start state; nothing can be decoded.
    #[error("transducer has no start state")]
    NoStartState,

    /// The search's internal bookkeeping disagrees with itself (for example the
    /// state index points past the current beam). Indicates a corrupt
    /// transducer or a bug; the decode is aborted.
    #[error("search state corrupted: {message}")]
    Corrupt { message: String },

    /// The acoustic scorer failed. The decoder performs no recovery; the error
    /// is passed through unchanged.
    #[error("acoustic scorer error: {message}")]
    Scorer {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },

    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl Error {
    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a scorer-side failure. Public so scorer implementations outside
    /// this crate can report through the same channel the decoder propagates.
    pub fn scorer(message: impl Into<String>) -> Self {
        Self::Scorer {
            message: message.into(),
            source: None,
        }
    }
}

#[derive(Debug)]
struct AnyhowChainError {
    rendered: String,
}

impl fmt::Display for AnyhowChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

impl StdError for AnyhowChainError {}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other {
            message: err.to_string(),
            source: Some(Box::new(AnyhowChainError {
                rendered: format!("{err:#}"),
            })),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}
