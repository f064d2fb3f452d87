use std::fmt;
use std::io;

use thiserror::Error;

/// Error type for kvline client operations.
#[derive(Error, Debug)]
pub enum KvError {
    /// An argument was rejected before any network activity.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Establishing, using, or keeping the connection failed.
    ///
    /// The underlying socket has already been closed when this is returned.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server answered with `ERROR <message>` or with a line the
    /// operation does not understand.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// The class of a [`KvError`], without its detail message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// See [`KvError::Validation`].
    Validation,
    /// See [`KvError::Connection`].
    Connection,
    /// See [`KvError::Protocol`].
    Protocol,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Connection => "connection",
            ErrorKind::Protocol => "protocol",
        };
        f.write_str(name)
    }
}

impl KvError {
    /// Returns the class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            KvError::Validation(_) => ErrorKind::Validation,
            KvError::Connection(_) => ErrorKind::Connection,
            KvError::Protocol(_) => ErrorKind::Protocol,
        }
    }

    /// Returns the human-readable detail carried by this error.
    pub fn message(&self) -> &str {
        match self {
            KvError::Validation(msg) | KvError::Connection(msg) | KvError::Protocol(msg) => {
                msg.as_str()
            }
        }
    }

    /// Wraps an I/O failure that happened during `stage` into a connection error.
    pub(crate) fn io(stage: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                KvError::Connection(format!("{} timed out", stage))
            }
            _ => KvError::Connection(format!("{} failed: {}", stage, err)),
        }
    }
}

/// Result type alias for kvline operations.
pub type Result<T> = std::result::Result<T, KvError>;
