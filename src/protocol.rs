use std::fmt;

/// Line terminator for every command and response.
pub const CRLF: &str = "\r\n";

/// Wire representation of an empty value.
pub const EMPTY_VALUE: &str = "\"\"";

const ERROR_PREFIX: &str = "ERROR ";
const VALUE_PREFIX: &str = "VALUE ";

/// Command sent from client to server.
///
/// `Display` renders the command line without its CRLF terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Set a key-value pair.
    Set {
        /// The key to set.
        key: &'a str,
        /// The value to associate with the key.
        value: &'a str,
    },
    /// Get the value for a key.
    Get {
        /// The key to look up.
        key: &'a str,
    },
    /// Delete a key.
    Del {
        /// The key to delete.
        key: &'a str,
    },
    /// Check that the server is alive.
    Ping,
}

impl Command<'_> {
    /// Returns the command verb.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::Set { .. } => "SET",
            Command::Get { .. } => "GET",
            Command::Del { .. } => "DEL",
            Command::Ping => "PING",
        }
    }

    /// Returns the key the command operates on, if it takes one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Command::Set { key, .. } | Command::Get { key } | Command::Del { key } => Some(*key),
            Command::Ping => None,
        }
    }
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Set { key, value } => write!(f, "SET {} {}", key, format_value(value)),
            Command::Get { key } => write!(f, "GET {}", key),
            Command::Del { key } => write!(f, "DEL {}", key),
            Command::Ping => f.write_str("PING"),
        }
    }
}

/// Formats a value for the wire: the empty string becomes `""`.
pub fn format_value(value: &str) -> &str {
    if value.is_empty() {
        EMPTY_VALUE
    } else {
        value
    }
}

/// Reverses [`format_value`] for a value read from a `VALUE` reply.
pub fn parse_value(raw: &str) -> String {
    if raw == EMPTY_VALUE {
        String::new()
    } else {
        raw.to_owned()
    }
}

/// Response line sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `OK`
    Ok,
    /// `VALUE <value>`, already unescaped.
    Value(String),
    /// `NOT_FOUND`
    NotFound,
    /// `PONG`
    Pong,
    /// `ERROR <message>`
    Error(String),
    /// Anything else, kept verbatim.
    Unknown(String),
}

impl Reply {
    /// Classifies one response line (without its CRLF).
    pub fn parse(line: &str) -> Reply {
        if line == "OK" {
            Reply::Ok
        } else if line == "NOT_FOUND" {
            Reply::NotFound
        } else if line == "PONG" {
            Reply::Pong
        } else if let Some(message) = line.strip_prefix(ERROR_PREFIX) {
            Reply::Error(message.to_owned())
        } else if let Some(value) = line.strip_prefix(VALUE_PREFIX) {
            Reply::Value(parse_value(value))
        } else {
            Reply::Unknown(line.to_owned())
        }
    }
}
