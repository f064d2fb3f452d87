#![deny(missing_docs)]

//! A synchronous client for a line-based key-value store protocol.
//!
//! The client speaks a plain-text protocol over TCP: every command and every
//! response is one UTF-8 line terminated by CRLF. Three operations are
//! supported, `SET`, `GET` and `DEL`, over a single persistent connection
//! that is opened lazily and reopened after a failure.

mod client;
mod config;
mod connection;
mod error;
/// Command formatting and response parsing for the line protocol.
pub mod protocol;

pub use client::KvClient;
pub use config::{ClientConfig, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT};
pub use error::{ErrorKind, KvError, Result};
