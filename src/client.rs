use std::net::SocketAddr;
use std::time::Duration;

use log::debug;

use crate::config::ClientConfig;
use crate::connection::Connection;
use crate::protocol::{Command, Reply};
use crate::{ErrorKind, KvError, Result};

/// The client of a line-protocol key-value store.
///
/// The client owns at most one TCP connection. It is opened lazily by the
/// first operation, reused by every following one, and dropped as soon as an
/// I/O error occurs; the next operation then reconnects. Moving the client
/// moves the open connection with it.
///
/// ```no_run
/// use kvline::KvClient;
///
/// # fn main() -> kvline::Result<()> {
/// let mut client = KvClient::with_config(Default::default())?;
/// client.set("user:1", "alice")?;
/// assert_eq!(client.get("user:1")?, Some("alice".to_owned()));
/// assert!(client.del("user:1")?);
/// # Ok(())
/// # }
/// ```
pub struct KvClient {
    config: ClientConfig,
    conn: Option<Connection>,
}

impl KvClient {
    /// Creates a client for `host:port`. No connection is made yet.
    ///
    /// Fails with a validation error if `host` is empty.
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Result<Self> {
        Self::with_config(ClientConfig {
            host: host.into(),
            port,
            timeout,
        })
    }

    /// Creates a client from a [`ClientConfig`]. No connection is made yet.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        if config.host.is_empty() {
            return Err(KvError::Validation("Host cannot be empty".to_owned()));
        }
        Ok(KvClient { config, conn: None })
    }

    /// The configured server host.
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// The configured server port.
    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// The configured I/O timeout.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Returns `true` while a connection is open.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Address of the server the open connection is attached to, if any.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.conn.as_ref().map(Connection::peer)
    }

    /// Opens the connection now instead of on the next operation.
    ///
    /// Does nothing when a connection is already open.
    pub fn connect(&mut self) -> Result<()> {
        self.connection().map(|_| ())
    }

    /// Closes the connection if one is open. The client stays usable.
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            debug!("Closing connection to {}", conn.peer());
        }
    }

    /// Sets a key-value pair on the server.
    ///
    /// An empty `value` is stored as the empty string.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let line = self.request(Command::Set { key, value })?;
        match Reply::parse(&line) {
            Reply::Ok => Ok(()),
            Reply::Error(msg) => Err(KvError::Protocol(msg)),
            _ => Err(unexpected(&line)),
        }
    }

    /// Gets the value for a key from the server.
    ///
    /// Returns `None` if the key does not exist.
    pub fn get(&mut self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let line = self.request(Command::Get { key })?;
        match Reply::parse(&line) {
            Reply::NotFound => Ok(None),
            Reply::Value(value) => Ok(Some(value)),
            Reply::Error(msg) => Err(KvError::Protocol(msg)),
            _ => Err(unexpected(&line)),
        }
    }

    /// Deletes a key on the server.
    ///
    /// The server acknowledges deletes of absent keys too, so a successful
    /// call always returns `true`.
    pub fn del(&mut self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let line = self.request(Command::Del { key })?;
        match Reply::parse(&line) {
            Reply::Ok => Ok(true),
            Reply::Error(msg) => Err(KvError::Protocol(msg)),
            _ => Err(unexpected(&line)),
        }
    }

    /// Checks that the server is alive and answering on this connection.
    pub fn ping(&mut self) -> Result<()> {
        let line = self.request(Command::Ping)?;
        match Reply::parse(&line) {
            Reply::Pong => Ok(()),
            Reply::Error(msg) => Err(KvError::Protocol(msg)),
            _ => Err(unexpected(&line)),
        }
    }

    fn connection(&mut self) -> Result<&mut Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => Connection::open(
                &self.config.host,
                self.config.port,
                self.config.socket_timeout(),
            )?,
        };
        Ok(self.conn.insert(conn))
    }

    /// Sends one command and reads one response line.
    ///
    /// Any connection error drops the socket before it is returned.
    fn request(&mut self, command: Command<'_>) -> Result<String> {
        match command {
            Command::Set { key, .. } => debug!("Sending SET {} <value>", key),
            _ => debug!("Sending {}", command),
        }

        let line = command.to_string();
        let conn = self.connection()?;
        let result = conn.send_line(&line).and_then(|_| conn.recv_line());
        match &result {
            Ok(response) => debug!("Received {}", response),
            Err(e) if e.kind() == ErrorKind::Connection => {
                debug!(
                    "{} {} failed, dropping connection: {}",
                    command.verb(),
                    command.key().unwrap_or_default(),
                    e
                );
                self.conn = None;
            }
            Err(_) => {}
        }
        result
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(KvError::Validation("Key cannot be empty".to_owned()));
    }
    Ok(())
}

fn unexpected(line: &str) -> KvError {
    KvError::Protocol(format!("Unexpected response: {}", line))
}
