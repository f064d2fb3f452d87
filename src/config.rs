use std::time::Duration;

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 7379;

/// Send/receive timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Construction-time settings of a [`KvClient`](crate::KvClient).
///
/// ```
/// use std::time::Duration;
/// use kvline::ClientConfig;
///
/// let config = ClientConfig::default()
///     .host("10.0.0.7")
///     .port(9000)
///     .timeout(Duration::from_millis(250));
/// assert_eq!(config.port, 9000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server host name or IP address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Bound applied to connect, send and receive. Zero disables it.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Sets the server host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the server port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the I/O timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The timeout as the socket layer expects it: `None` for zero.
    pub(crate) fn socket_timeout(&self) -> Option<Duration> {
        if self.timeout.is_zero() {
            None
        } else {
            Some(self.timeout)
        }
    }
}
