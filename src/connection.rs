use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::{debug, trace};

use crate::protocol::CRLF;
use crate::{KvError, Result};

/// Size of each read from the socket.
const CHUNK_SIZE: usize = 4096;

/// One open TCP connection to the server.
///
/// Dropping the value closes the socket.
pub(crate) struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    /// Bytes received past the last returned line. Not size-limited.
    pending: Vec<u8>,
}

impl Connection {
    /// Resolves `host:port`, connects, and applies `timeout` to both directions.
    pub(crate) fn open(host: &str, port: u16, timeout: Option<Duration>) -> Result<Self> {
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|_| KvError::Connection(format!("failed to resolve hostname: {}", host)))?
            .collect();
        if addrs.is_empty() {
            return Err(KvError::Connection(format!(
                "failed to resolve hostname: {}",
                host
            )));
        }

        let stage = format!("connect to {}:{}", host, port);
        let mut last_err = None;
        let mut connected = None;
        for addr in addrs {
            let attempt = match timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => {
                    connected = Some((stream, addr));
                    break;
                }
                Err(e) => {
                    debug!("Connecting to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }
        let (stream, peer) = match connected {
            Some(pair) => pair,
            None => {
                let err = last_err
                    .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address"));
                return Err(KvError::io(&stage, err));
            }
        };

        // A failure here drops `stream`, closing the half-configured socket.
        stream
            .set_read_timeout(timeout)
            .and_then(|_| stream.set_write_timeout(timeout))
            .map_err(|e| KvError::io("set socket timeout", e))?;
        stream
            .set_nodelay(true)
            .map_err(|e| KvError::io("configure socket", e))?;

        debug!("Connected to {}", peer);
        Ok(Connection {
            stream,
            peer,
            pending: Vec::new(),
        })
    }

    /// Address of the connected server.
    pub(crate) fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Writes `line` followed by CRLF, retrying partial writes.
    pub(crate) fn send_line(&mut self, line: &str) -> Result<()> {
        let mut buf = Vec::with_capacity(line.len() + CRLF.len());
        buf.extend_from_slice(line.as_bytes());
        buf.extend_from_slice(CRLF.as_bytes());

        let mut sent = 0;
        while sent < buf.len() {
            match self.stream.write(&buf[sent..]) {
                Ok(0) => {
                    return Err(KvError::io(
                        "send",
                        io::Error::new(io::ErrorKind::WriteZero, "connection closed"),
                    ))
                }
                Ok(n) => sent += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(KvError::io("send", e)),
            }
        }
        Ok(())
    }

    /// Reads until a CRLF is buffered and returns the text before it.
    ///
    /// Bytes received after that CRLF stay in `pending` and are consumed by the
    /// next call, so a server that answers ahead of time stays in step. The
    /// buffer is unbounded: a peer that never sends CRLF is only stopped by
    /// the read timeout, which applies per read, not per line.
    pub(crate) fn recv_line(&mut self) -> Result<String> {
        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            if let Some(pos) = find_crlf(&self.pending) {
                let rest = self.pending.split_off(pos + CRLF.len());
                let mut line = std::mem::replace(&mut self.pending, rest);
                line.truncate(pos);
                trace!("{} bytes left after line", self.pending.len());
                return String::from_utf8(line)
                    .map_err(|_| KvError::Protocol("response is not valid UTF-8".to_owned()));
            }

            match self.stream.read(&mut chunk) {
                Ok(0) => return Err(KvError::Connection("server closed connection".to_owned())),
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(KvError::io("receive", e)),
            }
        }
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(CRLF.len()).position(|w| w == CRLF.as_bytes())
}
