//! Transport layer: an encrypted, blocking byte-stream connection
//!
//! The crawler never sees sockets directly; it talks to a `Connection`,
//! which is just ordered bytes in and out. The production implementation
//! wraps a TLS stream over TCP. Tests substitute scripted connections.

use crate::config::SiteConfig;
use crate::CrawlError;
use native_tls::{TlsConnector, TlsStream};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

/// An ordered byte-stream connection with blocking semantics
///
/// `recv` blocks until at least one byte is available or the peer closes;
/// a return of 0 means the peer closed. A connection is never reused
/// after `close`.
pub trait Connection {
    /// Queues all of `data` onto the stream
    fn send(&mut self, data: &[u8]) -> std::io::Result<()>;

    /// Reads available bytes into `buf`, returning how many arrived
    fn recv(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;

    /// Shuts the connection down; further use is an error
    fn close(&mut self) -> std::io::Result<()>;
}

/// A TLS connection to the target site
pub struct TlsConnection {
    stream: TlsStream<TcpStream>,
    closed: bool,
}

impl TlsConnection {
    /// Establishes a TLS connection to the configured host and port
    ///
    /// The read timeout (when non-zero) applies to every subsequent
    /// `recv`; expiry surfaces as a `TimedOut`/`WouldBlock` IO error.
    ///
    /// # Arguments
    ///
    /// * `site` - Host, port, and related site settings
    /// * `read_timeout` - Per-recv timeout, or None for blocking forever
    ///
    /// # Returns
    ///
    /// * `Ok(TlsConnection)` - Handshake completed
    /// * `Err(CrawlError::Connect)` - TCP or TLS setup failed
    pub fn connect(site: &SiteConfig, read_timeout: Option<Duration>) -> Result<Self, CrawlError> {
        let connect_err = |message: String| CrawlError::Connect {
            host: site.host.clone(),
            port: site.port,
            message,
        };

        let connector = TlsConnector::new().map_err(|e| connect_err(e.to_string()))?;
        let tcp = TcpStream::connect((site.host.as_str(), site.port))
            .map_err(|e| connect_err(e.to_string()))?;
        tcp.set_read_timeout(read_timeout)
            .map_err(|e| connect_err(e.to_string()))?;
        let stream = connector
            .connect(&site.host, tcp)
            .map_err(|e| connect_err(e.to_string()))?;

        tracing::debug!("TLS connection established to {}:{}", site.host, site.port);

        Ok(Self {
            stream,
            closed: false,
        })
    }
}

impl Connection for TlsConnection {
    fn send(&mut self, data: &[u8]) -> std::io::Result<()> {
        self.stream.write_all(data)?;
        self.stream.flush()
    }

    fn recv(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.stream.read(buf)
    }

    fn close(&mut self) -> std::io::Result<()> {
        if !self.closed {
            self.closed = true;
            self.stream.shutdown()?;
        }
        Ok(())
    }
}

impl Drop for TlsConnection {
    fn drop(&mut self) {
        // Connection must be released on every exit path, including
        // error returns during the auth bootstrap.
        let _ = self.close();
    }
}
