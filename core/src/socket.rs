//! Byte-level connections scoped to a single request/response cycle.
//!
//! # Design
//! A `Socket` wraps one of three transports: a plain `TcpStream`, a rustls
//! client stream over TCP, or an in-memory cursor over a local file (used for
//! `file://` URLs). All three share the same contract: `write` records the
//! bytes it sent, `read_all` drains the peer until it closes or the read
//! deadline passes, and `close` is idempotent. Dropping a socket closes it.
//!
//! The TLS handshake is driven to completion inside `connect_secure`, so a
//! secure socket is either fully negotiated or never returned.

use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use tracing::{debug, warn};

use crate::error::SocketError;

const READ_CHUNK: usize = 4096;

enum Stream {
    Plain(TcpStream),
    Secure(Box<StreamOwned<ClientConnection, TcpStream>>),
    File(Cursor<Vec<u8>>),
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Stream::Plain(s) => s.read(buf),
            Stream::Secure(s) => s.read(buf),
            Stream::File(c) => c.read(buf),
        }
    }
}

impl Write for Stream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Stream::Plain(s) => s.write(buf),
            Stream::Secure(s) => s.write(buf),
            // Nothing listens behind a file; the bytes only land in `sent`.
            Stream::File(_) => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Stream::Plain(s) => s.flush(),
            Stream::Secure(s) => s.flush(),
            Stream::File(_) => Ok(()),
        }
    }
}

/// A connection used for exactly one request/response exchange.
pub struct Socket {
    stream: Option<Stream>,
    sent: Vec<u8>,
}

impl Socket {
    /// Open a plain TCP connection to `host:port`.
    ///
    /// `timeout` bounds the connect as well as every subsequent read and
    /// write.
    pub fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self, SocketError> {
        let tcp = open_tcp(host, port, timeout)?;
        Ok(Self::from_stream(Stream::Plain(tcp)))
    }

    /// Open a TCP connection and negotiate TLS on top of it.
    pub fn connect_secure(host: &str, port: u16, timeout: Duration) -> Result<Self, SocketError> {
        let mut tcp = open_tcp(host, port, timeout)?;
        let tls_error = |reason: String| SocketError::Tls {
            host: host.to_string(),
            port,
            reason,
        };

        let config = tls_config().map_err(|e| tls_error(e.to_string()))?;
        let server_name =
            ServerName::try_from(host.to_string()).map_err(|e| tls_error(e.to_string()))?;
        let mut conn =
            ClientConnection::new(config, server_name).map_err(|e| tls_error(e.to_string()))?;

        while conn.is_handshaking() {
            conn.complete_io(&mut tcp)
                .map_err(|e| tls_error(e.to_string()))?;
        }
        debug!(host, port, "tls handshake complete");

        Ok(Self::from_stream(Stream::Secure(Box::new(StreamOwned::new(
            conn, tcp,
        )))))
    }

    /// Stand-in socket that serves the contents of a local file.
    pub fn open_file(path: &Path) -> Result<Self, SocketError> {
        let bytes = fs::read(path).map_err(|source| SocketError::File {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_stream(Stream::File(Cursor::new(bytes))))
    }

    fn from_stream(stream: Stream) -> Self {
        Self {
            stream: Some(stream),
            sent: Vec::new(),
        }
    }

    /// Write and flush `bytes`. On failure the socket is closed.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), SocketError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(SocketError::Closed);
        };
        if let Err(e) = stream.write_all(bytes).and_then(|_| stream.flush()) {
            warn!(error = %e, "socket write failed");
            self.close();
            return Err(SocketError::Write(e));
        }
        self.sent.extend_from_slice(bytes);
        Ok(())
    }

    /// Read until the peer closes or the read deadline elapses.
    ///
    /// Whatever arrived before the deadline is returned; a timeout with
    /// nothing read yields an empty buffer. A closed socket reads nothing.
    pub fn read_all(&mut self) -> Vec<u8> {
        let mut received = Vec::new();
        let Some(stream) = self.stream.as_mut() else {
            return received;
        };

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match stream.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => received.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // Timeouts and TLS peers that skip close_notify end up here.
                    debug!(error = %e, read = received.len(), "read stopped");
                    break;
                }
            }
        }
        received
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Every byte successfully written so far.
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    pub fn close(&mut self) {
        match self.stream.take() {
            Some(Stream::Plain(tcp)) => {
                let _ = tcp.shutdown(Shutdown::Both);
            }
            Some(Stream::Secure(mut tls)) => {
                tls.conn.send_close_notify();
                let _ = tls.flush();
                let _ = tls.sock.shutdown(Shutdown::Both);
            }
            Some(Stream::File(_)) | None => {}
        }
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        self.close();
    }
}

fn open_tcp(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, SocketError> {
    let connect_error = |source: io::Error| SocketError::Connect {
        host: host.to_string(),
        port,
        timeout,
        source,
    };

    let addrs = (host, port).to_socket_addrs().map_err(connect_error)?;
    let mut last_error = io::Error::new(io::ErrorKind::NotFound, "host resolved to no address");
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(timeout)).map_err(connect_error)?;
                stream.set_write_timeout(Some(timeout)).map_err(connect_error)?;
                debug!(%addr, host, "connected");
                return Ok(stream);
            }
            Err(e) => last_error = e,
        }
    }
    Err(connect_error(last_error))
}

fn tls_config() -> Result<Arc<ClientConfig>, rustls::Error> {
    static CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();

    if let Some(config) = CONFIG.get() {
        return Ok(config.clone());
    }

    let roots = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };
    let config = ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()?
    .with_root_certificates(roots)
    .with_no_client_auth();

    Ok(CONFIG.get_or_init(|| Arc::new(config)).clone())
}
