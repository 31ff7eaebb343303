//! Error types for the socket and request layers.
//!
//! # Design
//! Network and parse failures are plain values. A failed connection or an
//! unparseable payload never panics; the caller receives an error that
//! carries both a human readable message and a stable [`ErrorCode`] so test
//! reports stay comparable between runs.
//!
//! `FetchError::Unsplittable` keeps the best-effort headers that could still
//! be read from the payload, so callers can inspect a degenerate response
//! without a second round-trip.

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::headers::HttpHeaders;

/// Stable identifiers attached to every reported failure.
///
/// The `N` family is produced by the network layer, the rest by assertion
/// helpers built on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Connection could not be established or was lost while writing.
    N01,
    /// The response could not be split into headers and content.
    N02,
    /// Nothing was received before the deadline elapsed.
    N03,
    /// The page or element the test expected is not there.
    D01,
    /// Page content or a value did not match the expectation.
    C01,
    /// An unexpected HTTP status.
    S01,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::N01 => "N01",
            ErrorCode::N02 => "N02",
            ErrorCode::N03 => "N03",
            ErrorCode::D01 => "D01",
            ErrorCode::C01 => "C01",
            ErrorCode::S01 => "S01",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced while opening or writing to a [`Socket`](crate::Socket).
#[derive(Debug, Error)]
pub enum SocketError {
    /// DNS resolution or the TCP connect failed.
    #[error("Cannot open [{host}:{port}] with [{source}] within [{}] seconds", .timeout.as_secs_f64())]
    Connect {
        host: String,
        port: u16,
        timeout: Duration,
        #[source]
        source: io::Error,
    },

    /// The TCP connection succeeded but the TLS handshake did not.
    #[error("Cannot negotiate a secure transport with [{host}:{port}]: {reason}")]
    Tls {
        host: String,
        port: u16,
        reason: String,
    },

    /// A write failed; the socket has been closed.
    #[error("Cannot write to socket: {0}")]
    Write(#[source] io::Error),

    /// The socket was closed before the operation.
    #[error("Socket is closed")]
    Closed,

    /// The local file behind a `file://` URL could not be read.
    #[error("Cannot read file [{path}]: {source}")]
    File {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl SocketError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::N01
    }
}

/// Errors returned by [`HttpRequest::fetch`](crate::HttpRequest::fetch).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Error reading data from server [{0}]")]
    Socket(#[from] SocketError),

    /// The peer sent nothing before the read deadline.
    #[error("Timeout {} seconds", .0.as_secs_f64())]
    Timeout(Duration),

    /// Bytes arrived but no blank line separated headers from content.
    #[error("Could not split headers from content")]
    Unsplittable { headers: Box<HttpHeaders> },
}

impl FetchError {
    pub fn code(&self) -> ErrorCode {
        match self {
            FetchError::Socket(e) => e.code(),
            FetchError::Timeout(_) => ErrorCode::N03,
            FetchError::Unsplittable { .. } => ErrorCode::N02,
        }
    }

    /// Headers recovered from a payload that could not be split, if any.
    pub fn partial_headers(&self) -> Option<&HttpHeaders> {
        match self {
            FetchError::Unsplittable { headers } => Some(headers.as_ref()),
            _ => None,
        }
    }
}
