//! Raw-socket HTTP engine for a scripted test browser.
//!
//! # Overview
//! Speaks just enough HTTP/1.0 over a plain TCP, TLS or local-file socket to
//! fetch a page, submit a form and carry cookies between requests. Every
//! request opens a fresh connection with `Connection: close` and the response
//! ends when the peer closes, so there is no framing or keep-alive logic.
//!
//! # Design
//! - [`Socket`] owns one connection and records every byte written to it.
//! - [`Route`] turns a URL (optionally via a proxy) into the request preamble.
//! - [`Encoding`] carries the method and produces the body.
//! - [`HttpRequest`] ties the three together; [`HttpResponse`] is the
//!   immutable result with parsed [`HttpHeaders`].
//! - [`CookieJar`] is plain owned state passed in by the caller, so a test
//!   session decides when cookies persist and when the browser "restarts".
//! - Failures are [`FetchError`] / [`SocketError`] values carrying a stable
//!   [`ErrorCode`].

pub mod cookie;
pub mod encoding;
pub mod error;
pub mod headers;
pub mod http;
pub mod jar;
pub mod route;
pub mod socket;

pub use cookie::Cookie;
pub use encoding::Encoding;
pub use error::{ErrorCode, FetchError, SocketError};
pub use headers::HttpHeaders;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use jar::CookieJar;
pub use route::{parse_url, ProxyCredentials, Route};
pub use socket::Socket;
