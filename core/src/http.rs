//! Request dispatch and response parsing.
//!
//! # Design
//! `HttpRequest` owns a [`Route`] and an [`Encoding`]. `fetch` opens the
//! route, writes caller-added header lines, one `Cookie:` line, the
//! encoding's headers, a blank line and the body, then reads until the peer
//! closes. The socket is closed on every path. HTTP/1.0 with
//! `Connection: close` means the end of the stream is the end of the
//! response, so no framing is decoded.
//!
//! `HttpResponse` is built once from the raw bytes and never changes.

use std::fmt;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::cookie::Cookie;
use crate::encoding::Encoding;
use crate::error::{FetchError, SocketError};
use crate::headers::HttpHeaders;
use crate::jar::CookieJar;
use crate::route::Route;
use crate::socket::Socket;

const HEADER_SEPARATOR: &[u8] = b"\r\n\r\n";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request, dispatched at most once per `fetch`/`send`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    route: Route,
    encoding: Encoding,
    headers: Vec<String>,
    cookies: Vec<String>,
    jar_cookies: Vec<String>,
}

impl HttpRequest {
    pub fn new(route: Route, encoding: Encoding) -> Self {
        Self {
            route,
            encoding,
            headers: Vec::new(),
            cookies: Vec::new(),
            jar_cookies: Vec::new(),
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    /// Add a complete header line such as `"Accept: text/html"`.
    pub fn add_header_line(&mut self, line: &str) {
        self.headers.push(line.to_string());
    }

    /// Send a cookie regardless of what the jar holds.
    pub fn add_cookie(&mut self, name: &str, value: &str) {
        self.cookies.push(format!("{name}={value}"));
    }

    /// Replace the jar-selected cookies with those visible at the target URL.
    pub fn read_cookies_from_jar(&mut self, jar: &CookieJar) {
        self.jar_cookies = jar.select_as_pairs(self.route.url());
    }

    /// Send the request with cookies from `jar` and store the cookies the
    /// server sets back into it.
    pub fn fetch(
        &mut self,
        jar: &mut CookieJar,
        timeout: Duration,
    ) -> Result<HttpResponse, FetchError> {
        self.read_cookies_from_jar(jar);
        let response = self.send(timeout)?;
        response
            .headers()
            .write_cookies_to_jar(jar, self.route.url());
        Ok(response)
    }

    /// Send the request without consulting or updating a cookie jar.
    pub fn send(&self, timeout: Duration) -> Result<HttpResponse, FetchError> {
        let method = self.encoding.method();
        let mut socket = self.route.create_connection(method, timeout)?;

        let result = self
            .dispatch(&mut socket)
            .map_err(FetchError::from)
            .and_then(|()| {
                let raw = socket.read_all();
                HttpResponse::parse(
                    self.route.url().clone(),
                    method,
                    socket.sent().to_vec(),
                    &raw,
                    timeout,
                )
            });
        socket.close();

        match &result {
            Ok(response) => debug!(
                url = %self.route.url(),
                status = response.headers().response_code(),
                bytes = response.content().len(),
                "fetched"
            ),
            Err(e) => debug!(url = %self.route.url(), error = %e, "fetch failed"),
        }
        result
    }

    fn dispatch(&self, socket: &mut Socket) -> Result<(), SocketError> {
        for line in &self.headers {
            socket.write(format!("{line}\r\n").as_bytes())?;
        }
        let cookies: Vec<&str> = self
            .cookies
            .iter()
            .chain(&self.jar_cookies)
            .map(String::as_str)
            .collect();
        if !cookies.is_empty() {
            socket.write(format!("Cookie: {}\r\n", cookies.join(";")).as_bytes())?;
        }
        self.encoding.write_headers_to(socket)?;
        socket.write(b"\r\n")?;
        self.encoding.write_to(socket)
    }
}

/// A fully received response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    url: Url,
    method: HttpMethod,
    sent: Vec<u8>,
    headers: HttpHeaders,
    content: String,
}

impl HttpResponse {
    /// Split `raw` into headers and content.
    ///
    /// `file://` payloads have no headers. `timeout` only feeds the error
    /// message when nothing was received.
    pub fn parse(
        url: Url,
        method: HttpMethod,
        sent: Vec<u8>,
        raw: &[u8],
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        if raw.is_empty() {
            return Err(FetchError::Timeout(timeout));
        }

        let (headers, content) = if url.scheme() == "file" {
            (HttpHeaders::default(), String::from_utf8_lossy(raw).into_owned())
        } else {
            let Some(at) = find_separator(raw) else {
                let headers = HttpHeaders::parse(&String::from_utf8_lossy(raw));
                return Err(FetchError::Unsplittable {
                    headers: Box::new(headers),
                });
            };
            (
                HttpHeaders::parse(&String::from_utf8_lossy(&raw[..at])),
                String::from_utf8_lossy(&raw[at + HEADER_SEPARATOR.len()..]).into_owned(),
            )
        };

        Ok(Self {
            url,
            method,
            sent,
            headers,
            content,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Raw request bytes that went down the wire.
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    pub fn headers(&self) -> &HttpHeaders {
        &self.headers
    }

    /// Everything after the first blank line.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn new_cookies(&self) -> &[Cookie] {
        self.headers.new_cookies()
    }
}

fn find_separator(raw: &[u8]) -> Option<usize> {
    raw.windows(HEADER_SEPARATOR.len())
        .position(|w| w == HEADER_SEPARATOR)
}
