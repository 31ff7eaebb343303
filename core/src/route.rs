//! Turning a target URL into request-line bytes and an open socket.
//!
//! # Design
//! A `Route` is either direct or goes through a proxy. Both variants write
//! the same three lines after connecting (request line, `Host:` and
//! `Connection: close`); the proxied variant puts the absolute URL on the
//! request line, addresses the proxy in `Host:` and may add a
//! `Proxy-Authorization` line. `file://` targets never touch the network.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::debug;
use url::Url;

use crate::error::SocketError;
use crate::http::HttpMethod;
use crate::socket::Socket;

const DEFAULT_PROXY_PORT: u16 = 8080;

/// Parse `raw` as a URL, assuming `http` when no scheme is given.
///
/// `localhost:3000/x` would otherwise parse as scheme `localhost`.
pub fn parse_url(raw: &str) -> Result<Url, url::ParseError> {
    if has_scheme(raw) {
        Url::parse(raw)
    } else {
        Url::parse(&format!("http://{raw}"))
    }
}

/// True when `raw` starts with `scheme://`. A `://` later on, say inside
/// the query, does not count.
fn has_scheme(raw: &str) -> bool {
    let Some((scheme, _)) = raw.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Direct {
        url: Url,
    },
    Proxied {
        url: Url,
        proxy: Url,
        credentials: Option<ProxyCredentials>,
    },
}

impl Route {
    pub fn direct(url: Url) -> Self {
        Route::Direct { url }
    }

    /// Route through `proxy`. Credentials are only used when both the
    /// username and the password are non-empty.
    pub fn proxied(url: Url, proxy: Url, username: &str, password: &str) -> Self {
        let credentials = (!username.is_empty() && !password.is_empty()).then(|| {
            ProxyCredentials {
                username: username.to_string(),
                password: password.to_string(),
            }
        });
        Route::Proxied {
            url,
            proxy,
            credentials,
        }
    }

    /// The target resource.
    pub fn url(&self) -> &Url {
        match self {
            Route::Direct { url } | Route::Proxied { url, .. } => url,
        }
    }

    pub fn request_line(&self, method: HttpMethod) -> String {
        match self {
            Route::Direct { url } => {
                format!("{} {}{} HTTP/1.0", method, url.path(), encoded_request(url))
            }
            Route::Proxied { url, .. } => {
                let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
                format!(
                    "{} {}://{}{}{}{} HTTP/1.0",
                    method,
                    url.scheme(),
                    url.host_str().unwrap_or_default(),
                    port,
                    url.path(),
                    encoded_request(url)
                )
            }
        }
    }

    pub fn host_line(&self) -> String {
        match self {
            Route::Direct { url } => {
                let host = url.host_str().unwrap_or_default();
                match url.port() {
                    Some(port) => format!("Host: {host}:{port}"),
                    None => format!("Host: {host}"),
                }
            }
            Route::Proxied { proxy, .. } => format!(
                "Host: {}:{}",
                proxy.host_str().unwrap_or_default(),
                proxy.port().unwrap_or(DEFAULT_PROXY_PORT)
            ),
        }
    }

    /// Open a socket to the route and write the request preamble.
    pub fn create_connection(
        &self,
        method: HttpMethod,
        timeout: Duration,
    ) -> Result<Socket, SocketError> {
        let mut socket = match self {
            Route::Direct { url } => {
                let default_port = if url.scheme() == "https" { 443 } else { 80 };
                if url.scheme() == "file" {
                    return open_file(url);
                }
                create_socket(
                    url.scheme(),
                    url.host_str().unwrap_or_default(),
                    url.port().unwrap_or(default_port),
                    timeout,
                )?
            }
            Route::Proxied { proxy, .. } => create_socket(
                proxy.scheme(),
                proxy.host_str().unwrap_or_default(),
                proxy.port().unwrap_or(DEFAULT_PROXY_PORT),
                timeout,
            )?,
        };

        debug!(request = %self.request_line(method), "opening route");
        socket.write(format!("{}\r\n", self.request_line(method)).as_bytes())?;
        socket.write(format!("{}\r\n", self.host_line()).as_bytes())?;
        if let Route::Proxied {
            credentials: Some(credentials),
            ..
        } = self
        {
            socket.write(format!("{}\r\n", proxy_authorization(credentials)).as_bytes())?;
        }
        socket.write(b"Connection: close\r\n")?;
        Ok(socket)
    }
}

/// `?query`, or nothing when the URL has no query string.
fn encoded_request(url: &Url) -> String {
    match url.query() {
        Some(query) if !query.is_empty() => format!("?{query}"),
        _ => String::new(),
    }
}

fn proxy_authorization(credentials: &ProxyCredentials) -> String {
    let token = BASE64.encode(format!("{}:{}", credentials.username, credentials.password));
    format!("Proxy-Authorization: Basic {token}")
}

fn create_socket(
    scheme: &str,
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<Socket, SocketError> {
    match scheme {
        "https" => Socket::connect_secure(host, port, timeout),
        _ => Socket::connect(host, port, timeout),
    }
}

fn open_file(url: &Url) -> Result<Socket, SocketError> {
    let path = url.to_file_path().map_err(|_| SocketError::File {
        path: url.path().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a local file path"),
    })?;
    Socket::open_file(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;

    fn url(raw: &str) -> Url {
        parse_url(raw).unwrap()
    }

    fn decode_proxy_auth(line: &str) -> String {
        let token = line.strip_prefix("Proxy-Authorization: Basic ").unwrap();
        String::from_utf8(BASE64.decode(token).unwrap()).unwrap()
    }

    #[test]
    fn missing_scheme_defaults_to_http() {
        assert_eq!(url("example.com/a").scheme(), "http");
        assert_eq!(url("https://example.com/a").scheme(), "https");
        let local = url("localhost:3000/x");
        assert_eq!(local.host_str(), Some("localhost"));
        assert_eq!(local.port(), Some(3000));

        let next = url("localhost:3000/login?next=http://localhost:3000/account");
        assert_eq!(next.scheme(), "http");
        assert_eq!(next.host_str(), Some("localhost"));
        assert_eq!(next.path(), "/login");
        assert_eq!(next.query(), Some("next=http://localhost:3000/account"));
        assert_eq!(url("file:///tmp/page.html").scheme(), "file");
    }

    #[test]
    fn direct_request_line_carries_path_and_query() {
        let route = Route::direct(url("http://example.com/path?q=1"));
        assert_eq!(route.request_line(HttpMethod::Get), "GET /path?q=1 HTTP/1.0");

        let route = Route::direct(url("http://example.com"));
        assert_eq!(route.request_line(HttpMethod::Head), "HEAD / HTTP/1.0");
    }

    #[test]
    fn direct_host_line_only_shows_non_default_port() {
        assert_eq!(
            Route::direct(url("http://example.com/")).host_line(),
            "Host: example.com"
        );
        assert_eq!(
            Route::direct(url("http://example.com:80/")).host_line(),
            "Host: example.com"
        );
        assert_eq!(
            Route::direct(url("https://example.com:8443/")).host_line(),
            "Host: example.com:8443"
        );
    }

    #[test]
    fn proxied_request_line_is_absolute() {
        let route = Route::proxied(
            url("http://example.com/path?q=1"),
            url("http://proxy.test"),
            "",
            "",
        );
        assert_eq!(
            route.request_line(HttpMethod::Get),
            "GET http://example.com/path?q=1 HTTP/1.0"
        );
        assert_eq!(route.host_line(), "Host: proxy.test:8080");

        let route = Route::proxied(
            url("http://example.com:8000/"),
            url("http://proxy.test:3128"),
            "",
            "",
        );
        assert_eq!(
            route.request_line(HttpMethod::Post),
            "POST http://example.com:8000/ HTTP/1.0"
        );
        assert_eq!(route.host_line(), "Host: proxy.test:3128");
    }

    #[test]
    fn credentials_need_both_parts() {
        let target = url("http://example.com/");
        let proxy = url("http://proxy.test");
        assert!(matches!(
            Route::proxied(target.clone(), proxy.clone(), "user", ""),
            Route::Proxied { credentials: None, .. }
        ));
        assert!(matches!(
            Route::proxied(target, proxy, "user", "pass"),
            Route::Proxied { credentials: Some(_), .. }
        ));
    }

    /// Accept one connection and return everything the client sent.
    fn capture_preamble(listener: TcpListener) -> thread::JoinHandle<String> {
        thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut received = String::new();
            conn.read_to_string(&mut received).unwrap();
            received
        })
    }

    #[test]
    fn proxy_connection_without_credentials_omits_authorization() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = capture_preamble(listener);

        let route = Route::proxied(
            url("http://example.com/path?q=1"),
            url(&format!("http://127.0.0.1:{port}")),
            "",
            "",
        );
        let socket = route
            .create_connection(HttpMethod::Get, Duration::from_secs(2))
            .unwrap();
        drop(socket);

        let sent = server.join().unwrap();
        assert_eq!(
            sent,
            format!(
                "GET http://example.com/path?q=1 HTTP/1.0\r\nHost: 127.0.0.1:{port}\r\nConnection: close\r\n"
            )
        );
    }

    #[test]
    fn proxy_connection_with_credentials_sends_basic_token() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = capture_preamble(listener);

        let route = Route::proxied(
            url("http://example.com/path?q=1"),
            url(&format!("http://127.0.0.1:{port}")),
            "user",
            "pass",
        );
        let socket = route
            .create_connection(HttpMethod::Get, Duration::from_secs(2))
            .unwrap();
        drop(socket);

        let sent = server.join().unwrap();
        let lines: Vec<&str> = sent.split("\r\n").collect();
        assert_eq!(lines[2].split(' ').take(2).collect::<Vec<_>>(), ["Proxy-Authorization:", "Basic"]);
        assert_eq!(decode_proxy_auth(lines[2]), "user:pass");
        assert_eq!(lines[3], "Connection: close");
    }

    #[test]
    fn direct_connection_writes_preamble() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = capture_preamble(listener);

        let route = Route::direct(url(&format!("http://127.0.0.1:{port}/a/b?c=d")));
        let socket = route
            .create_connection(HttpMethod::Get, Duration::from_secs(2))
            .unwrap();
        assert!(socket.is_open());
        drop(socket);

        assert_eq!(
            server.join().unwrap(),
            format!("GET /a/b?c=d HTTP/1.0\r\nHost: 127.0.0.1:{port}\r\nConnection: close\r\n")
        );
    }

    #[test]
    fn file_route_skips_the_network() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"local").unwrap();
        let file_url = Url::from_file_path(file.path()).unwrap();

        let mut socket = Route::direct(file_url)
            .create_connection(HttpMethod::Get, Duration::from_secs(1))
            .unwrap();
        assert_eq!(socket.read_all(), b"local");
    }
}
