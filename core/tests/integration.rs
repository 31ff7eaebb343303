//! End-to-end browsing against the live fixture server.
//!
//! # Design
//! Starts the mock server on a random port, then drives it over real
//! sockets with `HttpRequest::fetch`, carrying one `CookieJar` across
//! requests the way a test session does.

use std::net::SocketAddr;
use std::time::Duration;

use tracing_test::traced_test;
use webtest_core::{parse_url, CookieJar, Encoding, ErrorCode, HttpRequest, HttpResponse, Route};

const TIMEOUT: Duration = Duration::from_secs(5);

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

fn fetch(addr: SocketAddr, path: &str, encoding: Encoding, jar: &mut CookieJar) -> HttpResponse {
    let url = parse_url(&format!("http://{addr}{path}")).unwrap();
    HttpRequest::new(Route::direct(url), encoding)
        .fetch(jar, TIMEOUT)
        .unwrap()
}

#[test]
fn login_session_round_trip() {
    let addr = start_server();
    let mut jar = CookieJar::new();

    // Step 1: anonymous account page bounces home.
    let response = fetch(addr, "/account", Encoding::get(), &mut jar);
    assert!(response.headers().is_redirect());
    assert_eq!(response.headers().location(), Some("/"));

    // Step 2: wrong password sets nothing.
    let response = fetch(
        addr,
        "/login",
        Encoding::form([("username", "admin"), ("password", "nope")]),
        &mut jar,
    );
    assert!(response.content().contains("Invalid credentials"));
    assert!(jar.is_empty());

    // Step 3: good login stores the session cookie.
    let response = fetch(
        addr,
        "/login",
        Encoding::form([("username", "admin"), ("password", "secret")]),
        &mut jar,
    );
    assert_eq!(response.headers().response_code(), 303);
    assert_eq!(response.headers().location(), Some("/account"));
    assert_eq!(response.new_cookies().len(), 1);
    let session = jar
        .get_cookie_value("127.0.0.1", "/", "session")
        .map(str::to_string)
        .expect("session cookie");

    // Step 4: the jar carries the session.
    let response = fetch(addr, "/account", Encoding::get(), &mut jar);
    assert_eq!(response.headers().response_code(), 200);
    assert_eq!(response.headers().mime_type(), "text/html; charset=utf-8");
    assert!(response.content().contains("Signed in as admin"));
    let sent = String::from_utf8_lossy(response.sent()).to_string();
    assert!(sent.contains(&format!("Cookie: session={session}\r\n")), "{sent}");

    // Step 5: restarting the session drops the session cookie.
    jar.restart_session(None);
    let response = fetch(addr, "/account", Encoding::get(), &mut jar);
    assert!(response.headers().is_redirect());
}

#[test]
fn cookies_set_by_server_are_sent_back() {
    let addr = start_server();
    let mut jar = CookieJar::new();

    fetch(addr, "/cookies/set?a=1&b=2", Encoding::get(), &mut jar);
    assert_eq!(jar.len(), 2);

    let response = fetch(addr, "/cookies", Encoding::get(), &mut jar);
    assert_eq!(response.content(), "a=1;b=2");

    // An expired Set-Cookie overwrites in place with an empty value.
    fetch(addr, "/cookies/delete?a", Encoding::get(), &mut jar);
    assert_eq!(jar.get_cookie_value("127.0.0.1", "/", "a"), Some(""));
    jar.restart_session(None);
    assert_eq!(jar.len(), 0);
}

#[test]
fn manual_cookies_join_jar_cookies() {
    let addr = start_server();
    let mut jar = CookieJar::new();
    jar.set_cookie("jar", "1", None, "/", None);

    let url = parse_url(&format!("http://{addr}/cookies")).unwrap();
    let mut request = HttpRequest::new(Route::direct(url), Encoding::get());
    request.add_cookie("manual", "2");
    let response = request.fetch(&mut jar, TIMEOUT).unwrap();
    assert_eq!(response.content(), "manual=2;jar=1");
}

#[test]
fn challenge_and_redirect_headers() {
    let addr = start_server();
    let mut jar = CookieJar::new();

    let response = fetch(addr, "/protected", Encoding::get(), &mut jar);
    assert!(response.headers().is_challenge());
    assert_eq!(response.headers().authentication(), Some("Basic"));
    assert_eq!(response.headers().realm(), Some("fixtures"));

    let url = parse_url(&format!("http://{addr}/protected")).unwrap();
    let mut request = HttpRequest::new(Route::direct(url), Encoding::get());
    request.add_header_line("Authorization: Basic YWRtaW46c2VjcmV0");
    let response = request.fetch(&mut jar, TIMEOUT).unwrap();
    assert_eq!(response.headers().response_code(), 200);
    assert!(response.content().contains("Access granted"));

    let response = fetch(addr, "/redirect/2", Encoding::get(), &mut jar);
    assert!(response.headers().is_redirect());
    assert_eq!(response.headers().response_code(), 302);
    assert_eq!(response.headers().location(), Some("/redirect/1"));
}

#[test]
fn employee_form_post_and_delete() {
    let addr = start_server();
    let mut jar = CookieJar::new();

    let response = fetch(
        addr,
        "/employees",
        Encoding::form([("name", "Ann Lee"), ("department", "QA")]),
        &mut jar,
    );
    assert_eq!(response.headers().response_code(), 303);
    let location = response.headers().location().unwrap().to_string();

    let response = fetch(addr, &location, Encoding::get(), &mut jar);
    let employee: serde_json::Value = serde_json::from_str(response.content()).unwrap();
    assert_eq!(employee["name"], "Ann Lee");

    let response = fetch(addr, &location, Encoding::delete(), &mut jar);
    assert_eq!(response.headers().response_code(), 204);

    let response = fetch(addr, &location, Encoding::get(), &mut jar);
    assert_eq!(response.headers().response_code(), 404);
}

#[test]
#[traced_test]
fn unreachable_server_is_reported_not_raised() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = parse_url(&format!("127.0.0.1:{port}/")).unwrap();
    let mut jar = CookieJar::new();

    let err = HttpRequest::new(Route::direct(url), Encoding::get())
        .fetch(&mut jar, Duration::from_secs(1))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::N01);
    assert!(err.to_string().contains(&format!("127.0.0.1:{port}")));
    assert!(logs_contain("fetch failed"));
}

#[test]
fn raw_server_response_end_to_end() {
    use std::io::{Read, Write};

    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = std::thread::spawn(move || {
        let (mut conn, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 512];
        while !request.ends_with(b"\r\n\r\n") {
            let n = conn.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        conn.write_all(b"HTTP/1.0 200\r\nSet-cookie: sid=abc; path=/\r\n\r\nOK")
            .unwrap();
    });

    let url = parse_url(&format!("http://127.0.0.1:{port}/")).unwrap();
    let mut jar = CookieJar::new();
    let response = HttpRequest::new(Route::direct(url), Encoding::get())
        .fetch(&mut jar, TIMEOUT)
        .unwrap();
    server.join().unwrap();

    assert_eq!(response.content(), "OK");
    assert_eq!(response.headers().http_version(), Some("1.0"));
    assert_eq!(jar.get_cookie_value("127.0.0.1", "/", "sid"), Some("abc"));
}
