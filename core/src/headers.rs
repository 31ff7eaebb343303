//! Parser for a raw response header block.
//!
//! # Design
//! The block is split on CR-LF and every line is matched case-insensitively
//! against the handful of headers a test browser cares about. Singular
//! fields are last-match-wins; `Set-Cookie` accumulates. Lines that match
//! nothing are kept only in the raw block. The parser never fails: an empty
//! or garbled block simply yields default fields.

use url::Url;

use crate::cookie::{parse_expiry, Cookie};
use crate::jar::CookieJar;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    raw: String,
    http_version: Option<String>,
    response_code: Option<u16>,
    mime_type: String,
    location: Option<String>,
    cookies: Vec<Cookie>,
    authentication: Option<String>,
    realm: Option<String>,
}

impl HttpHeaders {
    pub fn parse(raw: &str) -> Self {
        let mut headers = Self {
            raw: raw.to_string(),
            ..Self::default()
        };
        for line in raw.split("\r\n") {
            headers.parse_line(line);
        }
        headers
    }

    fn parse_line(&mut self, line: &str) {
        if let Some((version, code)) = parse_status_line(line) {
            self.http_version = Some(version);
            self.response_code = Some(code);
        } else if let Some(value) = header_value(line, "content-type") {
            self.mime_type = value.trim().to_string();
        } else if let Some(value) = header_value(line, "location") {
            self.location = Some(value.trim().to_string());
        } else if let Some(value) = header_value(line, "set-cookie") {
            if let Some(cookie) = parse_cookie(value) {
                self.cookies.push(cookie);
            }
        } else if let Some(value) = header_value(line, "www-authenticate") {
            if let Some((scheme, realm)) = parse_challenge(value) {
                self.authentication = Some(scheme);
                self.realm = Some(realm);
            }
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Protocol version from the status line, e.g. `"1.1"`.
    pub fn http_version(&self) -> Option<&str> {
        self.http_version.as_deref()
    }

    /// Status code, `0` when no status line was seen.
    pub fn response_code(&self) -> u16 {
        self.response_code.unwrap_or(0)
    }

    /// MIME type, empty when absent.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref().filter(|l| !l.is_empty())
    }

    pub fn authentication(&self) -> Option<&str> {
        self.authentication.as_deref()
    }

    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }

    /// Cookies from every `Set-Cookie` line, unscoped.
    pub fn new_cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self.response_code, Some(301 | 302 | 303 | 307)) && self.location().is_some()
    }

    pub fn is_challenge(&self) -> bool {
        self.response_code == Some(401)
            && self.authentication.as_deref().is_some_and(|a| !a.is_empty())
            && self.realm.as_deref().is_some_and(|r| !r.is_empty())
    }

    /// Store every received cookie in `jar`, scoped to the host of `url`.
    pub fn write_cookies_to_jar(&self, jar: &mut CookieJar, url: &Url) {
        for cookie in &self.cookies {
            let mut scoped = cookie.clone();
            if let Some(host) = url.host_str() {
                scoped.set_host(host);
            }
            jar.insert(scoped);
        }
    }
}

/// `HTTP/<major>.<minor> <code>` at the start of a line.
fn parse_status_line(line: &str) -> Option<(String, u16)> {
    let rest = strip_prefix_ignore_case(line.trim_start(), "http/")?;
    let (version, rest) = rest.split_once(|c: char| c.is_ascii_whitespace())?;
    let (major, minor) = version.split_once('.')?;
    if major.is_empty()
        || minor.is_empty()
        || !major.bytes().chain(minor.bytes()).all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let code = digits.parse().ok()?;
    Some((version.to_string(), code))
}

/// Value of `line` when it is the header `name`, compared case-insensitively.
fn header_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let (field, value) = line.split_once(':')?;
    field.trim().eq_ignore_ascii_case(name).then_some(value)
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}

/// `name=value; path=/x; expires=...; secure`
fn parse_cookie(line: &str) -> Option<Cookie> {
    let mut parts = line.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut path = "";
    let mut expiry = None;
    let mut secure = false;
    for attribute in parts {
        match attribute.split_once('=') {
            Some((key, val)) => {
                let key = key.trim();
                if key.eq_ignore_ascii_case("path") {
                    path = val.trim();
                } else if key.eq_ignore_ascii_case("expires") {
                    expiry = parse_expiry(val);
                }
            }
            None if attribute.trim().eq_ignore_ascii_case("secure") => secure = true,
            None => {}
        }
    }

    Some(Cookie::new(name, value.trim(), path, expiry).with_secure(secure))
}

/// `<scheme> realm="<realm>"`
fn parse_challenge(value: &str) -> Option<(String, String)> {
    let value = value.trim();
    let (scheme, params) = value.split_once(|c: char| c.is_ascii_whitespace())?;
    let params = params.trim_start();
    let start = params.to_ascii_lowercase().find("realm=\"")? + "realm=\"".len();
    let realm = &params[start..];
    let end = realm.find('"')?;
    Some((scheme.to_string(), realm[..end].trim().to_string()))
}
