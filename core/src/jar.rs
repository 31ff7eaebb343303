//! In-memory cookie store with host/path/expiry matching.
//!
//! # Design
//! Cookies live in a `Vec` in insertion order. A cookie is identified by its
//! (name, truncated host, normalized path) triple: setting a cookie with an
//! existing triple overwrites it in place, anything else appends. Lookups
//! pick the cookie with the longest matching path.
//!
//! `delete_cookie` removes by name only and ignores host and path scoping.

use chrono::{DateTime, Utc};
use url::Url;

use crate::cookie::Cookie;

#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a cookie, overwriting one with the same name, host and path.
    ///
    /// `host` is truncated to its registrable domain; a host without one
    /// leaves the cookie unscoped.
    pub fn set_cookie(
        &mut self,
        name: &str,
        value: &str,
        host: Option<&str>,
        path: &str,
        expiry: Option<DateTime<Utc>>,
    ) {
        let mut cookie = Cookie::new(name, value, path, expiry);
        if let Some(host) = host {
            cookie.set_host(host);
        }
        self.insert(cookie);
    }

    /// Store an already built cookie under the same overwrite rule as
    /// [`set_cookie`](Self::set_cookie).
    pub fn insert(&mut self, cookie: Cookie) {
        let existing = self.cookies.iter_mut().find(|c| {
            c.name() == cookie.name() && c.host() == cookie.host() && c.path() == cookie.path()
        });
        match existing {
            Some(slot) => *slot = cookie,
            None => self.cookies.push(cookie),
        }
    }

    /// Remove every cookie called `name`, whatever its host or path.
    pub fn delete_cookie(&mut self, name: &str) {
        self.cookies.retain(|c| c.name() != name);
    }

    /// Value of the most specific cookie called `name` visible at
    /// `host` + `path`.
    pub fn get_cookie_value(&self, host: &str, path: &str, name: &str) -> Option<&str> {
        let mut best: Option<&Cookie> = None;
        for cookie in self.cookies.iter().filter(|c| is_match(c, host, path, name)) {
            if best.map_or(true, |b| cookie.path().len() > b.path().len()) {
                best = Some(cookie);
            }
        }
        best.map(Cookie::value)
    }

    /// `name=value` pairs of every cookie visible at `url`, in storage order.
    pub fn select_as_pairs(&self, url: &Url) -> Vec<String> {
        let host = url.host_str().unwrap_or_default();
        self.cookies
            .iter()
            .filter(|c| is_match(c, host, url.path(), c.name()))
            .map(Cookie::as_pair)
            .collect()
    }

    /// Drop temporary cookies as if the browser was closed and re-opened.
    ///
    /// Removes cookies without a value, session cookies and, when `now` is
    /// given, anything that expired before it.
    pub fn restart_session(&mut self, now: Option<DateTime<Utc>>) {
        self.cookies.retain(|c| {
            if c.value().is_empty() || c.expiry().is_none() {
                return false;
            }
            !matches!(now, Some(now) if c.is_expired(now))
        });
    }

    /// Move every expiry `seconds` into the past.
    pub fn age_prematurely(&mut self, seconds: i64) {
        for cookie in &mut self.cookies {
            cookie.age_prematurely(seconds);
        }
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    pub fn cookies(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

fn is_match(cookie: &Cookie, host: &str, path: &str, name: &str) -> bool {
    if cookie.name() != name {
        return false;
    }
    if !host.is_empty() && cookie.host().is_some() && !cookie.is_valid_host(host) {
        return false;
    }
    cookie.is_valid_path(path)
}
