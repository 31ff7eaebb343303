//! A single cookie and the classic Netscape scoping rules.
//!
//! # Design
//! Paths are normalized to start and end with `/` so that path matching is a
//! plain prefix test. Hosts are truncated to the registrable domain the
//! cookie may be shared across (`www.example.com` → `example.com`,
//! `shop.example.co.uk` → `example.co.uk`). Hosts that have no registrable
//! domain, such as `localhost` or IP literals, truncate to `None` and the
//! cookie stays unscoped.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

/// Public suffixes made of two labels. A host ending in one of these keeps
/// three labels when truncated.
const MULTI_PART_SUFFIXES: &[&str] = &[
    "ac.uk", "co.uk", "gov.uk", "ltd.uk", "me.uk", "net.uk", "org.uk", "plc.uk",
    "com.au", "net.au", "org.au", "edu.au", "gov.au",
    "co.nz", "net.nz", "org.nz",
    "co.jp", "ne.jp", "or.jp", "ac.jp",
    "co.za", "org.za",
    "com.br", "net.br",
    "com.cn", "net.cn", "org.cn",
    "co.in", "net.in", "org.in",
    "com.mx", "com.tr", "co.il", "co.kr",
];

/// An HTTP cookie as stored in a [`CookieJar`](crate::CookieJar).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    host: Option<String>,
    path: String,
    expiry: Option<DateTime<Utc>>,
    secure: bool,
}

impl Cookie {
    /// Create an unscoped cookie. An empty `path` means host wide (`/`).
    pub fn new(name: &str, value: &str, path: &str, expiry: Option<DateTime<Utc>>) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            host: None,
            path: if path.is_empty() {
                "/".to_string()
            } else {
                fix_path(path)
            },
            expiry,
            secure: false,
        }
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Scope the cookie to the registrable domain of `host`.
    ///
    /// Returns `false` and leaves the cookie unscoped when `host` has no
    /// registrable domain.
    pub fn set_host(&mut self, host: &str) -> bool {
        match truncate_host(host) {
            Some(truncated) => {
                self.host = Some(truncated);
                true
            }
            None => false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Empty for a cookie that was deleted by the server.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Truncated host, `None` when unscoped.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// True when `host` truncates to the same registrable domain.
    pub fn is_valid_host(&self, host: &str) -> bool {
        truncate_host(host) == self.host
    }

    /// True when the cookie path is a prefix of `path`.
    pub fn is_valid_path(&self, path: &str) -> bool {
        fix_path(path).starts_with(&self.path)
    }

    /// Session cookies count as expired; so does anything that expired
    /// strictly before `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            None => true,
            Some(expiry) => expiry < now,
        }
    }

    /// Move the expiry `seconds` into the past. Session cookies are untouched.
    pub fn age_prematurely(&mut self, seconds: i64) {
        if let Some(expiry) = self.expiry {
            let aged = TimeDelta::try_seconds(seconds)
                .and_then(|delta| expiry.checked_sub_signed(delta));
            self.expiry = Some(aged.unwrap_or(DateTime::<Utc>::MIN_UTC));
        }
    }

    /// `name=value`, as sent in a `Cookie:` header.
    pub fn as_pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Add a leading and a trailing slash to `path` if missing.
pub fn fix_path(path: &str) -> String {
    let mut fixed = String::with_capacity(path.len() + 2);
    if !path.starts_with('/') {
        fixed.push('/');
    }
    fixed.push_str(path);
    if !fixed.ends_with('/') {
        fixed.push('/');
    }
    fixed
}

/// Reduce `host` to the domain a cookie set by it may be scoped to.
pub fn truncate_host(host: &str) -> Option<String> {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 || !labels.iter().all(|l| is_dns_label(l)) {
        return None;
    }
    // The final label must look like a TLD; this rejects IPv4 literals.
    if !labels[labels.len() - 1].bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }

    let keep = if labels.len() >= 3 && is_multi_part_suffix(&labels) {
        3
    } else if MULTI_PART_SUFFIXES.contains(&host.as_str()) {
        // A bare public suffix is not registrable.
        return None;
    } else {
        2
    };
    Some(labels[labels.len() - keep..].join("."))
}

fn is_multi_part_suffix(labels: &[&str]) -> bool {
    let suffix = labels[labels.len() - 2..].join(".");
    MULTI_PART_SUFFIXES.contains(&suffix.as_str())
}

fn is_dns_label(label: &str) -> bool {
    !label.is_empty() && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Parse a cookie `expires` attribute.
///
/// Accepts RFC 1123 / RFC 2822 dates and the Netscape
/// `Wdy, DD-Mon-YYYY HH:MM:SS GMT` form. Anything else is treated as a
/// session cookie.
pub fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Some(date.with_timezone(&Utc));
    }
    ["%a, %d-%b-%Y %H:%M:%S GMT", "%a, %d-%b-%y %H:%M:%S GMT", "%A, %d-%b-%y %H:%M:%S GMT"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Format an expiry the way servers send it: `Wed, 21 Oct 2015 07:28:00 GMT`.
pub fn format_expiry(expiry: DateTime<Utc>) -> String {
    expiry.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
