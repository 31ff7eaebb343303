//! The browser contract the runner resets between tests, and a cookie-aware
//! HTTP implementation of it.
//!
//! # Design
//! `HttpSession` keeps one `CookieJar` for the whole test and hands it to
//! every fetch, so cookies set by one page are sent to the next. Redirects
//! are followed here rather than in the core client; the core only reports
//! them. Every navigation method is `#[track_caller]` so a network failure is
//! reported at the line of the test that navigated.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{debug, info};
use url::Url;
use webtest_core::{
    parse_url, CookieJar, Encoding, ErrorCode, HttpMethod, HttpRequest, HttpResponse, Route,
};

use crate::error::FrameworkError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const MAX_REDIRECTS: usize = 5;

/// Shared state the runner resets before and after every test.
pub trait Browser {
    /// Forget cookies and the current page.
    fn reset(&mut self);

    /// Raw content of the last fetched page, if any.
    fn page_source(&self) -> Option<&str>;
}

#[derive(Debug, Clone)]
struct Proxy {
    url: Url,
    username: String,
    password: String,
}

#[derive(Debug)]
pub struct HttpSession {
    jar: CookieJar,
    timeout: Duration,
    proxy: Option<Proxy>,
    credentials: Option<(String, String)>,
    last: Option<HttpResponse>,
}

impl Default for HttpSession {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HttpSession {
    pub fn new(timeout: Duration) -> Self {
        Self {
            jar: CookieJar::new(),
            timeout,
            proxy: None,
            credentials: None,
            last: None,
        }
    }

    /// Send every request through `proxy`.
    pub fn with_proxy(mut self, proxy: Url, username: &str, password: &str) -> Self {
        self.proxy = Some(Proxy {
            url: proxy,
            username: username.to_string(),
            password: password.to_string(),
        });
        self
    }

    /// Answer `401` challenges with these credentials.
    pub fn with_basic_auth(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some((username.to_string(), password.to_string()));
        self
    }

    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }

    pub fn jar_mut(&mut self) -> &mut CookieJar {
        &mut self.jar
    }

    pub fn last_response(&self) -> Option<&HttpResponse> {
        self.last.as_ref()
    }

    /// URL of the page currently shown, after redirects.
    pub fn current_url(&self) -> Option<&Url> {
        self.last.as_ref().map(HttpResponse::url)
    }

    /// Status of the page currently shown, `0` before the first fetch.
    pub fn status(&self) -> u16 {
        self.last
            .as_ref()
            .map_or(0, |r| r.headers().response_code())
    }

    /// GET `url`, resolved against the current page when relative.
    #[track_caller]
    pub fn navigate(&mut self, url: &str) -> Result<&HttpResponse, FrameworkError> {
        let target = self.resolve(url)?;
        self.load(target, Encoding::get())
    }

    /// POST `fields` as a url-encoded form.
    #[track_caller]
    pub fn submit_form(
        &mut self,
        url: &str,
        fields: &[(&str, &str)],
    ) -> Result<&HttpResponse, FrameworkError> {
        let target = self.resolve(url)?;
        self.load(target, Encoding::form(fields.iter().copied()))
    }

    #[track_caller]
    fn resolve(&self, raw: &str) -> Result<Url, FrameworkError> {
        let parsed = match self.current_url() {
            Some(current) => current.join(raw),
            None => parse_url(raw),
        };
        match parsed {
            Ok(url) => Ok(url),
            Err(e) => Err(FrameworkError::new(
                ErrorCode::D01,
                format!("Cannot parse url [{raw}]: {e}"),
            )),
        }
    }

    #[track_caller]
    fn load(
        &mut self,
        mut url: Url,
        mut encoding: Encoding,
    ) -> Result<&HttpResponse, FrameworkError> {
        self.last = None;
        let mut authorize = false;
        let mut redirects = 0;

        loop {
            let response = self.fetch_once(&url, &encoding, authorize)?;
            let headers = response.headers();

            if headers.is_challenge() && !authorize && self.credentials.is_some() {
                debug!(url = %url, realm = headers.realm(), "answering challenge");
                authorize = true;
                continue;
            }

            if headers.is_redirect() && redirects < MAX_REDIRECTS {
                let location = headers.location().unwrap_or_default();
                let next = match url.join(location) {
                    Ok(next) => next,
                    Err(e) => {
                        return Err(FrameworkError::new(
                            ErrorCode::D01,
                            format!("Cannot follow redirect to [{location}]: {e}"),
                        ))
                    }
                };
                let code = headers.response_code();
                if code == 303
                    || (matches!(code, 301 | 302) && encoding.method() == HttpMethod::Post)
                {
                    encoding = Encoding::get();
                }
                debug!(from = %url, to = %next, code, "following redirect");
                if next.origin() != url.origin() {
                    authorize = false;
                }
                url = next;
                redirects += 1;
                continue;
            }

            info!(url = %url, status = headers.response_code(), "page loaded");
            return Ok(self.last.insert(response));
        }
    }

    #[track_caller]
    fn fetch_once(
        &mut self,
        url: &Url,
        encoding: &Encoding,
        authorize: bool,
    ) -> Result<HttpResponse, FrameworkError> {
        let route = match &self.proxy {
            Some(proxy) => Route::proxied(
                url.clone(),
                proxy.url.clone(),
                &proxy.username,
                &proxy.password,
            ),
            None => Route::direct(url.clone()),
        };
        let mut request = HttpRequest::new(route, encoding.clone());
        if let (true, Some((username, password))) = (authorize, &self.credentials) {
            let token = BASE64.encode(format!("{username}:{password}"));
            request.add_header_line(&format!("Authorization: Basic {token}"));
        }

        match request.fetch(&mut self.jar, self.timeout) {
            Ok(response) => Ok(response),
            Err(e) => Err(FrameworkError::from_fetch(&e)),
        }
    }
}

impl Browser for HttpSession {
    fn reset(&mut self) {
        self.jar.clear();
        self.last = None;
    }

    fn page_source(&self) -> Option<&str> {
        self.last.as_ref().map(HttpResponse::content)
    }
}
