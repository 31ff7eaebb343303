//! Assertion helpers that fail a test with a coded `FrameworkError`.
//!
//! All helpers are `#[track_caller]`; the report points at the test line.

use std::fmt::Debug;

use webtest_core::ErrorCode;

use crate::browser::{Browser, HttpSession};
use crate::error::FrameworkError;

/// Fail unconditionally.
#[track_caller]
pub fn fail<T>(code: ErrorCode, message: impl Into<String>) -> Result<T, FrameworkError> {
    Err(FrameworkError::new(code, message))
}

/// Compare a value read from the page with the expected one.
#[track_caller]
pub fn assert_that<T>(actual: T, expected: T) -> Result<(), FrameworkError>
where
    T: PartialEq + Debug,
{
    if actual == expected {
        return Ok(());
    }
    fail(
        ErrorCode::C01,
        format!("Expected {expected:?} but was {actual:?}"),
    )
}

#[track_caller]
pub fn assert_contains_text<B: Browser>(browser: &B, text: &str) -> Result<(), FrameworkError> {
    let Some(source) = browser.page_source() else {
        return fail(ErrorCode::D01, "No page has been loaded");
    };
    if source.contains(text) {
        return Ok(());
    }
    fail(
        ErrorCode::C01,
        format!("Did not find text '{text}' on current page"),
    )
}

#[track_caller]
pub fn assert_status(session: &HttpSession, expected: u16) -> Result<(), FrameworkError> {
    let actual = session.status();
    if actual == expected {
        return Ok(());
    }
    fail(
        ErrorCode::S01,
        format!("Expected status {expected} but was {actual}"),
    )
}

/// Check the value of a cookie visible at the current page.
#[track_caller]
pub fn assert_cookie(
    session: &HttpSession,
    name: &str,
    expected: Option<&str>,
) -> Result<(), FrameworkError> {
    let Some(url) = session.current_url() else {
        return fail(ErrorCode::D01, "No page has been loaded");
    };
    let actual = session.jar().get_cookie_value(
        url.host_str().unwrap_or_default(),
        url.path(),
        name,
    );
    if actual == expected {
        return Ok(());
    }
    fail(
        ErrorCode::C01,
        format!("Expected cookie '{name}' to be {expected:?} but was {actual:?}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Page(Option<&'static str>);

    impl Browser for Page {
        fn reset(&mut self) {
            self.0 = None;
        }

        fn page_source(&self) -> Option<&str> {
            self.0
        }
    }

    #[test]
    fn assert_that_reports_both_values() {
        assert!(assert_that(3, 3).is_ok());
        let err = assert_that("4", "3").unwrap_err();
        assert_eq!(err.code(), ErrorCode::C01);
        assert_eq!(err.message(), "Expected \"3\" but was \"4\"");
    }

    #[test]
    fn helper_location_is_the_caller() {
        let line = line!() + 1;
        let err = fail::<()>(ErrorCode::D01, "x").unwrap_err();
        assert_eq!(err.line(), line);
        assert!(err.file().ends_with("assert.rs"));
    }

    #[test]
    fn contains_text_checks_page_source() {
        assert!(assert_contains_text(&Page(Some("<p>Confirmed: hello</p>")), "Confirmed: hello").is_ok());

        let err = assert_contains_text(&Page(Some("<p/>")), "hello").unwrap_err();
        assert_eq!(err.code(), ErrorCode::C01);

        let err = assert_contains_text(&Page(None), "hello").unwrap_err();
        assert_eq!(err.code(), ErrorCode::D01);
    }

    #[test]
    fn status_and_cookie_need_a_page() {
        let session = HttpSession::default();
        assert_eq!(assert_status(&session, 200).unwrap_err().code(), ErrorCode::S01);
        assert_eq!(
            assert_cookie(&session, "sid", None).unwrap_err().code(),
            ErrorCode::D01
        );
    }
}
