//! Failures raised deliberately by test helpers.
//!
//! # Design
//! A `FrameworkError` records where it was raised through `#[track_caller]`,
//! so a helper that fails reports the line in the test that called it rather
//! than a line inside the helper. Every public helper that can raise one is
//! itself `#[track_caller]`, which keeps the location pointing at test code
//! however deep the helper chain goes.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::Location;

use thiserror::Error;
use webtest_core::{ErrorCode, FetchError};

#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct FrameworkError {
    code: ErrorCode,
    message: String,
    location: &'static Location<'static>,
    stack: Option<String>,
}

impl FrameworkError {
    /// Raise an error attributed to the caller.
    #[track_caller]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let backtrace = Backtrace::force_capture();
        let stack = (backtrace.status() == BacktraceStatus::Captured)
            .then(|| backtrace.to_string());
        Self {
            code,
            message: message.into(),
            location: Location::caller(),
            stack,
        }
    }

    /// Turn a network failure into a framework error at the caller.
    #[track_caller]
    pub fn from_fetch(err: &FetchError) -> Self {
        Self::new(err.code(), err.to_string())
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn file(&self) -> &'static str {
        self.location.file()
    }

    pub fn line(&self) -> u32 {
        self.location.line()
    }

    /// Stack captured when the error was raised, if the platform supports it.
    pub fn stack_trace(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

/// Errors from running a directory of suite executables.
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("Cannot list suites in [{path}]: {source}")]
    ReadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot run suite [{path}]: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write suite report: {0}")]
    Report(#[from] std::io::Error),
}
