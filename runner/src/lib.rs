//! Sequential test runner for browser-like web tests.
//!
//! # Overview
//! A suite binary registers named test procedures in a [`TestRegistry`],
//! hands it to a [`TestRunner`] together with a [`Browser`] and gets back a
//! [`RunSummary`]. Output is the classic plain report (`name: OK`, failure
//! blocks, `"N of M tests passed."`), optionally interleaved with TeamCity
//! service messages.
//!
//! # Design
//! - The registry is an explicit value built by `main`, not global state.
//! - Tests return `anyhow::Result<()>`. A [`FrameworkError`] raised by the
//!   helpers in [`assert`] carries an error code and the test's call site
//!   via `#[track_caller]`; any other error or a panic is reported as
//!   unexpected. Nothing aborts the run.
//! - [`HttpSession`] is the bundled `Browser`: a cookie-keeping session over
//!   `webtest-core` that follows redirects and answers basic-auth challenges.
//! - Selection: `-t/--test-to-run <name>` or a `_` name prefix narrows the
//!   run, and a narrowed run never reaches the [`ResultReporter`].

pub mod assert;
pub mod browser;
pub mod config;
pub mod error;
pub mod registry;
pub mod report;
pub mod result;
pub mod runner;
pub mod suite;

pub use browser::{Browser, HttpSession};
pub use config::{RunnerArgs, RunnerConfig};
pub use error::{FrameworkError, SuiteError};
pub use registry::{TestRegistry, FOCUS_MARKER};
pub use result::{PassFailReporter, ResultReporter};
pub use runner::{RunSummary, TestRunner};

use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout carries only the report.
///
/// Honours `RUST_LOG`, defaulting to `warn`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
