//! Sequential execution of a test registry.
//!
//! # Design
//! Tests run one at a time in registration order against a single shared
//! `Browser`. The browser is reset before every test, so a failing test
//! cannot leak cookies into the next one. A test ends in one of three ways:
//! it returns `Ok`, it returns an error (a `FrameworkError` is reported with
//! its code and call site, anything else as unexpected), or it panics. None
//! of them stop the run.

use std::any::Any;
use std::io::{self, Stdout, Write};
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, info};

use crate::browser::Browser;
use crate::config::RunnerConfig;
use crate::error::FrameworkError;
use crate::registry::TestRegistry;
use crate::report::Report;
use crate::result::ResultReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub successful: usize,
    /// Every registered test, whether selected or not.
    pub total: usize,
    pub selected: usize,
    /// True when a filter or focus test limited the run.
    pub narrowed: bool,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.successful == self.selected
    }
}

pub struct TestRunner<W> {
    config: RunnerConfig,
    report: Report<W>,
}

impl TestRunner<Stdout> {
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_output(config, io::stdout())
    }
}

impl<W: Write> TestRunner<W> {
    pub fn with_output(config: RunnerConfig, out: W) -> Self {
        let report = Report::new(out, config.ci_messages);
        Self { config, report }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run the selected tests and print the summary.
    ///
    /// `reporter` only runs when every registered test was eligible, so a
    /// focused run never produces a build verdict.
    pub fn run<B: Browser>(
        &mut self,
        registry: &TestRegistry<B>,
        browser: &mut B,
        reporter: Option<&dyn ResultReporter>,
    ) -> io::Result<RunSummary> {
        let filters = &self.config.filters;
        let selected = registry.select(filters);
        let narrowed = registry.is_narrowed(filters);
        info!(
            selected = selected.len(),
            total = registry.len(),
            narrowed,
            "starting test run"
        );

        let mut successful = 0;
        for entry in &selected {
            let name = entry.name();
            debug!(test = name, "running");
            browser.reset();

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| entry.call(browser)));
            match outcome {
                Ok(Ok(())) => {
                    if !self.config.leave_browser_open {
                        browser.reset();
                    }
                    successful += 1;
                    self.report.success(name)?;
                }
                Ok(Err(err)) => match err.downcast_ref::<FrameworkError>() {
                    Some(failure) => {
                        info!(test = name, code = %failure.code(), "test failed");
                        self.report.framework_failure(
                            name,
                            failure,
                            self.config.print_stack_trace,
                        )?;
                        if self.config.print_page_source_on_error {
                            self.report.page_source(browser.page_source())?;
                        }
                    }
                    None => {
                        info!(test = name, "test failed unexpectedly");
                        self.report.unexpected_failure(name, &format!("{err:#}"))?;
                    }
                },
                Err(payload) => {
                    info!(test = name, "test panicked");
                    self.report
                        .unexpected_failure(name, &panic_message(payload.as_ref()))?;
                }
            }
        }

        let summary = RunSummary {
            successful,
            total: registry.len(),
            selected: selected.len(),
            narrowed,
        };
        self.report.summary(summary.successful, summary.total)?;

        if let (false, Some(reporter)) = (narrowed, reporter) {
            self.report.verdict(&reporter.execute(successful))?;
        }
        Ok(summary)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "test panicked".to_string()
    }
}
