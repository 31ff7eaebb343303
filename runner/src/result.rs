//! Turning a success count into a build verdict.

use std::process::ExitCode;

use crate::runner::RunSummary;

/// Produces the final verdict text from the number of passed tests.
pub trait ResultReporter {
    fn execute(&self, successful: usize) -> String;
}

/// Passes when at least `threshold` tests succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassFailReporter {
    threshold: usize,
}

impl PassFailReporter {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    pub fn passed(&self, successful: usize) -> bool {
        successful >= self.threshold
    }

    /// Whether a finished run lets the build through. Narrowed runs always do.
    pub fn build_passes(&self, summary: &RunSummary) -> bool {
        summary.narrowed || self.passed(summary.successful)
    }

    pub fn exit_code(&self, summary: &RunSummary) -> ExitCode {
        if self.build_passes(summary) {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        }
    }
}

impl ResultReporter for PassFailReporter {
    fn execute(&self, successful: usize) -> String {
        if self.passed(successful) {
            "RESULT: PASSED\n".to_string()
        } else {
            "RESULT: FAILED\n".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_inclusive() {
        let reporter = PassFailReporter::new(4);
        assert_eq!(reporter.execute(4), "RESULT: PASSED\n");
        assert_eq!(reporter.execute(5), "RESULT: PASSED\n");
        assert_eq!(reporter.execute(3), "RESULT: FAILED\n");
        assert!(!reporter.passed(3));
    }

    #[test]
    fn narrowed_run_never_fails_the_build() {
        let reporter = PassFailReporter::new(3);
        let focused = RunSummary {
            successful: 0,
            total: 3,
            selected: 1,
            narrowed: true,
        };
        assert!(reporter.build_passes(&focused));

        let full = RunSummary {
            narrowed: false,
            selected: 3,
            ..focused
        };
        assert!(!reporter.build_passes(&full));
        assert!(reporter.build_passes(&RunSummary { successful: 3, ..full }));
    }
}
