//! Runner settings and the command line that fills them.

use clap::Parser;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Skip the reset after a passing test so its state can be inspected.
    pub leave_browser_open: bool,
    /// Dump the last page after a framework failure.
    pub print_page_source_on_error: bool,
    pub print_stack_trace: bool,
    /// Emit TeamCity service messages alongside the report.
    pub ci_messages: bool,
    /// Exact test names to run.
    pub filters: Vec<String>,
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leave_browser_open(mut self, value: bool) -> Self {
        self.leave_browser_open = value;
        self
    }

    pub fn print_page_source_on_error(mut self, value: bool) -> Self {
        self.print_page_source_on_error = value;
        self
    }

    pub fn print_stack_trace(mut self, value: bool) -> Self {
        self.print_stack_trace = value;
        self
    }

    pub fn ci_messages(mut self, value: bool) -> Self {
        self.ci_messages = value;
        self
    }

    pub fn filter(mut self, name: &str) -> Self {
        self.filters.push(name.to_string());
        self
    }
}

/// Command line accepted by suite binaries.
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about = "Run a web test suite", long_about = None)]
pub struct RunnerArgs {
    /// Run only the test with this name (focus tests still run)
    #[arg(short = 't', long = "test-to-run")]
    pub test_to_run: Option<String>,

    /// Emit TeamCity service messages
    #[arg(long)]
    pub ci: bool,

    /// Do not reset the browser after a passing test
    #[arg(long)]
    pub leave_browser_open: bool,

    /// Print the last fetched page when a test fails
    #[arg(long)]
    pub print_page_source: bool,

    /// Print the stack trace of framework failures
    #[arg(long)]
    pub print_stack_trace: bool,
}

impl From<RunnerArgs> for RunnerConfig {
    fn from(args: RunnerArgs) -> Self {
        Self {
            leave_browser_open: args.leave_browser_open,
            print_page_source_on_error: args.print_page_source,
            print_stack_trace: args.print_stack_trace,
            ci_messages: args.ci,
            // An empty name filters nothing.
            filters: args.test_to_run.into_iter().filter(|t| !t.is_empty()).collect(),
        }
    }
}
