//! Console report and the TeamCity service-message stream.
//!
//! # Design
//! All report text goes to one writer. TeamCity lines are interleaved with
//! the plain report when CI mode is on, which is how the build server picks
//! them out of ordinary output.

use std::io::{self, Write};

use crate::error::FrameworkError;

const PAGE_SOURCE_START: &str = "##################  Page source start #################### ";
const PAGE_SOURCE_END: &str = "##################  Page source end ###################### ";
const NOTHING_FETCHED: &str = "Nothing fetched yet";

pub struct Report<W> {
    out: W,
    ci: bool,
}

impl<W: Write> Report<W> {
    pub fn new(out: W, ci: bool) -> Self {
        Self { out, ci }
    }

    pub fn success(&mut self, name: &str) -> io::Result<()> {
        writeln!(self.out, "{name}: OK")?;
        if self.ci {
            let name = teamcity_encode(name);
            writeln!(self.out, "##teamcity[testStarted name='{name}']")?;
            writeln!(self.out, "##teamcity[testFinished name='{name}' duration='0']")?;
        }
        Ok(())
    }

    pub fn framework_failure(
        &mut self,
        name: &str,
        err: &FrameworkError,
        with_stack_trace: bool,
    ) -> io::Result<()> {
        write!(
            self.out,
            "\n### Test {name} failed on line {line} in file {file}({line})\n\n",
            line = err.line(),
            file = err.file()
        )?;
        write!(self.out, "ERROR {}: {}\n\n", err.code(), err.message())?;
        if with_stack_trace {
            let trace = err.stack_trace().unwrap_or("unavailable");
            write!(self.out, "Stack trace: {trace}\n\n")?;
        }
        self.ci_failure(name, err.message())
    }

    pub fn unexpected_failure(&mut self, name: &str, message: &str) -> io::Result<()> {
        write!(self.out, "\n### Test {name}() failed \n\n {message}\n\n")?;
        self.ci_failure(name, message)
    }

    pub fn page_source(&mut self, source: Option<&str>) -> io::Result<()> {
        writeln!(self.out, "{PAGE_SOURCE_START}")?;
        writeln!(self.out, "{}", source.unwrap_or(NOTHING_FETCHED))?;
        writeln!(self.out, "{PAGE_SOURCE_END}")
    }

    pub fn summary(&mut self, successful: usize, total: usize) -> io::Result<()> {
        writeln!(self.out, "\n{successful} of {total} tests passed.")
    }

    /// Text produced by a result reporter, written as is.
    pub fn verdict(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }

    fn ci_failure(&mut self, name: &str, message: &str) -> io::Result<()> {
        if !self.ci {
            return Ok(());
        }
        let name = teamcity_encode(name);
        let message = teamcity_encode(message);
        writeln!(self.out, "##teamcity[testStarted name='{name}']")?;
        writeln!(
            self.out,
            "##teamcity[testFailed name='{name}' message='{message}']"
        )
    }
}

/// Escape a value for a TeamCity service message.
pub fn teamcity_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\'' => encoded.push_str("|'"),
            '"' => encoded.push_str("|\""),
            '|' => encoded.push_str("||"),
            '[' => encoded.push_str("|["),
            ']' => encoded.push_str("|]"),
            '\n' => encoded.push_str("|n"),
            '\r' => encoded.push_str("|r"),
            c => encoded.push(c),
        }
    }
    encoded
}
