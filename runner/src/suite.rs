//! Running every suite executable in a directory and aggregating results.
//!
//! A suite counts as passed when its output contains a
//! `"N of M tests passed."` line with `N == M`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::SuiteError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteOutcome {
    pub path: PathBuf,
    pub passed: bool,
}

/// Parse the summary line of a suite's output.
pub fn did_all_tests_pass(output: &str) -> bool {
    static SUMMARY: OnceLock<Regex> = OnceLock::new();
    let summary = SUMMARY.get_or_init(|| {
        Regex::new(r"(\d+) of (\d+) tests passed\.").expect("summary pattern is valid")
    });
    summary
        .captures(output)
        .is_some_and(|caps| caps[1] == caps[2])
}

/// Run each file in `dir` except `skip`, in name order, printing one
/// `<file> OK|NOK` line per suite and an aggregate summary.
pub fn run_all_suites_in_directory(
    dir: &Path,
    skip: Option<&Path>,
    out: &mut impl Write,
) -> Result<Vec<SuiteOutcome>, SuiteError> {
    let read_error = |source: io::Error| SuiteError::ReadDir {
        path: dir.display().to_string(),
        source,
    };

    let mut suites: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(read_error)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| skip.map_or(true, |skip| path.file_name() != skip.file_name()))
        .collect();
    suites.sort();

    let mut outcomes = Vec::with_capacity(suites.len());
    for path in suites {
        debug!(suite = %path.display(), "running suite");
        let output = Command::new(&path)
            .output()
            .map_err(|source| SuiteError::Spawn {
                path: path.display().to_string(),
                source,
            })?;
        let passed = did_all_tests_pass(&String::from_utf8_lossy(&output.stdout));
        if !passed {
            warn!(suite = %path.display(), "suite did not pass");
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        writeln!(out, "{name} {}", if passed { "OK" } else { "NOK" })?;
        outcomes.push(SuiteOutcome { path, passed });
    }

    let passed = outcomes.iter().filter(|o| o.passed).count();
    writeln!(out, "\n{passed} of {} tests passed.", outcomes.len())?;
    Ok(outcomes)
}
