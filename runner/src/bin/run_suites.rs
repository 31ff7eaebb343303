//! Run every suite executable in a directory and print one line per suite.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use webtest_runner::init_logging;
use webtest_runner::suite::run_all_suites_in_directory;

#[derive(Parser, Debug)]
#[command(version, about = "Run all suite executables in a directory", long_about = None)]
struct Args {
    /// Directory holding the suite executables
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// File to leave out (defaults to this executable)
    #[arg(long)]
    skip: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    let skip = args.skip.or_else(|| std::env::current_exe().ok());

    match run_all_suites_in_directory(&args.dir, skip.as_deref(), &mut io::stdout()) {
        Ok(outcomes) if outcomes.iter().all(|o| o.passed) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
