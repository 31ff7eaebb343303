//! Smoke suite for the fixture server.
//!
//! Start `mock-server` first, then run with `BASE_URL` pointing at it
//! (default `http://localhost:3000`).

use std::process::ExitCode;

use clap::Parser;
use webtest_core::ErrorCode;
use webtest_runner::assert::{assert_contains_text, assert_cookie, assert_status, assert_that, fail};
use webtest_runner::{
    init_logging, HttpSession, PassFailReporter, RunnerArgs, TestRegistry, TestRunner,
};

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const USERNAME: &str = "admin";
const PASSWORD: &str = "secret";

#[derive(Parser, Debug)]
#[command(version, about = "Smoke tests against the fixture server", long_about = None)]
struct Args {
    #[command(flatten)]
    runner: RunnerArgs,
}

fn smoke_tests(base: &str) -> TestRegistry<HttpSession> {
    let mut registry = TestRegistry::<HttpSession>::new();

    let url = format!("{base}/");
    registry.test("landingPageLoads", move |session| {
        session.navigate(&url)?;
        assert_status(session, 200)?;
        assert_contains_text(session, "Welcome")?;
        Ok(())
    });

    let url = format!("{base}/login");
    registry.test("loginKeepsSession", move |session| {
        session.submit_form(&url, &[("username", USERNAME), ("password", PASSWORD)])?;
        assert_contains_text(session, "Signed in as admin")?;
        assert_that(session.jar().len(), 1)?;
        Ok(())
    });

    let url = format!("{base}/login");
    registry.test("wrongPasswordIsRejected", move |session| {
        session.submit_form(&url, &[("username", USERNAME), ("password", "guess")])?;
        assert_contains_text(session, "Invalid credentials")?;
        assert_cookie(session, "session", None)?;
        Ok(())
    });

    let base_owned = base.to_string();
    registry.test("cookiesSurviveNavigation", move |session| {
        session.navigate(&format!("{base_owned}/cookies/set?flavour=oat"))?;
        assert_cookie(session, "flavour", Some("oat"))?;
        session.navigate("/cookies")?;
        assert_contains_text(session, "flavour=oat")?;
        Ok(())
    });

    let url = format!("{base}/protected");
    registry.test("protectedPageAcceptsCredentials", move |session| {
        session.navigate(&url)?;
        assert_status(session, 200)?;
        assert_contains_text(session, "Access granted")?;
        Ok(())
    });

    let url = format!("{base}/redirect/3");
    registry.test("redirectChainIsFollowed", move |session| {
        session.navigate(&url)?;
        match session.current_url() {
            Some(current) => assert_that(current.path(), "/redirect/0")?,
            None => fail(ErrorCode::D01, "No page after redirects")?,
        }
        Ok(())
    });

    let url = format!("{base}/employees");
    registry.test("employeeFormCreatesRecord", move |session| {
        session.submit_form(&url, &[("name", "Ann Lee"), ("department", "QA")])?;
        assert_status(session, 200)?;
        assert_contains_text(session, "\"name\":\"Ann Lee\"")?;
        Ok(())
    });

    registry
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    let base = std::env::var("BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let registry = smoke_tests(base.trim_end_matches('/'));
    let mut session = HttpSession::default().with_basic_auth(USERNAME, PASSWORD);
    let reporter = PassFailReporter::new(registry.len());

    let mut runner = TestRunner::new(args.runner.into());
    match runner.run(&registry, &mut session, Some(&reporter)) {
        Ok(summary) => reporter.exit_code(&summary),
        Err(e) => {
            tracing::error!(error = %e, "cannot write report");
            ExitCode::FAILURE
        }
    }
}
