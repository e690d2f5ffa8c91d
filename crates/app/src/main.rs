//! hopcheck - command-line entry point
//!
//! Reads fixture files, replays their requests hop by hop and exits with
//! `0` when every check passed, `1` on the first failed check and `2` when
//! a fixture or an option is unusable.

mod cli;
mod error;
mod report;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use hopcheck_application::{ExecuteCheck, RunFixture, RunOutcome};
use hopcheck_domain::{Check, parse_fixture};
use hopcheck_infrastructure::{ExpectationEvaluator, ReqwestHttpClient};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use error::AppError;
use report::Report;

const EXIT_FAILED: u8 = 1;
const EXIT_INVALID: u8 = 2;

#[derive(Serialize)]
struct ParsedFixture<'a> {
    fixture: String,
    checks: &'a [Check],
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("hopcheck: {e}");
            ExitCode::from(EXIT_INVALID)
        }
    }
}

async fn run(cli: &Cli) -> Result<ExitCode, AppError> {
    let report = Report::new(cli.use_color());
    let settings = cli.client_settings()?;

    // Every fixture is parsed before the first request goes out.
    let mut fixtures = Vec::with_capacity(cli.fixtures.len());
    for path in &cli.fixtures {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| AppError::ReadFixture {
                path: path.clone(),
                source,
            })?;
        match parse_fixture(&source) {
            Ok(checks) => {
                info!(fixture = %path.display(), checks = checks.len(), "fixture parsed");
                fixtures.push((path.as_path(), checks));
            }
            Err(e) => {
                eprint!("{}", report.syntax_error(path, &e));
                return Ok(ExitCode::from(EXIT_INVALID));
            }
        }
    }

    if cli.parse_only {
        print_parsed(&fixtures)?;
        return Ok(ExitCode::SUCCESS);
    }

    let client = ReqwestHttpClient::new(&settings)?;
    let runner = RunFixture::new(ExecuteCheck::new(
        Arc::new(client),
        ExpectationEvaluator::new(),
    ));

    for (path, checks) in &fixtures {
        match runner.run(checks).await {
            RunOutcome::Passed { checks } => {
                println!("{}: {checks} checks passed", path.display());
            }
            RunOutcome::Failed(failure) => {
                eprint!("{}", report.failure(path, &failure));
                return Ok(ExitCode::from(EXIT_FAILED));
            }
            RunOutcome::Invalid(e) => {
                eprint!("{}", report.syntax_error(path, &e));
                return Ok(ExitCode::from(EXIT_INVALID));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_parsed(fixtures: &[(&Path, Vec<Check>)]) -> Result<(), AppError> {
    let parsed: Vec<_> = fixtures
        .iter()
        .map(|(path, checks)| ParsedFixture {
            fixture: path.display().to_string(),
            checks,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}
