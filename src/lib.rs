pub mod cli;
mod commands;
pub mod config;
pub mod error;
pub mod models;
pub(crate) mod rel_path;
pub mod services;

use std::backtrace::{Backtrace, BacktraceStatus};
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Args;
use commands::summary_commands;
use config::AppConfig;
use error::AppError;

fn init_logging(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}={fallback}", env!("CARGO_CRATE_NAME"))));

    // stdout carries the report; everything else goes to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn init_runtime() -> Result<tokio::runtime::Runtime, AppError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::General(format!("failed to start runtime: {err}")))
}

fn report_failure(err: &AppError) {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{err}");
    let backtrace = Backtrace::force_capture();
    if backtrace.status() == BacktraceStatus::Captured {
        let _ = writeln!(stderr, "{backtrace}");
    }
}

async fn execute(args: &Args) -> Result<(), AppError> {
    let config = AppConfig::from_args(args)?;
    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr();
    summary_commands::execute(&config, &mut stdout, &mut stderr).await?;
    stdout.flush()?;
    Ok(())
}

pub fn run() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = init_runtime().and_then(|runtime| runtime.block_on(execute(&args)));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&err);
            ExitCode::FAILURE
        }
    }
}
