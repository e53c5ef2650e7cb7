use std::io::Write;

use tracing::info;

use crate::config::{AppConfig, OutputMode};
use crate::error::AppError;
use crate::services::report_service;
use crate::services::resolve_service::{self, Resolver};
use crate::services::summary_service;

fn prepare(config: &AppConfig) -> Result<(Resolver, std::path::PathBuf), AppError> {
    let root = resolve_service::package_root(&config.dir)?;
    let resolver = resolve_service::locate(config.resolver, config.npm.as_deref())?;
    info!(
        root = %root.display(),
        resolver = ?resolver,
        concurrency = config.concurrency,
        "inspecting package"
    );
    Ok((resolver, root))
}

/// Prints the column report or, with `--json`, the summary as JSON.
pub async fn show_summary(config: &AppConfig, out: &mut impl Write) -> Result<(), AppError> {
    let (resolver, root) = prepare(config)?;
    let summary = summary_service::summarize(resolver, root, config.concurrency).await?;

    let rendered = match config.output {
        OutputMode::Json => {
            let mut json = report_service::render_json(&summary)?;
            json.push('\n');
            json
        }
        _ => report_service::render_report(&summary, &config.report),
    };
    out.write_all(rendered.as_bytes())?;
    Ok(())
}

/// Prints published file paths to `out` and the file count to `err`.
pub async fn list_files(
    config: &AppConfig,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<(), AppError> {
    let (resolver, root) = prepare(config)?;
    let published =
        summary_service::collect_published(&resolver, &root, config.concurrency).await?;

    let listing = report_service::render_file_list(&published.entries);
    out.write_all(listing.as_bytes())?;
    let count = published.entries.iter().filter(|e| !e.is_directory()).count();
    writeln!(err, "\nTotal {count} files")?;
    Ok(())
}

pub async fn execute(
    config: &AppConfig,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<(), AppError> {
    match config.output {
        OutputMode::List => list_files(config, out, err).await,
        OutputMode::Report | OutputMode::Json => show_summary(config, out).await,
    }
}
