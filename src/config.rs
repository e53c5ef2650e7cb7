use std::{env, path::PathBuf};

use crate::cli::Args;
use crate::error::AppError;
use crate::services::report_service::ReportOptions;
use crate::services::resolve_service::ResolverKind;

pub const DEFAULT_CONCURRENCY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Report,
    Json,
    List,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub dir: PathBuf,
    pub output: OutputMode,
    pub report: ReportOptions,
    pub resolver: ResolverKind,
    /// Explicit npm executable, skipping the PATH lookup.
    pub npm: Option<PathBuf>,
    pub concurrency: usize,
}

impl AppConfig {
    /// Command-line flags win over `PKGFILES_*` environment variables.
    pub fn from_args(args: &Args) -> Result<Self, AppError> {
        Self::from_sources(args, |key| env::var(key).ok())
    }

    fn from_sources(
        args: &Args,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let dir = match &args.dir {
            Some(dir) => dir.clone(),
            None => env::current_dir()?,
        };

        let output = if args.json {
            OutputMode::Json
        } else if args.list {
            OutputMode::List
        } else {
            OutputMode::Report
        };

        let resolver = match (args.resolver, lookup("PKGFILES_RESOLVER")) {
            (Some(kind), _) => kind,
            (None, Some(raw)) => raw
                .trim()
                .parse::<ResolverKind>()
                .map_err(|err| AppError::Config(format!("invalid PKGFILES_RESOLVER: {err}")))?,
            (None, None) => ResolverKind::default(),
        };

        let concurrency = match (args.concurrency, lookup("PKGFILES_CONCURRENCY")) {
            (Some(n), _) => n,
            (None, Some(raw)) => raw
                .trim()
                .parse::<usize>()
                .map_err(|err| AppError::Config(format!("invalid PKGFILES_CONCURRENCY: {err}")))?,
            (None, None) => DEFAULT_CONCURRENCY,
        };
        if concurrency == 0 {
            return Err(AppError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }

        let npm = lookup("PKGFILES_NPM")
            .filter(|raw| !raw.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            dir,
            output,
            report: ReportOptions {
                sort: args.sort,
                split: args.split,
                disk: args.disk,
            },
            resolver,
            npm,
            concurrency,
        })
    }
}
