use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::package::Package;
use crate::services::packlist_service;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolverKind {
    /// npm when it can be found, the built-in rules otherwise.
    #[default]
    Auto,
    Npm,
    Builtin,
}

impl std::fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Npm => write!(f, "npm"),
            Self::Builtin => write!(f, "builtin"),
        }
    }
}

impl std::str::FromStr for ResolverKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "npm" => Ok(Self::Npm),
            "builtin" => Ok(Self::Builtin),
            _ => Err(format!("unknown resolver: {s}")),
        }
    }
}

/// Files a package would publish, plus the manifests encountered.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Absolute paths, in resolver order.
    pub files: Vec<PathBuf>,
    pub packages: Vec<Package>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolver {
    /// `npm pack --dry-run --json` run with the given executable.
    Npm { program: PathBuf },
    /// The built-in packlist rules.
    Builtin,
}

#[derive(Debug, Deserialize)]
struct NpmPackReport {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    files: Vec<NpmPackFile>,
    #[serde(default)]
    bundled: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct NpmPackFile {
    path: String,
}

#[cfg(windows)]
const NPM_NAMES: &[&str] = &["npm.cmd", "npm.exe", "npm"];
#[cfg(not(windows))]
const NPM_NAMES: &[&str] = &["npm"];

/// First `npm` executable found in the directories of `path_var`.
pub fn find_in_path(path_var: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_var)
        .flat_map(|dir| NPM_NAMES.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

fn find_npm(npm_override: Option<&Path>) -> Option<PathBuf> {
    if let Some(program) = npm_override {
        return program.is_file().then(|| program.to_path_buf());
    }
    std::env::var_os("PATH").and_then(|path| find_in_path(&path))
}

/// Picks the resolver for `kind`. In auto mode a missing npm is not fatal:
/// a warning is logged and the built-in rules take over.
pub fn locate(kind: ResolverKind, npm_override: Option<&Path>) -> Result<Resolver, AppError> {
    match kind {
        ResolverKind::Builtin => Ok(Resolver::Builtin),
        ResolverKind::Npm => find_npm(npm_override)
            .map(|program| Resolver::Npm { program })
            .ok_or_else(|| AppError::Resolver("could not find npm on PATH".to_string())),
        ResolverKind::Auto => match find_npm(npm_override) {
            Some(program) => {
                debug!(npm = %program.display(), "using npm resolver");
                Ok(Resolver::Npm { program })
            }
            None => {
                warn!("Could not find npm on PATH. You may not see matching behaviour.");
                Ok(Resolver::Builtin)
            }
        },
    }
}

/// Validates and canonicalizes the package directory.
pub fn package_root(dir: &Path) -> Result<PathBuf, AppError> {
    if !dir.is_dir() {
        return Err(AppError::NotADirectory(dir.display().to_string()));
    }
    Ok(dir.canonicalize()?)
}

impl Resolver {
    pub async fn resolve(&self, root: &Path) -> Result<Resolution, AppError> {
        match self {
            Self::Builtin => {
                let root = root.to_path_buf();
                let packlist =
                    tokio::task::spawn_blocking(move || packlist_service::resolve_packlist(&root))
                        .await??;
                Ok(Resolution {
                    files: packlist.files,
                    packages: packlist.packages,
                })
            }
            Self::Npm { program } => resolve_with_npm(program, root).await,
        }
    }
}

async fn resolve_with_npm(program: &Path, root: &Path) -> Result<Resolution, AppError> {
    let output = tokio::process::Command::new(program)
        .args(["pack", "--dry-run", "--json", "--ignore-scripts"])
        .current_dir(root)
        .output()
        .await
        .map_err(|e| AppError::Resolver(format!("failed to run {}: {e}", program.display())))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::Resolver(format!(
            "npm pack failed ({}): {}",
            output.status,
            stderr.trim()
        )));
    }

    parse_npm_report(root, &String::from_utf8_lossy(&output.stdout))
}

fn manifest_package(pkg_root: &Path, fallback: &str, rel: &str) -> Package {
    match packlist_service::read_manifest(pkg_root) {
        Ok(manifest) => Package::from_manifest(&manifest, fallback, rel),
        Err(err) => {
            debug!(dir = %pkg_root.display(), error = %err, "unreadable manifest");
            Package::named(fallback, rel)
        }
    }
}

/// Turns the JSON printed by `npm pack --dry-run --json` into a resolution
/// rooted at `root`.
pub fn parse_npm_report(root: &Path, stdout: &str) -> Result<Resolution, AppError> {
    let reports: Vec<NpmPackReport> = serde_json::from_str(stdout.trim())?;
    let report = reports
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Resolver("npm pack reported no package".to_string()))?;

    let mut root_package = manifest_package(root, &report.name, crate::rel_path::ROOT);
    root_package.name = report.name.clone();
    if report.version.is_some() {
        root_package.version = report.version.clone();
    }

    let mut packages = vec![root_package];
    for name in &report.bundled {
        let rel = format!("node_modules/{name}");
        packages.push(manifest_package(&root.join(&rel), name, &rel));
    }

    let files = report
        .files
        .iter()
        .map(|f| root.join(crate::rel_path::normalize(&f.path)))
        .collect();

    Ok(Resolution { files, packages })
}
