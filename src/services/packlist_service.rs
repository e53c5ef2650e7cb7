//! Built-in approximation of npm's publish rules.
//!
//! Used when npm itself cannot be located. Each package root (the published
//! directory and every bundled dependency) is walked with its own rules:
//! default excludes, per-directory `.npmignore` (or `.gitignore` when there
//! is no `.npmignore`), the manifest's `files` whitelist, and the files npm
//! always ships.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::overrides::{Override, OverrideBuilder};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::package::Package;
use crate::rel_path;

const MANIFEST: &str = "package.json";

const DEFAULT_IGNORES: &[&str] = &[
    // VCS
    ".git",
    "CVS",
    ".svn",
    ".hg",
    // Build / editor leftovers
    ".lock-wscript",
    ".wafpickle-*",
    ".*.swp",
    ".DS_Store",
    "._*",
    "*.orig",
    "config.gypi",
    // npm's own files
    "npm-debug.log",
    ".npmrc",
    "package-lock.json",
    ".npmignore",
    ".gitignore",
    "node_modules",
];

/// Root files shipped regardless of ignore rules, matched on the basename
/// with at most one extension.
const ALWAYS_INCLUDED_NAMES: &[&str] = &[
    "readme",
    "license",
    "licence",
    "changelog",
    "changes",
    "history",
];

#[derive(Debug, Clone, Default)]
pub struct Packlist {
    /// Absolute paths, sorted.
    pub files: Vec<PathBuf>,
    pub packages: Vec<Package>,
}

/// Resolves the published files of the package rooted at `root`, bundled
/// dependencies included.
pub fn resolve_packlist(root: &Path) -> Result<Packlist, AppError> {
    let mut files = BTreeSet::new();
    let mut packages = Vec::new();
    walk_package(root, root, false, &mut files, &mut packages)?;
    debug!(
        root = %root.display(),
        files = files.len(),
        packages = packages.len(),
        "resolved packlist"
    );
    Ok(Packlist {
        files: files.into_iter().collect(),
        packages,
    })
}

pub(crate) fn read_manifest(pkg_root: &Path) -> Result<serde_json::Value, AppError> {
    let path = pkg_root.join(MANIFEST);
    match fs::read_to_string(&path) {
        Ok(text) => Ok(serde_json::from_str(&text)?),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(serde_json::json!({})),
        Err(err) => Err(err.into()),
    }
}

fn is_always_included(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    if lower == MANIFEST {
        return true;
    }
    let stem = match lower.split_once('.') {
        Some((stem, ext)) if !ext.contains('.') => stem,
        Some(_) => return false,
        None => lower.as_str(),
    };
    ALWAYS_INCLUDED_NAMES.contains(&stem)
}

/// Entry points named by the manifest (`main`, `bin`) ship even when an
/// ignore rule or the `files` list would drop them.
fn manifest_entry_points(manifest: &serde_json::Value) -> Vec<String> {
    let mut out = Vec::new();
    if let Some(main) = manifest.get("main").and_then(|v| v.as_str()) {
        out.push(main.to_string());
    }
    match manifest.get("bin") {
        Some(serde_json::Value::String(bin)) => out.push(bin.clone()),
        Some(serde_json::Value::Object(bins)) => {
            out.extend(bins.values().filter_map(|v| v.as_str()).map(|s| s.to_string()));
        }
        _ => {}
    }
    out.into_iter()
        .map(|p| rel_path::normalize(&p))
        .filter(|p| p != rel_path::ROOT)
        .collect()
}

/// Names listed under `bundleDependencies` / `bundledDependencies`. `true`
/// bundles every entry of `dependencies`. A bundled package also ships its
/// own installed dependencies.
fn bundled_names(manifest: &serde_json::Value, include_dependencies: bool) -> Vec<String> {
    let mut names = BTreeSet::new();
    let dependency_names = || {
        manifest
            .get("dependencies")
            .and_then(|v| v.as_object())
            .map(|deps| deps.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default()
    };

    for key in ["bundleDependencies", "bundledDependencies"] {
        match manifest.get(key) {
            Some(serde_json::Value::Array(list)) => {
                names.extend(list.iter().filter_map(|v| v.as_str()).map(|s| s.to_string()));
            }
            Some(serde_json::Value::Bool(true)) => names.extend(dependency_names()),
            _ => {}
        }
    }
    if include_dependencies {
        names.extend(dependency_names());
    }
    names.into_iter().collect()
}

fn files_override(
    pkg_root: &Path,
    manifest: &serde_json::Value,
) -> Result<Option<Override>, AppError> {
    let Some(list) = manifest.get("files").and_then(|v| v.as_array()) else {
        return Ok(None);
    };

    let mut builder = OverrideBuilder::new(pkg_root);
    for raw in list.iter().filter_map(|v| v.as_str()) {
        let (negated, pattern) = match raw.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let pattern = rel_path::normalize(pattern);
        if pattern == rel_path::ROOT {
            continue;
        }
        let bang = if negated { "!" } else { "" };
        // a listed directory ships everything below it; entries without a
        // slash match at any depth
        if pattern.contains('/') {
            builder.add(&format!("{bang}/{pattern}"))?;
            builder.add(&format!("{bang}/{pattern}/**"))?;
        } else {
            builder.add(&format!("{bang}{pattern}"))?;
            builder.add(&format!("{bang}**/{pattern}/**"))?;
        }
    }
    Ok(Some(builder.build()?))
}

fn default_ignores(pkg_root: &Path) -> Result<Gitignore, AppError> {
    let mut builder = GitignoreBuilder::new(pkg_root);
    for line in DEFAULT_IGNORES {
        builder.add_line(None, line)?;
    }
    Ok(builder.build()?)
}

/// `.npmignore` wins over `.gitignore` within the same directory.
fn load_dir_ignore(dir: &Path) -> Result<Option<Gitignore>, AppError> {
    let candidate = [".npmignore", ".gitignore"]
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file());
    let Some(path) = candidate else {
        return Ok(None);
    };

    let mut builder = GitignoreBuilder::new(dir);
    if let Some(err) = builder.add(&path) {
        return Err(err.into());
    }
    Ok(Some(builder.build()?))
}

struct PackageRules {
    pkg_root: PathBuf,
    defaults: Gitignore,
    files: Option<Override>,
    dir_ignores: HashMap<PathBuf, Option<Gitignore>>,
}

impl PackageRules {
    /// Ignore-file verdict for `path`: the nearest directory with an opinion
    /// decides. With a `files` list the root's own ignore file is skipped.
    fn ignored_by_files(&mut self, path: &Path, is_dir: bool) -> Result<bool, AppError> {
        let mut dirs: Vec<PathBuf> = path
            .ancestors()
            .skip(1)
            .take_while(|d| d.starts_with(&self.pkg_root))
            .map(|d| d.to_path_buf())
            .collect();
        if self.files.is_some() {
            dirs.retain(|d| d != &self.pkg_root);
        }

        for dir in dirs {
            if !self.dir_ignores.contains_key(&dir) {
                let loaded = load_dir_ignore(&dir)?;
                self.dir_ignores.insert(dir.clone(), loaded);
            }
            if let Some(Some(matcher)) = self.dir_ignores.get(&dir) {
                let verdict = matcher.matched(path, is_dir);
                if verdict.is_ignore() {
                    return Ok(true);
                }
                if verdict.is_whitelist() {
                    return Ok(false);
                }
            }
        }
        Ok(false)
    }

    fn include(&mut self, path: &Path, is_dir: bool, depth: usize) -> Result<bool, AppError> {
        if !is_dir && depth == 1 {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            if is_always_included(&name) {
                return Ok(true);
            }
        }

        if self.defaults.matched(path, is_dir).is_ignore() {
            return Ok(false);
        }
        if self.ignored_by_files(path, is_dir)? {
            return Ok(false);
        }
        if let Some(files) = &self.files {
            if !is_dir && !files.matched(path, false).is_whitelist() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn walk_package(
    pkg_root: &Path,
    publish_root: &Path,
    is_bundled: bool,
    out: &mut BTreeSet<PathBuf>,
    packages: &mut Vec<Package>,
) -> Result<(), AppError> {
    let manifest = read_manifest(pkg_root)?;
    let dir_name = pkg_root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let rel = rel_path::relative_to(publish_root, pkg_root)
        .unwrap_or_else(|| rel_path::ROOT.to_string());
    packages.push(Package::from_manifest(&manifest, &dir_name, rel));

    let mut rules = PackageRules {
        pkg_root: pkg_root.to_path_buf(),
        defaults: default_ignores(pkg_root)?,
        files: files_override(pkg_root, &manifest)?,
        dir_ignores: HashMap::new(),
    };

    let mut failure: Option<AppError> = None;
    let walker = walkdir::WalkDir::new(pkg_root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if failure.is_some() {
                return false;
            }
            let is_dir = entry.file_type().is_dir();
            match rules.include(entry.path(), is_dir, entry.depth()) {
                Ok(keep) => keep,
                Err(err) => {
                    failure = Some(err);
                    false
                }
            }
        });

    let mut walked = Vec::new();
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            walked.push(entry.into_path());
        }
    }
    if let Some(err) = failure {
        return Err(err);
    }
    out.extend(walked);

    for entry_point in manifest_entry_points(&manifest) {
        let path = pkg_root.join(&entry_point);
        if path.is_file() {
            out.insert(path);
        }
    }

    for name in bundled_names(&manifest, is_bundled) {
        let dep_root = pkg_root.join("node_modules").join(&name);
        if !dep_root.is_dir() {
            if !is_bundled {
                warn!(package = %name, "bundled dependency is not installed");
            }
            continue;
        }
        walk_package(&dep_root, publish_root, true, out, packages)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn root(&self) -> PathBuf {
            self.dir.path().canonicalize().unwrap()
        }

        fn write(&self, rel: &str, content: &str) -> &Self {
            let path = self.dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
            self
        }

        fn resolve(&self) -> (Vec<String>, Vec<Package>) {
            let root = self.root();
            let list = resolve_packlist(&root).unwrap();
            let names = list
                .files
                .iter()
                .map(|p| rel_path::relative_to(&root, p).unwrap())
                .collect();
            (names, list.packages)
        }
    }

    #[test]
    fn test_plain_package_ships_everything_but_defaults() {
        let fx = Fixture::new();
        fx.write("package.json", r#"{"name":"pkg","version":"1.0.0"}"#)
            .write("index.js", "module.exports = 1")
            .write("lib/index.js", "module.exports = 2")
            .write(".git/HEAD", "ref")
            .write("node_modules/dep/index.js", "x")
            .write(".DS_Store", "")
            .write("package-lock.json", "{}")
            .write("lib/.util.js.swp", "");

        let (names, packages) = fx.resolve();
        assert_eq!(names, vec!["index.js", "lib/index.js", "package.json"]);
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "pkg");
        assert_eq!(packages[0].path, ".");
    }

    #[test]
    fn test_npmignore_replaces_gitignore() {
        let fx = Fixture::new();
        fx.write("package.json", r#"{"name":"pkg"}"#)
            .write(".gitignore", "dist\n")
            .write(".npmignore", "test/\n")
            .write("dist/bundle.js", "x")
            .write("test/a.test.js", "x")
            .write("index.js", "x");

        let (names, _) = fx.resolve();
        assert_eq!(names, vec!["dist/bundle.js", "index.js", "package.json"]);
    }

    #[test]
    fn test_gitignore_used_without_npmignore() {
        let fx = Fixture::new();
        fx.write("package.json", r#"{"name":"pkg"}"#)
            .write(".gitignore", "*.log\ncoverage/\n")
            .write("debug.log", "x")
            .write("coverage/lcov.info", "x")
            .write("index.js", "x");

        let (names, _) = fx.resolve();
        assert_eq!(names, vec!["index.js", "package.json"]);
    }

    #[test]
    fn test_nested_ignore_file_can_whitelist() {
        let fx = Fixture::new();
        fx.write("package.json", r#"{"name":"pkg"}"#)
            .write(".npmignore", "*.md\n")
            .write("docs/.npmignore", "!keep.md\n")
            .write("docs/keep.md", "x")
            .write("docs/drop.md", "x")
            .write("NOTES.md", "x");

        let (names, _) = fx.resolve();
        assert_eq!(names, vec!["docs/keep.md", "package.json"]);
    }

    #[test]
    fn test_files_whitelist_and_always_included() {
        let fx = Fixture::new();
        fx.write(
            "package.json",
            r#"{"name":"pkg","main":"main.js","files":["lib","*.d.ts"]}"#,
        )
        .write(".npmignore", "lib\n")
        .write("lib/a.js", "x")
        .write("lib/deep/b.js", "x")
        .write("types.d.ts", "x")
        .write("main.js", "x")
        .write("src/a.ts", "x")
        .write("README.md", "x")
        .write("LICENSE", "x")
        .write("CHANGELOG.md", "x");

        let (names, _) = fx.resolve();
        assert_eq!(
            names,
            vec![
                "CHANGELOG.md",
                "LICENSE",
                "README.md",
                "lib/a.js",
                "lib/deep/b.js",
                "main.js",
                "package.json",
                "types.d.ts",
            ]
        );
    }

    #[test]
    fn test_always_included_needs_exact_basename() {
        let fx = Fixture::new();
        fx.write("package.json", r#"{"name":"pkg","files":["lib"]}"#)
            .write("lib/a.js", "x")
            .write("historyHelper.js", "x")
            .write("license-checker.config.js", "x")
            .write("README.tar.gz", "x")
            .write("changes.js", "x")
            .write("Readme.markdown", "x")
            .write("licence", "x");

        let (names, _) = fx.resolve();
        assert_eq!(
            names,
            vec![
                "Readme.markdown",
                "changes.js",
                "lib/a.js",
                "licence",
                "package.json",
            ]
        );
    }

    #[test]
    fn test_is_always_included() {
        assert!(is_always_included("README"));
        assert!(is_always_included("LICENSE.txt"));
        assert!(is_always_included("History.md"));
        assert!(is_always_included("Package.json"));
        assert!(!is_always_included("historyHelper.js"));
        assert!(!is_always_included("license-checker.config.js"));
        assert!(!is_always_included("changelog.old.md"));
        assert!(!is_always_included(".readme"));
    }

    #[test]
    fn test_files_glob_without_slash_matches_any_depth() {
        let fx = Fixture::new();
        fx.write("package.json", r#"{"name":"pkg","files":["*.d.ts"]}"#)
            .write("top.d.ts", "x")
            .write("types/index.d.ts", "x")
            .write("types/index.js", "x");

        let (names, _) = fx.resolve();
        assert_eq!(names, vec!["package.json", "top.d.ts", "types/index.d.ts"]);
    }

    #[test]
    fn test_files_entry_with_slash_is_anchored() {
        let fx = Fixture::new();
        fx.write("package.json", r#"{"name":"pkg","files":["dist/*.js"]}"#)
            .write("dist/a.js", "x")
            .write("src/dist/b.js", "x");

        let (names, _) = fx.resolve();
        assert_eq!(names, vec!["dist/a.js", "package.json"]);
    }

    #[test]
    fn test_files_negation() {
        let fx = Fixture::new();
        fx.write("package.json", r#"{"name":"pkg","files":["lib","!lib/secret.js"]}"#)
            .write("lib/a.js", "x")
            .write("lib/secret.js", "x");

        let (names, _) = fx.resolve();
        assert_eq!(names, vec!["lib/a.js", "package.json"]);
    }

    #[test]
    fn test_bundled_dependencies_are_walked_with_own_rules() {
        let fx = Fixture::new();
        fx.write(
            "package.json",
            r#"{"name":"pkg","dependencies":{"dep":"1","other":"1"},"bundleDependencies":["dep"]}"#,
        )
        .write("index.js", "x")
        .write("node_modules/dep/package.json", r#"{"name":"dep","version":"2.0.0","files":["dist"],"dependencies":{"inner":"1"}}"#)
        .write("node_modules/dep/dist/dep.js", "x")
        .write("node_modules/dep/src/dep.ts", "x")
        .write("node_modules/dep/node_modules/inner/package.json", r#"{"name":"inner"}"#)
        .write("node_modules/dep/node_modules/inner/index.js", "x")
        .write("node_modules/other/package.json", r#"{"name":"other"}"#)
        .write("node_modules/other/index.js", "x");

        let (names, packages) = fx.resolve();
        assert_eq!(
            names,
            vec![
                "index.js",
                "node_modules/dep/dist/dep.js",
                "node_modules/dep/node_modules/inner/index.js",
                "node_modules/dep/node_modules/inner/package.json",
                "node_modules/dep/package.json",
                "package.json",
            ]
        );
        let package_names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(package_names, vec!["pkg", "dep", "inner"]);
        assert_eq!(packages[1].path, "node_modules/dep");
        assert_eq!(packages[1].version.as_deref(), Some("2.0.0"));
    }

    #[test]
    fn test_bundle_true_means_all_dependencies() {
        let manifest = serde_json::json!({
            "dependencies": { "a": "1", "b": "1" },
            "bundledDependencies": true,
        });
        assert_eq!(bundled_names(&manifest, false), vec!["a", "b"]);
    }

    #[test]
    fn test_missing_manifest_uses_directory_name() {
        let fx = Fixture::new();
        fx.write("index.js", "x");

        let (names, packages) = fx.resolve();
        assert_eq!(names, vec!["index.js"]);
        let dir_name = fx.root().file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(packages[0].name, dir_name);
    }

    #[test]
    fn test_invalid_manifest_is_an_error() {
        let fx = Fixture::new();
        fx.write("package.json", "{ not json");

        let result = resolve_packlist(&fx.root());
        assert!(matches!(result, Err(AppError::Serde(_))));
    }

    #[test]
    fn test_manifest_entry_points() {
        let manifest = serde_json::json!({
            "main": "./lib/index.js",
            "bin": { "tool": "bin/tool.js" },
        });
        assert_eq!(
            manifest_entry_points(&manifest),
            vec!["lib/index.js", "bin/tool.js"]
        );
    }
}
