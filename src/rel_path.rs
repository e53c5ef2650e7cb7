use std::path::Path;

/// Canonical name of the package root directory.
pub const ROOT: &str = ".";

/// Normalizes a root-relative path: forward slashes, no leading `./` or `/`,
/// no trailing `/`. The empty path and `.` both normalize to [`ROOT`].
pub fn normalize(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    while normalized.ends_with('/') && normalized.len() > 1 {
        normalized.pop();
    }
    let mut trimmed = normalized.as_str();
    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }
    if trimmed.is_empty() || trimmed == ROOT {
        return ROOT.to_string();
    }
    trimmed.to_string()
}

/// Directory component of a normalized relative path. Top-level names have
/// [`ROOT`] as their parent; the root has none.
pub fn dirname(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    match path.rfind('/') {
        Some(idx) => Some(&path[..idx]),
        None => Some(ROOT),
    }
}

/// Every ancestor directory of `path`, nearest first, ending with [`ROOT`].
pub fn ancestors(path: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut current = path;
    while let Some(parent) = dirname(current) {
        out.push(parent);
        current = parent;
    }
    out
}

/// Number of components below the root. The root itself has depth 0.
pub fn depth(path: &str) -> usize {
    if path == ROOT {
        0
    } else {
        path.split('/').count()
    }
}

/// Path of `path` relative to `root`, forward-slash separated. Returns
/// `None` when `path` is not inside `root`.
pub fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let stripped = path.strip_prefix(root).ok()?;
    let joined = stripped
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/");
    Some(normalize(&joined))
}
