use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::AppError;
use crate::models::file_entry::FileEntry;
use crate::rel_path;
use crate::services::join_service;

/// Bytes allocated on disk: `st_blocks` is always counted in 512-byte
/// units, whatever the filesystem's block size.
#[cfg(unix)]
pub fn disk_usage(metadata: &Metadata) -> u64 {
    use std::os::unix::fs::MetadataExt;
    metadata.blocks() * 512
}

#[cfg(not(unix))]
pub fn disk_usage(metadata: &Metadata) -> u64 {
    metadata.len()
}

fn entry_name(root: &Path, path: &Path) -> String {
    rel_path::relative_to(root, path)
        .unwrap_or_else(|| rel_path::normalize(&path.to_string_lossy()))
}

/// `lstat`s one resolved path. A path that no longer exists becomes a
/// zero-sized entry with `exists: false`; a directory is recorded with zero
/// sizes.
pub async fn stat_file(root: &Path, path: &Path) -> Result<FileEntry, AppError> {
    let name = entry_name(root, path);
    match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(FileEntry::new(name, 0, 0)),
        Ok(metadata) => Ok(FileEntry::new(name, metadata.len(), disk_usage(&metadata))),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!(file = %name, "published file vanished before stat");
            Ok(FileEntry::missing(name))
        }
        Err(err) => Err(AppError::Io(std::io::Error::new(
            err.kind(),
            format!("lstat {}: {err}", path.display()),
        ))),
    }
}

/// Stats every path concurrently, at most `max_in_flight` at a time. The
/// result follows the order of `paths`.
pub async fn stat_files(
    root: &Path,
    paths: Vec<PathBuf>,
    max_in_flight: usize,
) -> Result<Vec<FileEntry>, AppError> {
    let branches = paths
        .into_iter()
        .map(|path| {
            let root = root.to_path_buf();
            let label = path.to_string_lossy().to_string();
            (label, async move { stat_file(&root, &path).await })
        })
        .collect();
    join_service::join_labeled(branches, max_in_flight).await
}
