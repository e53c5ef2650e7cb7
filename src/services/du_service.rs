use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::AppError;
use crate::services::stat_service::disk_usage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMode {
    /// Bytes allocated on disk.
    Disk,
    /// Apparent file lengths.
    Logical,
}

/// Total size of everything under `dir`, the directory itself and every
/// subdirectory included, dependency trees too. Symlinks are counted as
/// links, never followed.
pub fn directory_size(dir: &Path, mode: SizeMode) -> Result<u64, AppError> {
    let mut total = 0u64;
    let mut visited = 0usize;
    for entry in walkdir::WalkDir::new(dir).follow_links(false) {
        let entry = entry?;
        let metadata = entry.metadata()?;
        total += match mode {
            SizeMode::Disk => disk_usage(&metadata),
            SizeMode::Logical => metadata.len(),
        };
        visited += 1;
    }
    debug!(dir = %dir.display(), ?mode, visited, total, "directory size");
    Ok(total)
}

/// Runs [`directory_size`] on the blocking pool.
pub async fn directory_size_async(dir: PathBuf, mode: SizeMode) -> Result<u64, AppError> {
    tokio::task::spawn_blocking(move || directory_size(&dir, mode)).await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pkgfiles_test_{name}"));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_logical_size_includes_dependencies() {
        let dir = temp_dir("du_logical");
        fs::write(dir.join("index.js"), "0123456789").unwrap();
        fs::create_dir_all(dir.join("node_modules/dep")).unwrap();
        fs::write(dir.join("node_modules/dep/index.js"), "abcde").unwrap();

        let dirs_len: u64 = [
            dir.clone(),
            dir.join("node_modules"),
            dir.join("node_modules/dep"),
        ]
        .iter()
        .map(|d| fs::symlink_metadata(d).unwrap().len())
        .sum();

        let size = directory_size(&dir, SizeMode::Logical).unwrap();
        assert_eq!(size, 15 + dirs_len);

        let _ = fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[test]
    fn test_disk_size_is_block_rounded() {
        let dir = temp_dir("du_disk");
        fs::write(dir.join("a.txt"), "a").unwrap();

        let size = directory_size(&dir, SizeMode::Disk).unwrap();
        assert_eq!(size % 512, 0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_directory_fails() {
        let result = directory_size(
            Path::new("/nonexistent/pkgfiles_du_1234567890"),
            SizeMode::Logical,
        );
        assert!(matches!(result, Err(AppError::Walk(_))));
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let dir = temp_dir("du_async");
        fs::write(dir.join("a.txt"), "hello").unwrap();

        let sync = directory_size(&dir, SizeMode::Logical).unwrap();
        let async_size = directory_size_async(dir.clone(), SizeMode::Logical)
            .await
            .unwrap();
        assert_eq!(sync, async_size);

        let _ = fs::remove_dir_all(&dir);
    }
}
