use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Instant;

use tracing::debug;

use crate::error::AppError;
use crate::models::file_entry::Entry;
use crate::models::package::Package;
use crate::models::summary::Summary;
use crate::services::du_service::{self, SizeMode};
use crate::services::join_service;
use crate::services::resolve_service::Resolver;
use crate::services::stat_service;
use crate::services::tree_service;

/// Published files and synthesized directories of one package directory.
#[derive(Debug, Clone, Default)]
pub struct Published {
    pub entries: Vec<Entry>,
    pub packages: Vec<Package>,
    pub publish_size: u64,
    pub publish_disk_size: u64,
}

/// Resolves, stats and aggregates the files `root` would publish.
pub async fn collect_published(
    resolver: &Resolver,
    root: &Path,
    max_in_flight: usize,
) -> Result<Published, AppError> {
    let started = Instant::now();
    let resolution = resolver.resolve(root).await?;
    debug!(
        files = resolution.files.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "resolved published files"
    );

    let files = stat_service::stat_files(root, resolution.files, max_in_flight).await?;
    let tree = tree_service::build_tree(files);
    let publish_size = tree.root().size;
    let publish_disk_size = tree.root().disk_size;
    debug!(
        publish_size,
        publish_disk_size,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "aggregated published files"
    );

    Ok(Published {
        entries: tree.into_entries(),
        packages: resolution.packages,
        publish_size,
        publish_disk_size,
    })
}

enum Branch {
    Published(Published),
    Size(u64),
}

type BranchFuture = Pin<Box<dyn Future<Output = Result<Branch, AppError>> + Send>>;

/// Builds the full summary. The published-file collection and the two
/// dependency-inclusive size walks run concurrently; the first failure
/// aborts the summary.
pub async fn summarize(
    resolver: Resolver,
    root: PathBuf,
    max_in_flight: usize,
) -> Result<Summary, AppError> {
    let published: BranchFuture = {
        let root = root.clone();
        Box::pin(async move {
            collect_published(&resolver, &root, max_in_flight)
                .await
                .map(Branch::Published)
        })
    };
    let disk: BranchFuture = {
        let root = root.clone();
        Box::pin(async move {
            du_service::directory_size_async(root, SizeMode::Disk)
                .await
                .map(Branch::Size)
        })
    };
    let logical: BranchFuture = {
        let root = root.clone();
        Box::pin(async move {
            du_service::directory_size_async(root, SizeMode::Logical)
                .await
                .map(Branch::Size)
        })
    };

    let mut results = join_service::join_labeled(
        vec![
            ("published files".to_string(), published),
            ("extracted disk size".to_string(), disk),
            ("extracted size".to_string(), logical),
        ],
        join_service::UNBOUNDED,
    )
    .await?
    .into_iter();

    let (Some(Branch::Published(published)), Some(Branch::Size(disk)), Some(Branch::Size(size))) =
        (results.next(), results.next(), results.next())
    else {
        return Err(AppError::Task("summary branches out of order".to_string()));
    };

    Ok(Summary {
        packages: published.packages,
        entries: published.entries,
        extracted_size: size,
        extracted_disk_size: disk,
        publish_size: published.publish_size,
        publish_disk_size: published.publish_disk_size,
    })
}
