use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::error::AppError;

/// Upper bound used when the caller does not care about concurrency.
pub const UNBOUNDED: usize = Semaphore::MAX_PERMITS;

/// Runs every labeled branch concurrently and collects their values in
/// branch order.
///
/// At most `max_in_flight` branches run at once. The first branch to fail
/// decides the result: its error is returned as-is and the remaining
/// branches are aborted, so their values are discarded. Blocking work a
/// branch already handed to the blocking pool still runs to completion.
pub async fn join_labeled<T, Fut>(
    branches: Vec<(String, Fut)>,
    max_in_flight: usize,
) -> Result<Vec<T>, AppError>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T, AppError>> + Send + 'static,
{
    let total = branches.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let parallelism = max_in_flight.clamp(1, UNBOUNDED).min(total);
    let semaphore = Arc::new(Semaphore::new(parallelism));
    let mut join_set: JoinSet<(usize, Result<T, AppError>)> = JoinSet::new();
    let mut labels = Vec::with_capacity(total);

    for (idx, (label, branch)) in branches.into_iter().enumerate() {
        labels.push(label);
        let semaphore = semaphore.clone();
        join_set.spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    return (idx, Err(AppError::Task("worker pool closed".to_string())));
                }
            };
            (idx, branch.await)
        });
    }

    let mut completed = 0usize;
    let mut ordered: Vec<Option<T>> = (0..total).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        let (idx, outcome) = match joined {
            Ok(inner) => inner,
            Err(join_err) => {
                join_set.abort_all();
                return Err(join_err.into());
            }
        };

        match outcome {
            Ok(value) => {
                if ordered[idx].is_some() {
                    join_set.abort_all();
                    return Err(AppError::Task(format!(
                        "duplicate result for branch {}",
                        labels[idx]
                    )));
                }
                ordered[idx] = Some(value);
                completed += 1;
            }
            Err(err) => {
                debug!(branch = %labels[idx], error = %err, "branch failed");
                join_set.abort_all();
                return Err(err);
            }
        }
    }

    if completed != total {
        return Err(AppError::Task(format!(
            "incomplete join: expected {total}, got {completed}"
        )));
    }

    let mut out = Vec::with_capacity(total);
    for (idx, maybe_value) in ordered.into_iter().enumerate() {
        let value = maybe_value
            .ok_or_else(|| AppError::Task(format!("missing result for branch {}", labels[idx])))?;
        out.push(value);
    }
    Ok(out)
}
