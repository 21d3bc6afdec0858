//! Dispatch tuning.
//!
//! The defaults reproduce the connector's historical behaviour: a fixed
//! 10-second poll with no jitter and two work queues of five slots each.
//! Every call the engine makes through a port is additionally bounded by
//! [`DispatchConfig::call_timeout`] so a hanging downstream cannot wedge a
//! worker forever.

use std::future::Future;
use std::time::Duration;

/// Default interval between polls (10 seconds).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Default capacity of each work queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 5;

/// Default bound on a single port call (30 seconds).
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

/// Configuration for the poll loop and the two workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Base URL of the review service, passed to the pipeline as `repoRoot`.
    pub repo_root: String,

    /// Fixed interval between polls.
    ///
    /// Default: 10 seconds.
    pub poll_interval: Duration,

    /// Capacity of the pending-check queue.
    ///
    /// Default: 5.
    pub check_queue_capacity: usize,

    /// Capacity of the pending-submission queue.
    ///
    /// Default: 5.
    pub submission_queue_capacity: usize,

    /// Upper bound on any single review-service or trigger call.
    ///
    /// Default: 30 seconds.
    pub call_timeout: Duration,
}

impl DispatchConfig {
    /// Creates a configuration with default tuning for `repo_root`.
    pub fn new(repo_root: impl Into<String>) -> Self {
        DispatchConfig {
            repo_root: repo_root.into(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            check_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            submission_queue_capacity: DEFAULT_QUEUE_CAPACITY,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }
}

/// Runs `call`, turning an elapsed `limit` into the error built by `elapsed`.
pub(crate) async fn bounded<T, E, F>(
    limit: Duration,
    call: F,
    elapsed: impl FnOnce(Duration) -> E,
) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(elapsed(limit)),
    }
}
