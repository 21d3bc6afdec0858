//! The two queue consumers.
//!
//! Each worker processes strictly one item at a time. A worker stops when
//! its queue is closed and drained, or when `shutdown` is cancelled while it
//! is waiting for work. An item already being executed always runs to
//! completion.

use checks::{PendingCheckItem, PendingSubmitItem};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::check::CheckExecutor;
use crate::queue::WorkReceiver;
use crate::submit::SubmissionExecutor;

/// Consumes the pending-check queue.
pub async fn run_check_worker(
    executor: CheckExecutor,
    mut queue: WorkReceiver<PendingCheckItem>,
    shutdown: CancellationToken,
) {
    info!("check worker started");
    while let Some(item) = next(&mut queue, &shutdown).await {
        if let Err(err) = executor.execute(&item).await {
            warn!(item = %item, error = %err, "check execution abandoned");
        }
    }
    info!("check worker stopped");
}

/// Consumes the pending-submission queue.
pub async fn run_submission_worker(
    executor: SubmissionExecutor,
    mut queue: WorkReceiver<PendingSubmitItem>,
    shutdown: CancellationToken,
) {
    info!("submission worker started");
    while let Some(item) = next(&mut queue, &shutdown).await {
        executor.execute(&item).await;
    }
    info!("submission worker stopped");
}

async fn next<T>(queue: &mut WorkReceiver<T>, shutdown: &CancellationToken) -> Option<T> {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => None,
        item = queue.next() => item,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use checks::{CheckStatus, IdentityCodec};

    use super::*;
    use crate::queue::work_queue;
    use crate::test_support::*;

    fn check_executor(review: &Arc<FakeReview>, trigger: &Arc<FakeTrigger>) -> CheckExecutor {
        CheckExecutor::new(
            review.clone(),
            trigger.clone(),
            IdentityCodec::new(scheme()),
            "https://review.example.org/",
            Duration::from_secs(30),
        )
    }

    #[tokio::test]
    async fn check_worker_drains_queue_then_stops_when_closed() {
        let review = Arc::new(FakeReview::new());
        let trigger = Arc::new(FakeTrigger::new());
        let (tx, rx) = work_queue("checks", 5);
        tx.offer(check_item(&["jarvis:lint-aa11"]));
        tx.offer(check_item(&["jarvis:unit-bb22"]));
        drop(tx);

        run_check_worker(
            check_executor(&review, &trigger),
            rx,
            CancellationToken::new(),
        )
        .await;

        let statuses: Vec<CheckStatus> = review.posted().iter().map(|u| u.status).collect();
        assert_eq!(
            statuses,
            vec![
                CheckStatus::Running,
                CheckStatus::Successful,
                CheckStatus::Running,
                CheckStatus::Successful,
            ]
        );
    }

    #[tokio::test]
    async fn check_worker_continues_after_abandoned_item() {
        let review = Arc::new(FakeReview::new());
        let trigger = Arc::new(FakeTrigger::new());
        let (tx, rx) = work_queue("checks", 5);
        tx.offer(check_item(&["jarvis:nodigest"]));
        tx.offer(check_item(&["jarvis:lint-aa11"]));
        drop(tx);

        run_check_worker(
            check_executor(&review, &trigger),
            rx,
            CancellationToken::new(),
        )
        .await;

        assert_eq!(trigger.requests().len(), 1);
        assert_eq!(review.posted().len(), 3);
    }

    #[tokio::test]
    async fn cancelled_worker_stops_while_idle() {
        let review = Arc::new(FakeReview::new());
        let trigger = Arc::new(FakeTrigger::new());
        let (_tx, rx) = work_queue::<PendingCheckItem>("checks", 5);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        run_check_worker(check_executor(&review, &trigger), rx, shutdown).await;

        assert!(review.calls().is_empty());
    }

    #[tokio::test]
    async fn submission_worker_executes_each_item() {
        let review = Arc::new(FakeReview::new());
        let trigger = Arc::new(FakeTrigger::new());
        let executor = SubmissionExecutor::new(
            review.clone(),
            trigger.clone(),
            IdentityCodec::new(scheme()),
            "https://review.example.org/",
            Duration::from_secs(30),
        );
        let (tx, rx) = work_queue("submissions", 5);
        tx.offer(submit_item(1));
        tx.offer(submit_item(2));
        drop(tx);

        run_submission_worker(executor, rx, CancellationToken::new()).await;

        let changes: Vec<u64> = trigger
            .requests()
            .iter()
            .map(|(_, r)| r.change_number.as_u64())
            .collect();
        assert_eq!(changes, vec![1, 2]);
    }
}
