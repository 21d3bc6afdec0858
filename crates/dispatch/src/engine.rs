//! Wires the poller and the two workers together.

use std::sync::Arc;

use checks::{IdentityCodec, PipelineTrigger, ReviewService};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::check::CheckExecutor;
use crate::config::DispatchConfig;
use crate::poll::Poller;
use crate::queue::work_queue;
use crate::submit::SubmissionExecutor;
use crate::worker::{run_check_worker, run_submission_worker};

/// The connector: one poller feeding a check worker and a submission worker.
pub struct Connector {
    review: Arc<dyn ReviewService>,
    trigger: Arc<dyn PipelineTrigger>,
    config: DispatchConfig,
    codec: IdentityCodec,
}

impl Connector {
    /// Nothing runs until [`Connector::run`].
    pub fn new(
        review: Arc<dyn ReviewService>,
        trigger: Arc<dyn PipelineTrigger>,
        config: DispatchConfig,
        codec: IdentityCodec,
    ) -> Self {
        Self {
            review,
            trigger,
            config,
            codec,
        }
    }

    /// Runs until `shutdown` is cancelled and every task has finished.
    pub async fn run(self, shutdown: CancellationToken) {
        let (check_tx, check_rx) = work_queue("checks", self.config.check_queue_capacity);
        let (submit_tx, submit_rx) =
            work_queue("submissions", self.config.submission_queue_capacity);

        let poller = Poller::new(
            self.review.clone(),
            self.codec.clone(),
            check_tx,
            submit_tx,
            self.config.poll_interval,
            self.config.call_timeout,
        );
        let checks = CheckExecutor::new(
            self.review.clone(),
            self.trigger.clone(),
            self.codec.clone(),
            self.config.repo_root.clone(),
            self.config.call_timeout,
        );
        let submissions = SubmissionExecutor::new(
            self.review,
            self.trigger,
            self.codec,
            self.config.repo_root,
            self.config.call_timeout,
        );

        let mut tasks = JoinSet::new();
        tasks.spawn(poller.run(shutdown.clone()));
        tasks.spawn(run_check_worker(checks, check_rx, shutdown.clone()));
        tasks.spawn(run_submission_worker(submissions, submit_rx, shutdown));

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                error!(error = %err, "connector task failed");
            }
        }
        info!("connector stopped");
    }
}
