//! Submission execution: lock, resolve the checker, trigger the merge.
//!
//! Every step is best effort. Failures are logged as warnings and recorded
//! in the returned [`SubmitOutcome`]; nothing is posted back to the review
//! service and the executor itself never fails.

use std::sync::Arc;
use std::time::Duration;

use checks::{
    CheckerUuid, IdentityCodec, PendingSubmitItem, PipelineTrigger, ReviewError, ReviewService,
    TriggerError, TriggerIntent, TriggerRequest,
};
use tracing::{info, instrument, warn};

use crate::config::bounded;
use crate::registry::find_for_repository;

/// Returns `true` if `item` should be handed to the submission worker.
///
/// The change must be mergeable and submittable, and must not already carry
/// a lock marker.
pub fn is_eligible(item: &PendingSubmitItem) -> bool {
    item.mergeable && item.submittable && !item.is_lock_marked()
}

/// What happened while executing one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// The lock marker was applied.
    pub locked: bool,
    /// The checker resolved for the project, if any.
    pub checker: Option<CheckerUuid>,
    /// The pipeline accepted the merge trigger.
    pub triggered: bool,
}

/// Executes submissions against the review service and the pipeline.
#[derive(Clone)]
pub struct SubmissionExecutor {
    review: Arc<dyn ReviewService>,
    trigger: Arc<dyn PipelineTrigger>,
    codec: IdentityCodec,
    repo_root: String,
    call_timeout: Duration,
}

impl SubmissionExecutor {
    /// `repo_root` is sent as `repoRoot` in every merge trigger.
    pub fn new(
        review: Arc<dyn ReviewService>,
        trigger: Arc<dyn PipelineTrigger>,
        codec: IdentityCodec,
        repo_root: impl Into<String>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            review,
            trigger,
            codec,
            repo_root: repo_root.into(),
            call_timeout,
        }
    }

    /// Locks the change, resolves its checker and triggers the merge.
    ///
    /// Never fails: lock and trigger errors are logged and reflected in the
    /// returned [`SubmitOutcome`].
    #[instrument(
        skip_all,
        fields(
            project = %item.project,
            change = %item.change_number,
            patchset = %item.revision_number,
        )
    )]
    pub async fn execute(&self, item: &PendingSubmitItem) -> SubmitOutcome {
        info!("submitting");

        let locked = match bounded(self.call_timeout, self.review.post_lock(item), |after| {
            ReviewError::Timeout {
                operation: "post_lock",
                after,
            }
        })
        .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to lock change for merge");
                false
            }
        };

        let checker = self.resolve_checker(item).await;

        let request = TriggerRequest {
            repo_root: self.repo_root.clone(),
            project: item.project.clone(),
            change_number: item.change_number,
            patch_set: item.revision_number,
            checker_uuid: checker.clone(),
        };
        let triggered = match bounded(
            self.call_timeout,
            self.trigger.trigger(TriggerIntent::Merge, &request),
            |after| TriggerError::Timeout { after },
        )
        .await
        {
            Ok(ack) => {
                info!(messages = ?ack.messages, "merge pipeline triggered");
                true
            }
            Err(err) => {
                warn!(error = %err, "failed to trigger merge pipeline");
                false
            }
        };

        SubmitOutcome {
            locked,
            checker,
            triggered,
        }
    }

    async fn resolve_checker(&self, item: &PendingSubmitItem) -> Option<CheckerUuid> {
        let listed = bounded(self.call_timeout, self.review.list_checkers(), |after| {
            ReviewError::Timeout {
                operation: "list_checkers",
                after,
            }
        })
        .await;

        match listed {
            Ok(checkers) => {
                let found = find_for_repository(&checkers, &self.codec, &item.project);
                if found.is_none() {
                    warn!("no checker registered for project");
                }
                found
            }
            Err(err) => {
                warn!(error = %err, "failed to list checkers");
                None
            }
        }
    }
}
