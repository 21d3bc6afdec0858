//! Check execution state machine.
//!
//! For every checker UUID on a dequeued [`PendingCheckItem`] the executor
//! walks the same sequence:
//!
//! ```text
//! post RUNNING ──► decode UUID ──► trigger (create) ──► post terminal status
//!      │                │                                   │
//!      └─ error: abort  └─ malformed: abort                 └─ error: abort
//! ```
//!
//! The trigger outcome picks the terminal status:
//!
//! | Trigger result | Status |
//! |----------------|--------|
//! | irrelevant sentinel | `IRRELEVANT` |
//! | transport / status / timeout error | `FAILED` |
//! | success with at least one message | `SUCCESSFUL` |
//! | success with no message | `FAILED` |
//!
//! Exactly one `RUNNING` and one terminal report are posted per checker, in
//! that order. A failure to post either report, or a malformed UUID, aborts
//! the whole item: the remaining checkers are not attempted and the next poll
//! re-discovers whatever is still pending.

use std::sync::Arc;
use std::time::Duration;

use checks::{
    CheckStatus, CheckerUuid, IdentityCodec, PendingCheckItem, PipelineTrigger, ReviewError,
    ReviewService, StatusUpdate, Timestamp, TriggerAck, TriggerError, TriggerIntent,
    TriggerRequest,
};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::config::bounded;

/// Message attached to the `RUNNING` report, prefixed by the scheme.
pub const RUNNING_MESSAGE_SUFFIX: &str = "about to submit job to pipeline";

/// Longest terminal message posted, in characters.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Characters kept from an over-long message before the ellipsis.
const TRUNCATED_KEEP_CHARS: usize = 995;

const ELLIPSIS: &str = "...";

/// Failures that abort the execution of a pending check item.
#[derive(Debug, Error)]
pub enum CheckError {
    /// A status report could not be posted.
    #[error("Posting {status} for checker {checker} failed: {source}")]
    StatusPost {
        /// The checker being reported on.
        checker: CheckerUuid,
        /// The status that could not be posted.
        status: CheckStatus,
        /// The underlying review-service failure.
        #[source]
        source: ReviewError,
    },

    /// The checker UUID does not belong to this scheme or is malformed.
    #[error("uuid {checker:?} had unknown prefix")]
    MalformedChecker {
        /// The offending UUID.
        checker: CheckerUuid,
    },
}

/// The terminal status reached for one checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckVerdict {
    /// The checker.
    pub checker: CheckerUuid,
    /// The handler prefix decoded from the UUID.
    pub prefix: String,
    /// The terminal status that was posted.
    pub status: CheckStatus,
}

/// Executes pending checks against the review service and the pipeline.
#[derive(Clone)]
pub struct CheckExecutor {
    review: Arc<dyn ReviewService>,
    trigger: Arc<dyn PipelineTrigger>,
    codec: IdentityCodec,
    repo_root: String,
    call_timeout: Duration,
}

impl CheckExecutor {
    /// Creates an executor.
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

    /// Runs the state machine for every checker on `item`, in UUID order.
    #[instrument(
        skip_all,
        fields(
            repository = %item.repository,
            change = %item.change_number,
            patchset = %item.patch_set_id,
        )
    )]
    pub async fn execute(&self, item: &PendingCheckItem) -> Result<Vec<CheckVerdict>, CheckError> {
        info!(checkers = item.checker_uuids.len(), "checking");

        let mut verdicts = Vec::with_capacity(item.checker_uuids.len());
        for checker in &item.checker_uuids {
            verdicts.push(self.execute_checker(item, checker).await?);
        }
        Ok(verdicts)
    }

    async fn execute_checker(
        &self,
        item: &PendingCheckItem,
        checker: &CheckerUuid,
    ) -> Result<CheckVerdict, CheckError> {
        let running = StatusUpdate {
            checker_uuid: checker.clone(),
            status: CheckStatus::Running,
            message: running_message(&self.codec),
            url: None,
            started: Some(Timestamp::now()),
        };
        self.post_status(item, running).await?;

        let prefix = self
            .codec
            .decode(checker.as_str())
            .ok_or_else(|| CheckError::MalformedChecker {
                checker: checker.clone(),
            })?
            .to_string();

        let request = TriggerRequest {
            repo_root: self.repo_root.clone(),
            project: item.repository.clone(),
            change_number: item.change_number,
            patch_set: item.patch_set_id,
            checker_uuid: Some(checker.clone()),
        };
        let result = bounded(
            self.call_timeout,
            self.trigger.trigger(TriggerIntent::Create, &request),
            |after| TriggerError::Timeout { after },
        )
        .await;

        let status = terminal_status(&result);
        let ack = match result {
            Ok(ack) => {
                if status == CheckStatus::Failed {
                    warn!(
                        checker = %checker,
                        prefix = %prefix,
                        "trigger accepted the job but returned no message",
                    );
                }
                ack
            }
            Err(TriggerError::Irrelevant) => TriggerAck::default(),
            Err(err) => {
                warn!(
                    checker = %checker,
                    prefix = %prefix,
                    error = %err,
                    "failed in attempt to schedule check",
                );
                TriggerAck::default()
            }
        };

        info!(checker = %checker, prefix = %prefix, status = %status, "check scheduled");
        let terminal = StatusUpdate {
            checker_uuid: checker.clone(),
            status,
            message: truncate_message(&ack.messages.join(", ")),
            url: ack.details_url,
            started: None,
        };
        self.post_status(item, terminal).await?;

        Ok(CheckVerdict {
            checker: checker.clone(),
            prefix,
            status,
        })
    }

    async fn post_status(
        &self,
        item: &PendingCheckItem,
        update: StatusUpdate,
    ) -> Result<(), CheckError> {
        bounded(
            self.call_timeout,
            self.review
                .post_check_status(item.change_number, item.patch_set_id, &update),
            |after| ReviewError::Timeout {
                operation: "post_check_status",
                after,
            },
        )
        .await
        .map_err(|source| CheckError::StatusPost {
            checker: update.checker_uuid.clone(),
            status: update.status,
            source,
        })
    }
}

fn running_message(codec: &IdentityCodec) -> String {
    format!("{} {RUNNING_MESSAGE_SUFFIX}", codec.scheme())
}

/// Maps a trigger result to the terminal status reported for it.
///
/// An acknowledgement without any message is indistinguishable from an
/// unreported failure and is therefore `FAILED`.
pub fn terminal_status(result: &Result<TriggerAck, TriggerError>) -> CheckStatus {
    match result {
        Err(TriggerError::Irrelevant) => CheckStatus::Irrelevant,
        Err(_) => CheckStatus::Failed,
        Ok(ack) if ack.messages.is_empty() => CheckStatus::Failed,
        Ok(_) => CheckStatus::Successful,
    }
}

/// Limits a terminal message to [`MAX_MESSAGE_CHARS`] characters.
///
/// Longer messages keep their first 995 characters followed by `...`, so a
/// truncated message is 998 characters long.
pub fn truncate_message(message: &str) -> String {
    if message.chars().count() <= MAX_MESSAGE_CHARS {
        return message.to_string();
    }
    let mut truncated: String = message.chars().take(TRUNCATED_KEEP_CHARS).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
