//! Port traits implemented by the infrastructure adapters.
//!
//! The dispatch engine depends only on these traits; concrete clients are
//! constructed by the composition root and injected as trait objects, so
//! tests can substitute in-memory fakes.

use async_trait::async_trait;

use crate::{
    ChangeNumber, CheckerInfo, CheckerRegistration, PatchSetId, PendingCheckItem,
    PendingSubmitItem, ReviewError, Scheme, StatusUpdate, TriggerAck, TriggerError,
    TriggerIntent, TriggerRequest,
};

/// The code-review service (Gerrit with the checks plugin).
#[async_trait]
pub trait ReviewService: Send + Sync {
    /// Returns the patch sets with checks pending for checkers of `scheme`.
    async fn pending_checks(&self, scheme: &Scheme) -> Result<Vec<PendingCheckItem>, ReviewError>;

    /// Returns the open changes, unfiltered. Eligibility is decided by the
    /// caller.
    async fn pending_submissions(&self) -> Result<Vec<PendingSubmitItem>, ReviewError>;

    /// Reports a check status on one patch set.
    async fn post_check_status(
        &self,
        change: ChangeNumber,
        patch_set: PatchSetId,
        update: &StatusUpdate,
    ) -> Result<(), ReviewError>;

    /// Marks a change as claimed for merging.
    async fn post_lock(&self, item: &PendingSubmitItem) -> Result<(), ReviewError>;

    /// Lists every checker registered with the review service.
    async fn list_checkers(&self) -> Result<Vec<CheckerInfo>, ReviewError>;

    /// Creates a checker, or updates the existing one when `update` is set.
    async fn register_checker(
        &self,
        registration: &CheckerRegistration,
        update: bool,
    ) -> Result<CheckerInfo, ReviewError>;
}

/// The downstream pipeline's trigger endpoint.
#[async_trait]
pub trait PipelineTrigger: Send + Sync {
    /// Asks the pipeline to start a job.
    ///
    /// Returns [`TriggerError::Irrelevant`] when the pipeline reports that the
    /// job does not apply.
    async fn trigger(
        &self,
        intent: TriggerIntent,
        request: &TriggerRequest,
    ) -> Result<TriggerAck, TriggerError>;
}
