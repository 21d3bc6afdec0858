//! Shared value types for the connector domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! the pending work discovered by a poll and the messages exchanged with the
//! review service and the pipeline trigger. All of them are value-like: each is
//! owned by the dispatch cycle that produced it and dropped once consumed.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ChangeId, ChangeNumber, CheckerUuid, PatchSetId, RepositoryName};

// ---------------------------------------------------------------------------
// Check status
// ---------------------------------------------------------------------------

/// The state label of one checker obligation on one patch set.
///
/// This is a finite-state label, not a progress counter: there is no total
/// order between the variants. A check execution reports exactly one
/// [`CheckStatus::Running`] followed by exactly one terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    /// No verdict has been reported yet.
    Unset,
    /// Work has started (optimistic "about to submit").
    Running,
    /// The pipeline accepted the job.
    Successful,
    /// The job could not be scheduled.
    Failed,
    /// The pipeline reported that the check does not apply to this change.
    Irrelevant,
}

impl CheckStatus {
    /// Returns the canonical upper-case label (`"RUNNING"`, `"FAILED"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Unset => "UNSET",
            CheckStatus::Running => "RUNNING",
            CheckStatus::Successful => "SUCCESSFUL",
            CheckStatus::Failed => "FAILED",
            CheckStatus::Irrelevant => "IRRELEVANT",
        }
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Pending work
// ---------------------------------------------------------------------------

/// One patch set with one or more outstanding checker obligations.
///
/// Checker UUIDs are kept in a sorted set so executions visit them in a
/// deterministic order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingCheckItem {
    /// Repository (project) the change belongs to.
    pub repository: RepositoryName,
    /// The change carrying the patch set.
    pub change_number: ChangeNumber,
    /// The patch set awaiting verdicts.
    pub patch_set_id: PatchSetId,
    /// The checkers that still owe a verdict on this patch set.
    pub checker_uuids: BTreeSet<CheckerUuid>,
}

impl std::fmt::Display for PendingCheckItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} change {} patchset {}",
            self.repository, self.change_number, self.patch_set_id
        )
    }
}

/// A change that is a candidate for the merge pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSubmitItem {
    /// Change identifier used by the change REST endpoints.
    pub change_id: ChangeId,
    /// Repository (project) the change belongs to.
    pub project: RepositoryName,
    /// Numeric change identifier.
    pub change_number: ChangeNumber,
    /// Git ref of the current revision (e.g. `refs/changes/45/12345/3`).
    pub current_revision_ref: String,
    /// Patch set number of the current revision.
    pub revision_number: PatchSetId,
    /// The change has no merge conflicts.
    pub mergeable: bool,
    /// All submit requirements are satisfied.
    pub submittable: bool,
    /// The lock label has already been approved on this change.
    pub lock_label_approved: bool,
    /// The lock hashtag is already present on this change.
    pub lock_hashtag_present: bool,
}

impl PendingSubmitItem {
    /// Returns `true` if a lock marker (label approval or hashtag) shows the
    /// change is already being merged.
    pub fn is_lock_marked(&self) -> bool {
        self.lock_label_approved || self.lock_hashtag_present
    }
}

impl std::fmt::Display for PendingSubmitItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} change {} revision {}",
            self.project, self.change_number, self.revision_number
        )
    }
}

// ---------------------------------------------------------------------------
// Review-service messages
// ---------------------------------------------------------------------------

/// A status report for one checker on one patch set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// The checker the status applies to.
    pub checker_uuid: CheckerUuid,
    /// The reported state.
    pub status: CheckStatus,
    /// Human-readable message shown on the change.
    pub message: String,
    /// Link to details, if any.
    pub url: Option<String>,
    /// When the work started. Only set on the `RUNNING` report.
    pub started: Option<Timestamp>,
}

/// A checker as known to the review service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerInfo {
    /// Registered UUID.
    pub uuid: CheckerUuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// The repository the checker applies to.
    pub repository: String,
    /// `ENABLED` or `DISABLED`.
    pub status: String,
    /// Blocking conditions (empty for non-blocking checkers).
    pub blocking: Vec<String>,
    /// Change query restricting which changes the checker applies to.
    pub query: Option<String>,
}

/// Everything needed to create or update a checker registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerRegistration {
    /// Deterministic UUID derived from repository and prefix.
    pub uuid: CheckerUuid,
    /// Display name (the handler prefix).
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// The repository the checker applies to.
    pub repository: RepositoryName,
    /// Whether a failing check blocks submission.
    pub blocking: bool,
    /// Change query restricting which changes the checker applies to.
    pub query: String,
}

// ---------------------------------------------------------------------------
// Pipeline trigger messages
// ---------------------------------------------------------------------------

/// Why the pipeline is being triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerIntent {
    /// Run the checker's pipeline against a patch set.
    Create,
    /// Run the merge pipeline for a submittable change.
    Merge,
}

impl TriggerIntent {
    /// The value sent in the intent header.
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerIntent::Create => "create",
            TriggerIntent::Merge => "merge",
        }
    }
}

impl std::fmt::Display for TriggerIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The job description handed to the pipeline trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRequest {
    /// Base URL of the review service the pipeline should fetch from.
    pub repo_root: String,
    /// Repository (project) name.
    pub project: RepositoryName,
    /// The change to build.
    pub change_number: ChangeNumber,
    /// The patch set to build.
    pub patch_set: PatchSetId,
    /// The checker that owns the job. `None` means no checker is attached.
    pub checker_uuid: Option<CheckerUuid>,
}

/// What the pipeline trigger reported after accepting a job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerAck {
    /// Acknowledgement messages. An empty list is treated as a failure by
    /// the check executor.
    pub messages: Vec<String>,
    /// Link to the triggered run, if the pipeline reported one.
    pub details_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly; the review-service wire format lives in the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit_item() -> PendingSubmitItem {
        PendingSubmitItem {
            change_id: ChangeId::new("proj~master~I0123").unwrap(),
            project: RepositoryName::new("proj").unwrap(),
            change_number: ChangeNumber::new(42),
            current_revision_ref: "refs/changes/42/42/3".to_string(),
            revision_number: PatchSetId::new(3),
            mergeable: true,
            submittable: true,
            lock_label_approved: false,
            lock_hashtag_present: false,
        }
    }

    #[test]
    fn status_labels_are_upper_case() {
        assert_eq!(CheckStatus::Running.to_string(), "RUNNING");
        assert_eq!(CheckStatus::Irrelevant.to_string(), "IRRELEVANT");
    }

    #[test]
    fn either_marker_counts_as_locked() {
        let mut item = submit_item();
        assert!(!item.is_lock_marked());

        item.lock_label_approved = true;
        assert!(item.is_lock_marked());

        item.lock_label_approved = false;
        item.lock_hashtag_present = true;
        assert!(item.is_lock_marked());
    }

    #[test]
    fn intent_header_values() {
        assert_eq!(TriggerIntent::Create.as_str(), "create");
        assert_eq!(TriggerIntent::Merge.as_str(), "merge");
    }
}
