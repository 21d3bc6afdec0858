//! Gerrit REST wire format.
//!
//! Every Gerrit JSON response starts with the `)]}'` marker, which must be
//! stripped before parsing. Timestamps use `YYYY-MM-DD hh:mm:ss.nnnnnnnnn`
//! in UTC rather than RFC 3339.

use std::collections::{BTreeMap, HashMap};

use checks::{
    ChangeId, ChangeNumber, CheckStatus, CheckerInfo, CheckerRegistration, CheckerUuid,
    PatchSetId, PendingCheckItem, PendingSubmitItem, RepositoryName, ReviewError, StatusUpdate,
    Timestamp,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Marker prepended to every JSON response.
pub const JSON_PREFIX: &[u8] = b")]}'";

/// Blocking condition set on checkers registered as blocking.
pub const BLOCKING_NOT_PASSING: &str = "STATE_NOT_PASSING";

/// Status set on registered checkers.
pub const CHECKER_ENABLED: &str = "ENABLED";

/// Removes [`JSON_PREFIX`] from `body`.
pub fn strip_json_prefix(body: &[u8]) -> Result<&[u8], ReviewError> {
    body.strip_prefix(JSON_PREFIX)
        .ok_or_else(|| ReviewError::missing_prefix(JSON_PREFIX, body))
}

/// Strips the marker and decodes the remaining JSON.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ReviewError> {
    serde_json::from_slice(strip_json_prefix(body)?).map_err(|err| ReviewError::Decode {
        message: err.to_string(),
    })
}

/// The checks-plugin state for a [`CheckStatus`].
///
/// A successful trigger only means the pipeline accepted the job, so it is
/// reported as `SCHEDULED`; the pipeline posts the final result itself.
pub fn wire_state(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Unset => "NOT_STARTED",
        CheckStatus::Running | CheckStatus::Successful => "SCHEDULED",
        CheckStatus::Failed => "FAILED",
        CheckStatus::Irrelevant => "NOT_RELEVANT",
    }
}

/// Serde adapter for Gerrit's timestamp format.
pub mod gerrit_time {
    use chrono::NaiveDateTime;
    use checks::Timestamp;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f";

    pub fn format(ts: &Timestamp) -> String {
        ts.as_datetime().format(FORMAT).to_string()
    }

    pub fn parse(value: &str) -> Result<Timestamp, chrono::ParseError> {
        NaiveDateTime::parse_from_str(value, FORMAT).map(|naive| Timestamp::from_utc(naive.and_utc()))
    }

    pub fn serialize<S: Serializer>(ts: &Option<Timestamp>, s: S) -> Result<S::Ok, S::Error> {
        match ts {
            Some(ts) => s.serialize_str(&format(ts)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
        Option::<String>::deserialize(d)?
            .map(|value| parse(&value).map_err(serde::de::Error::custom))
            .transpose()
    }
}

// ---------------------------------------------------------------------------
// Pending checks
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PendingChecksInfo {
    pub patch_set: CheckablePatchSetInfo,
    #[serde(default)]
    pub pending_checks: BTreeMap<String, PendingCheckInfo>,
}

#[derive(Debug, Deserialize)]
pub struct CheckablePatchSetInfo {
    pub repository: String,
    pub change_number: u64,
    pub patch_set_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct PendingCheckInfo {
    #[serde(default)]
    pub state: Option<String>,
}

impl PendingChecksInfo {
    pub fn into_item(self) -> Result<PendingCheckItem, ReviewError> {
        let repository =
            RepositoryName::new(self.patch_set.repository).ok_or_else(|| ReviewError::Decode {
                message: "pending check without repository".to_string(),
            })?;
        Ok(PendingCheckItem {
            repository,
            change_number: ChangeNumber::new(self.patch_set.change_number),
            patch_set_id: PatchSetId::new(self.patch_set.patch_set_id),
            checker_uuids: self
                .pending_checks
                .into_keys()
                .filter_map(CheckerUuid::new)
                .collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// Check status
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CheckInput<'a> {
    pub checker_uuid: &'a str,
    pub state: &'static str,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<&'a str>,
    #[serde(with = "gerrit_time", skip_serializing_if = "Option::is_none")]
    pub started: Option<Timestamp>,
}

impl<'a> From<&'a StatusUpdate> for CheckInput<'a> {
    fn from(update: &'a StatusUpdate) -> Self {
        CheckInput {
            checker_uuid: update.checker_uuid.as_str(),
            state: wire_state(update.status),
            message: &update.message,
            url: update.url.as_deref(),
            started: update.started,
        }
    }
}

/// The parts of a posted check the connector looks at.
#[derive(Debug, Deserialize)]
pub struct CheckInfo {
    pub checker_uuid: String,
    #[serde(default)]
    pub state: String,
}

// ---------------------------------------------------------------------------
// Changes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChangeInfo {
    /// `project~branch~Change-Id`, with the project already URL-encoded.
    pub id: String,
    pub project: String,
    #[serde(rename = "_number")]
    pub number: u64,
    #[serde(default)]
    pub mergeable: bool,
    #[serde(default)]
    pub submittable: bool,
    #[serde(default)]
    pub current_revision: Option<String>,
    #[serde(default)]
    pub revisions: HashMap<String, RevisionInfo>,
    #[serde(default)]
    pub labels: HashMap<String, LabelInfo>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RevisionInfo {
    #[serde(rename = "_number")]
    pub number: u64,
    #[serde(rename = "ref", default)]
    pub git_ref: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LabelInfo {
    #[serde(default)]
    pub approved: Option<AccountInfo>,
}

#[derive(Debug, Deserialize)]
pub struct AccountInfo {
    #[serde(rename = "_account_id", default)]
    pub account_id: Option<u64>,
}

impl ChangeInfo {
    /// Converts to a submission candidate, with the lock markers evaluated
    /// against `lock_label` and `lock_hashtag`.
    ///
    /// Returns `None` when the current revision is missing from the
    /// response or when `id` or `project` is empty.
    pub fn into_item(self, lock_label: &str, lock_hashtag: &str) -> Option<PendingSubmitItem> {
        let current = self.current_revision.as_deref()?;
        let revision = self.revisions.get(current)?;
        let lock_label_approved = self
            .labels
            .get(lock_label)
            .and_then(|label| label.approved.as_ref())
            .and_then(|account| account.account_id)
            .is_some_and(|id| id != 0);
        let lock_hashtag_present = self.hashtags.iter().any(|tag| tag == lock_hashtag);

        Some(PendingSubmitItem {
            change_id: ChangeId::new(self.id)?,
            project: RepositoryName::new(self.project)?,
            change_number: ChangeNumber::new(self.number),
            current_revision_ref: revision.git_ref.clone(),
            revision_number: PatchSetId::new(revision.number),
            mergeable: self.mergeable,
            submittable: self.submittable,
            lock_label_approved,
            lock_hashtag_present,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewInput<'a> {
    pub labels: BTreeMap<&'a str, i32>,
}

#[derive(Debug, Serialize)]
pub struct HashtagsInput<'a> {
    pub add: Vec<&'a str>,
}

// ---------------------------------------------------------------------------
// Checkers
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CheckerInput<'a> {
    pub uuid: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub repository: &'a str,
    pub status: &'static str,
    pub blocking: Vec<&'static str>,
    pub query: &'a str,
}

impl<'a> From<&'a CheckerRegistration> for CheckerInput<'a> {
    fn from(registration: &'a CheckerRegistration) -> Self {
        CheckerInput {
            uuid: registration.uuid.as_str(),
            name: &registration.name,
            description: &registration.description,
            repository: registration.repository.as_str(),
            status: CHECKER_ENABLED,
            blocking: if registration.blocking {
                vec![BLOCKING_NOT_PASSING]
            } else {
                Vec::new()
            },
            query: &registration.query,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckerInfoWire {
    pub uuid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub blocking: Vec<String>,
    #[serde(default)]
    pub query: Option<String>,
}

impl CheckerInfoWire {
    pub fn into_info(self) -> Option<CheckerInfo> {
        Some(CheckerInfo {
            uuid: CheckerUuid::new(self.uuid)?,
            name: self.name,
            description: self.description,
            repository: self.repository,
            status: self.status,
            blocking: self.blocking,
            query: self.query,
        })
    }
}
