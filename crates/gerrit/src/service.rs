//! [`ReviewService`] over the Gerrit REST API and the checks plugin.

use std::collections::BTreeMap;

use async_trait::async_trait;
use checks::{
    ChangeNumber, CheckerInfo, CheckerRegistration, PatchSetId, PendingCheckItem,
    PendingSubmitItem, ReviewError, ReviewService, Scheme, StatusUpdate,
};
use tracing::{debug, instrument, warn};

use crate::client::{GerritClient, LockStyle};
use crate::wire::{
    self, ChangeInfo, CheckInfo, CheckInput, CheckerInfoWire, CheckerInput, HashtagsInput,
    PendingChecksInfo, ReviewInput,
};

/// Vote applied to the lock label.
const LOCK_VOTE: i32 = 1;

#[async_trait]
impl ReviewService for GerritClient {
    #[instrument(skip_all, fields(scheme = %scheme))]
    async fn pending_checks(&self, scheme: &Scheme) -> Result<Vec<PendingCheckItem>, ReviewError> {
        let url = self.endpoint(&["a", "plugins", "checks", "checks.pending", ""])?;
        let query = format!("scheme:{scheme}");
        let body = self.get(url, &[("query", query.as_str())]).await?;

        let infos: Vec<PendingChecksInfo> = wire::decode(&body)?;
        let mut items = Vec::with_capacity(infos.len());
        for info in infos {
            let change = info.patch_set.change_number;
            match info.into_item() {
                Ok(item) => items.push(item),
                Err(err) => warn!(change, error = %err, "skipping malformed pending check"),
            }
        }
        debug!(count = items.len(), "pending checks");
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn pending_submissions(&self) -> Result<Vec<PendingSubmitItem>, ReviewError> {
        let url = self.endpoint(&["a", "changes", ""])?;
        let body = self
            .get(
                url,
                &[
                    ("o", "CURRENT_REVISION"),
                    ("o", "SUBMITTABLE"),
                    ("o", "LABELS"),
                    ("q", "status:open"),
                ],
            )
            .await?;

        let changes: Vec<ChangeInfo> = wire::decode(&body)?;
        let mut items = Vec::with_capacity(changes.len());
        for change in changes {
            let number = change.number;
            match change.into_item(&self.settings.lock_label, &self.settings.lock_hashtag) {
                Some(item) => items.push(item),
                None => warn!(change = number, "skipping malformed change"),
            }
        }
        debug!(count = items.len(), "open changes");
        Ok(items)
    }

    #[instrument(
        skip(self, update),
        fields(change = %change, patchset = %patch_set, checker = %update.checker_uuid, status = %update.status)
    )]
    async fn post_check_status(
        &self,
        change: ChangeNumber,
        patch_set: PatchSetId,
        update: &StatusUpdate,
    ) -> Result<(), ReviewError> {
        let change = change.to_string();
        let patch_set = patch_set.to_string();
        let url = self.endpoint(&[
            "a",
            "changes",
            change.as_str(),
            "revisions",
            patch_set.as_str(),
            "checks",
            "",
        ])?;

        let body = self.post(url, &CheckInput::from(update)).await?;
        let info: CheckInfo = wire::decode(&body)?;
        debug!(state = %info.state, checker = %info.checker_uuid, "check posted");
        Ok(())
    }

    #[instrument(skip_all, fields(change = %item.change_number, style = ?self.settings.lock))]
    async fn post_lock(&self, item: &PendingSubmitItem) -> Result<(), ReviewError> {
        match self.settings.lock {
            LockStyle::Label => {
                let revision = item.revision_number.to_string();
                let url = self.change_endpoint(
                    &item.change_id,
                    &["revisions", revision.as_str(), "review"],
                )?;
                let input = ReviewInput {
                    labels: BTreeMap::from([(self.settings.lock_label.as_str(), LOCK_VOTE)]),
                };
                self.post(url, &input).await?;
            }
            LockStyle::Hashtag => {
                let url = self.change_endpoint(&item.change_id, &["hashtags"])?;
                let input = HashtagsInput {
                    add: vec![self.settings.lock_hashtag.as_str()],
                };
                self.post(url, &input).await?;
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_checkers(&self) -> Result<Vec<CheckerInfo>, ReviewError> {
        let url = self.endpoint(&["a", "plugins", "checks", "checkers", ""])?;
        let body = self.get(url, &[]).await?;

        let checkers: Vec<CheckerInfoWire> = wire::decode(&body)?;
        Ok(checkers
            .into_iter()
            .filter_map(CheckerInfoWire::into_info)
            .collect())
    }

    #[instrument(skip(self, registration), fields(checker = %registration.uuid))]
    async fn register_checker(
        &self,
        registration: &CheckerRegistration,
        update: bool,
    ) -> Result<CheckerInfo, ReviewError> {
        let url = if update {
            self.endpoint(&["a", "plugins", "checks", "checkers", registration.uuid.as_str()])?
        } else {
            self.endpoint(&["a", "plugins", "checks", "checkers", ""])?
        };

        let body = self.post(url, &CheckerInput::from(registration)).await?;
        let checker: CheckerInfoWire = wire::decode(&body)?;
        checker.into_info().ok_or_else(|| ReviewError::Decode {
            message: "registered checker has no uuid".to_string(),
        })
    }
}
