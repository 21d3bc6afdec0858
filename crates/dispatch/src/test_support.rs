//! In-memory fakes of the two ports, recording every call.

use std::collections::{BTreeSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use checks::{
    ChangeId, ChangeNumber, CheckStatus, CheckerInfo, CheckerRegistration, CheckerUuid,
    PatchSetId, PendingCheckItem, PendingSubmitItem, PipelineTrigger, RepositoryName,
    ReviewError, ReviewService, Scheme, StatusUpdate, TriggerAck, TriggerError, TriggerIntent,
    TriggerRequest,
};

// ─── Builders ───

pub fn scheme() -> Scheme {
    Scheme::new("jarvis").unwrap()
}

pub fn repo(name: &str) -> RepositoryName {
    RepositoryName::new(name).unwrap()
}

pub fn uuid(value: &str) -> CheckerUuid {
    CheckerUuid::new(value).unwrap()
}

pub fn check_item(uuids: &[&str]) -> PendingCheckItem {
    PendingCheckItem {
        repository: repo("airship/treasuremap"),
        change_number: ChangeNumber::new(1234),
        patch_set_id: PatchSetId::new(2),
        checker_uuids: uuids.iter().map(|u| uuid(u)).collect::<BTreeSet<_>>(),
    }
}

pub fn submit_item(change: u64) -> PendingSubmitItem {
    PendingSubmitItem {
        change_id: ChangeId::new(format!("airship%2Ftreasuremap~master~I{change:040}")).unwrap(),
        project: repo("airship/treasuremap"),
        change_number: ChangeNumber::new(change),
        current_revision_ref: format!("refs/changes/{:02}/{change}/4", change % 100),
        revision_number: PatchSetId::new(4),
        mergeable: true,
        submittable: true,
        lock_label_approved: false,
        lock_hashtag_present: false,
    }
}

pub fn checker(uuid_value: &str, repository: &str) -> CheckerInfo {
    CheckerInfo {
        uuid: uuid(uuid_value),
        name: "lint".to_string(),
        description: String::new(),
        repository: repository.to_string(),
        status: "ENABLED".to_string(),
        blocking: Vec::new(),
        query: Some("status:open".to_string()),
    }
}

pub fn ack(messages: &[&str]) -> TriggerAck {
    TriggerAck {
        messages: messages.iter().map(|m| m.to_string()).collect(),
        details_url: None,
    }
}

pub fn unavailable() -> ReviewError {
    ReviewError::Status {
        url: "https://review.example.org/a/".to_string(),
        status: 503,
    }
}

// ─── Review service ───

/// A call observed by [`FakeReview`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewCall {
    PendingChecks,
    PendingSubmissions,
    Status {
        change: ChangeNumber,
        patch_set: PatchSetId,
        update: StatusUpdate,
    },
    Lock(ChangeNumber),
    ListCheckers,
    Register { uuid: CheckerUuid, update: bool },
}

#[derive(Debug, Default)]
struct ReviewState {
    pending_checks: Option<Result<Vec<PendingCheckItem>, ReviewError>>,
    pending_submissions: Option<Result<Vec<PendingSubmitItem>, ReviewError>>,
    checkers: Option<Result<Vec<CheckerInfo>, ReviewError>>,
    failing_statuses: Vec<CheckStatus>,
    lock_error: Option<ReviewError>,
    calls: Vec<ReviewCall>,
}

/// A scripted review service.
#[derive(Debug, Default)]
pub struct FakeReview {
    state: Mutex<ReviewState>,
}

impl FakeReview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pending_checks(self, result: Result<Vec<PendingCheckItem>, ReviewError>) -> Self {
        self.state.lock().unwrap().pending_checks = Some(result);
        self
    }

    pub fn with_pending_submissions(
        self,
        result: Result<Vec<PendingSubmitItem>, ReviewError>,
    ) -> Self {
        self.state.lock().unwrap().pending_submissions = Some(result);
        self
    }

    pub fn with_checkers(self, result: Result<Vec<CheckerInfo>, ReviewError>) -> Self {
        self.state.lock().unwrap().checkers = Some(result);
        self
    }

    /// Makes every status post carrying `status` fail.
    pub fn failing_status(self, status: CheckStatus) -> Self {
        self.state.lock().unwrap().failing_statuses.push(status);
        self
    }

    pub fn failing_lock(self, error: ReviewError) -> Self {
        self.state.lock().unwrap().lock_error = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<ReviewCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// The status updates posted so far, in order.
    pub fn posted(&self) -> Vec<StatusUpdate> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ReviewCall::Status { update, .. } => Some(update),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ReviewCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl ReviewService for FakeReview {
    async fn pending_checks(&self, _scheme: &Scheme) -> Result<Vec<PendingCheckItem>, ReviewError> {
        self.record(ReviewCall::PendingChecks);
        self.state
            .lock()
            .unwrap()
            .pending_checks
            .clone()
            .unwrap_or(Ok(Vec::new()))
    }

    async fn pending_submissions(&self) -> Result<Vec<PendingSubmitItem>, ReviewError> {
        self.record(ReviewCall::PendingSubmissions);
        self.state
            .lock()
            .unwrap()
            .pending_submissions
            .clone()
            .unwrap_or(Ok(Vec::new()))
    }

    async fn post_check_status(
        &self,
        change: ChangeNumber,
        patch_set: PatchSetId,
        update: &StatusUpdate,
    ) -> Result<(), ReviewError> {
        self.record(ReviewCall::Status {
            change,
            patch_set,
            update: update.clone(),
        });
        if self
            .state
            .lock()
            .unwrap()
            .failing_statuses
            .contains(&update.status)
        {
            return Err(unavailable());
        }
        Ok(())
    }

    async fn post_lock(&self, item: &PendingSubmitItem) -> Result<(), ReviewError> {
        self.record(ReviewCall::Lock(item.change_number));
        match self.state.lock().unwrap().lock_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn list_checkers(&self) -> Result<Vec<CheckerInfo>, ReviewError> {
        self.record(ReviewCall::ListCheckers);
        self.state
            .lock()
            .unwrap()
            .checkers
            .clone()
            .unwrap_or(Ok(Vec::new()))
    }

    async fn register_checker(
        &self,
        registration: &CheckerRegistration,
        update: bool,
    ) -> Result<CheckerInfo, ReviewError> {
        self.record(ReviewCall::Register {
            uuid: registration.uuid.clone(),
            update,
        });
        Ok(CheckerInfo {
            uuid: registration.uuid.clone(),
            name: registration.name.clone(),
            description: registration.description.clone(),
            repository: registration.repository.to_string(),
            status: "ENABLED".to_string(),
            blocking: Vec::new(),
            query: Some(registration.query.clone()),
        })
    }
}

// ─── Pipeline trigger ───

/// A scripted pipeline trigger. Responses are consumed in order; once they
/// run out, every call succeeds with a single "ok" message.
#[derive(Debug, Default)]
pub struct FakeTrigger {
    responses: Mutex<VecDeque<Result<TriggerAck, TriggerError>>>,
    hang: bool,
    requests: Mutex<Vec<(TriggerIntent, TriggerRequest)>>,
}

impl FakeTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, response: Result<TriggerAck, TriggerError>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Never answers.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<(TriggerIntent, TriggerRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PipelineTrigger for FakeTrigger {
    async fn trigger(
        &self,
        intent: TriggerIntent,
        request: &TriggerRequest,
    ) -> Result<TriggerAck, TriggerError> {
        self.requests
            .lock()
            .unwrap()
            .push((intent, request.clone()));
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ack(&["ok"])))
    }
}
