//! Checker registry operations.
//!
//! Checkers are registered on the review service under a deterministic UUID
//! (see [`IdentityCodec::encode`]), so registering the same repository and
//! prefix twice addresses the same checker.

use checks::{
    CheckerInfo, CheckerRegistration, CheckerUuid, IdentityCodec, RepositoryName, ReviewError,
    ReviewService,
};
use tracing::{debug, info, instrument};

/// Query attached to every registered checker.
pub const CHECKER_QUERY: &str = "status:open";

/// Lists the checkers owned by the codec's scheme.
///
/// Checkers of other schemes, and owned-looking UUIDs that do not decode,
/// are left out.
#[instrument(skip_all, fields(scheme = %codec.scheme()))]
pub async fn list_owned(
    review: &dyn ReviewService,
    codec: &IdentityCodec,
) -> Result<Vec<CheckerInfo>, ReviewError> {
    let all = review.list_checkers().await?;
    let total = all.len();
    let owned: Vec<CheckerInfo> = all
        .into_iter()
        .filter(|checker| codec.owns(checker.uuid.as_str()))
        .collect();
    debug!(total, owned = owned.len(), "listed checkers");
    Ok(owned)
}

/// Builds the registration for `prefix` on `repository`.
pub fn registration_for(
    codec: &IdentityCodec,
    repository: &RepositoryName,
    prefix: &str,
    blocking: bool,
) -> CheckerRegistration {
    CheckerRegistration {
        uuid: codec.encode(repository, prefix).uuid(),
        name: prefix.to_string(),
        description: format!("{prefix} checks for {repository}"),
        repository: repository.clone(),
        blocking,
        query: CHECKER_QUERY.to_string(),
    }
}

/// Creates the checker for `prefix` on `repository`, or updates it in place
/// when `update` is set.
#[instrument(skip(review, codec), fields(scheme = %codec.scheme()))]
pub async fn register(
    review: &dyn ReviewService,
    codec: &IdentityCodec,
    repository: &RepositoryName,
    prefix: &str,
    update: bool,
    blocking: bool,
) -> Result<CheckerInfo, ReviewError> {
    let registration = registration_for(codec, repository, prefix, blocking);
    let info = review.register_checker(&registration, update).await?;
    info!(checker = %info.uuid, update, "checker registered");
    Ok(info)
}

/// Picks the first checker in `checkers` owned by the codec's scheme whose
/// repository is `project`.
pub fn find_for_repository(
    checkers: &[CheckerInfo],
    codec: &IdentityCodec,
    project: &RepositoryName,
) -> Option<CheckerUuid> {
    checkers
        .iter()
        .find(|checker| {
            checker.repository == project.as_str() && codec.owns(checker.uuid.as_str())
        })
        .map(|checker| checker.uuid.clone())
}
