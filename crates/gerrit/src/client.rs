//! HTTP plumbing for the Gerrit REST API.

use std::time::Duration;

use checks::{ChangeId, ReviewError};
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::auth::BasicAuth;
use crate::wire;

const USER_AGENT: &str = concat!("review-pipeline-connector/", env!("CARGO_PKG_VERSION"));

/// Failures building a [`GerritClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{url} cannot be used as a base URL")]
    InvalidBaseUrl { url: Url },

    #[error("building HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// How a change is marked as taken by the merge pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockStyle {
    /// Vote `+1` on the lock label.
    Label,
    /// Add the lock hashtag.
    Hashtag,
}

/// Settings for [`GerritClient`].
#[derive(Debug, Clone)]
pub struct GerritSettings {
    /// Server root, e.g. `https://review.example.org/`.
    pub base_url: Url,
    /// How submissions are locked.
    pub lock: LockStyle,
    /// Label voted by [`LockStyle::Label`]. An approval on it marks a change
    /// as locked whatever the style.
    pub lock_label: String,
    /// Hashtag added by [`LockStyle::Hashtag`]. Its presence marks a change
    /// as locked whatever the style.
    pub lock_hashtag: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

/// A Gerrit REST client. Implements [`checks::ReviewService`].
#[derive(Debug, Clone)]
pub struct GerritClient {
    http: Client,
    base: Url,
    auth: Option<BasicAuth>,
    pub(crate) settings: GerritSettings,
}

impl GerritClient {
    pub fn new(settings: GerritSettings, auth: Option<BasicAuth>) -> Result<Self, ClientError> {
        let mut base = settings.base_url.clone();
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl { url: base });
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self {
            http,
            base,
            auth,
            settings,
        })
    }

    /// The normalised server root (always ending in `/`).
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Issues `GET a/accounts/self`, failing fast on bad credentials.
    pub async fn ping(&self) -> Result<(), ReviewError> {
        let url = self.endpoint(&["a", "accounts", "self"])?;
        let body = self.get(url, &[]).await?;
        wire::decode::<serde_json::Value>(&body)?;
        Ok(())
    }

    /// Builds an endpoint URL from path segments. Each segment is
    /// percent-encoded on its own; an empty last segment yields a trailing
    /// `/`.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ReviewError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| self.not_a_base())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Builds `a/changes/{change}/{rest..}`. The change id is already
    /// URL-encoded by Gerrit and is spliced in as is; `rest` is encoded
    /// segment by segment.
    pub(crate) fn change_endpoint(
        &self,
        change: &ChangeId,
        rest: &[&str],
    ) -> Result<Url, ReviewError> {
        let mut url = self.endpoint(&["a", "changes"])?;
        let path = format!("{}/{}", url.path(), change);
        url.set_path(&path);
        url.path_segments_mut()
            .map_err(|()| self.not_a_base())?
            .extend(rest);
        Ok(url)
    }

    fn not_a_base(&self) -> ReviewError {
        ReviewError::Transport {
            url: self.base.to_string(),
            message: "not a base URL".to_string(),
        }
    }

    pub(crate) async fn get(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<Vec<u8>, ReviewError> {
        let request = self.http.get(url.clone()).query(query);
        self.send(url, request).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<Vec<u8>, ReviewError> {
        let request = self.http.post(url.clone()).json(body);
        self.send(url, request).await
    }

    async fn send(&self, url: Url, request: RequestBuilder) -> Result<Vec<u8>, ReviewError> {
        let request = match &self.auth {
            Some(auth) => request.basic_auth(auth.user(), Some(auth.password())),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|err| transport(&url, &err))?;
        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "gerrit response");
        if !status.is_success() {
            return Err(ReviewError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| transport(&url, &err))?;
        Ok(body.to_vec())
    }
}

fn transport(url: &Url, err: &reqwest::Error) -> ReviewError {
    ReviewError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}
