//! The webhook client.

use std::time::Duration;

use async_trait::async_trait;
use checks::{PipelineTrigger, TriggerAck, TriggerError, TriggerIntent, TriggerRequest};
use reqwest::{Client, Url};
use tracing::{debug, info, instrument};

use crate::wire::{parse_ack, TriggerPayload};

/// Header naming the trigger intent (`create` or `merge`).
pub const INTENT_HEADER: &str = "X-Jarvis";

/// Posts trigger requests to a pipeline webhook (e.g. an EventListener).
#[derive(Debug, Clone)]
pub struct WebhookTrigger {
    http: Client,
    endpoint: Url,
}

impl WebhookTrigger {
    pub fn new(endpoint: Url, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn transport(&self, err: &reqwest::Error) -> TriggerError {
        TriggerError::Transport {
            url: self.endpoint.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl PipelineTrigger for WebhookTrigger {
    #[instrument(
        skip(self, request),
        fields(
            intent = intent.as_str(),
            project = %request.project,
            change = %request.change_number,
            patchset = %request.patch_set,
        )
    )]
    async fn trigger(
        &self,
        intent: TriggerIntent,
        request: &TriggerRequest,
    ) -> Result<TriggerAck, TriggerError> {
        let payload = TriggerPayload::new(intent, request);
        debug!(?payload, "posting trigger");

        // `.json()` sets `Content-Type: application/json`.
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(INTENT_HEADER, intent.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(|err| self.transport(&err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TriggerError::Status {
                url: self.endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|err| self.transport(&err))?;
        let ack = parse_ack(&body)?;
        info!(messages = ack.messages.len(), "trigger accepted");
        Ok(ack)
    }
}
