//! Webhook payloads and response interpretation.

use checks::{TriggerAck, TriggerError, TriggerIntent, TriggerRequest};
use serde::{Deserialize, Serialize};

/// Acknowledgement used when the endpoint does not report its own messages.
pub const SUBMITTED_MESSAGE: &str = "Job has been submitted to the pipeline";

/// `patchSetNumber` is a number for check runs and a string for merges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PatchSetNumber {
    Number(u64),
    Text(String),
}

/// Body posted to the pipeline webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerPayload<'a> {
    pub repo_root: &'a str,
    pub project: &'a str,
    pub change_number: String,
    pub patch_set_number: PatchSetNumber,
    #[serde(rename = "checkerUUID")]
    pub checker_uuid: &'a str,
}

impl<'a> TriggerPayload<'a> {
    pub fn new(intent: TriggerIntent, request: &'a TriggerRequest) -> Self {
        let patch_set = request.patch_set.as_u64();
        TriggerPayload {
            repo_root: &request.repo_root,
            project: request.project.as_str(),
            change_number: request.change_number.to_string(),
            patch_set_number: match intent {
                TriggerIntent::Create => PatchSetNumber::Number(patch_set),
                TriggerIntent::Merge => PatchSetNumber::Text(patch_set.to_string()),
            },
            checker_uuid: request
                .checker_uuid
                .as_ref()
                .map(|uuid| uuid.as_str())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBody {
    #[serde(default)]
    messages: Option<Vec<String>>,
    #[serde(default)]
    details_url: Option<String>,
    #[serde(default)]
    irrelevant: bool,
    #[serde(default, rename = "eventID")]
    event_id: Option<String>,
}

/// Interprets a 2xx response body.
///
/// A body with `irrelevant: true` is the not-applicable sentinel. A body
/// carrying `messages` is taken as is, even when the list is empty. A body
/// that is not a JSON object is a plain receipt and yields
/// [`SUBMITTED_MESSAGE`]. A JSON object of the wrong shape is
/// [`TriggerError::Decode`].
pub fn parse_ack(body: &[u8]) -> Result<TriggerAck, TriggerError> {
    let value = match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) if value.is_object() => value,
        _ => {
            return Ok(TriggerAck {
                messages: vec![SUBMITTED_MESSAGE.to_string()],
                details_url: None,
            })
        }
    };

    let parsed: ResponseBody =
        serde_json::from_value(value).map_err(|err| TriggerError::Decode {
            message: err.to_string(),
        })?;
    if parsed.irrelevant {
        return Err(TriggerError::Irrelevant);
    }

    let messages = match (parsed.messages, parsed.event_id) {
        (Some(messages), _) => messages,
        (None, Some(event)) => vec![format!("{SUBMITTED_MESSAGE} (event {event})")],
        (None, None) => vec![SUBMITTED_MESSAGE.to_string()],
    };
    Ok(TriggerAck {
        messages,
        details_url: parsed.details_url,
    })
}
