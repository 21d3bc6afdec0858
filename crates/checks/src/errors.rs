//! Error types for the connector domain.
//!
//! [`ReviewError`] and [`TriggerError`] are the failure vocabulary of the two
//! port traits; adapters map their transport-specific failures onto these
//! variants so the dispatch engine can apply its per-call-site policy without
//! knowing which HTTP library sits underneath.
//!
//! | Category | Examples | Policy |
//! |----------|----------|--------|
//! | Transport | connection refused, non-2xx, timeout | logged; call site decides |
//! | Protocol | missing JSON prefix, undecodable body | aborts the current item |
//! | Capacity | queue full | drop + warn (never an error value) |
//! | Configuration | missing flag | fatal at startup (binary only) |

use std::time::Duration;

use thiserror::Error;

/// Number of body bytes kept for diagnostics when a response is not valid.
pub const BODY_SNIPPET_LEN: usize = 100;

/// Failures of the review service port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    /// The request could not be delivered or no response was received.
    #[error("Review service request to {url} failed: {message}")]
    Transport {
        /// Request URL.
        url: String,
        /// Description of the transport failure.
        message: String,
    },

    /// The review service answered with a non-success status.
    #[error("Review service request to {url} returned status {status}")]
    Status {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The response body did not start with the anti-hijack marker.
    #[error("Prefix {expected:?} not found, got {snippet}")]
    MissingJsonPrefix {
        /// The marker that was expected.
        expected: String,
        /// The first bytes of the body, for diagnostics.
        snippet: String,
    },

    /// The response body could not be decoded.
    #[error("Could not decode review service response: {message}")]
    Decode {
        /// Decoder error message.
        message: String,
    },

    /// The call did not complete within the configured bound.
    #[error("Review service call '{operation}' timed out after {after:?}")]
    Timeout {
        /// The port operation that timed out.
        operation: &'static str,
        /// The bound that elapsed.
        after: Duration,
    },
}

impl ReviewError {
    /// Builds a [`ReviewError::MissingJsonPrefix`] from the offending body,
    /// keeping at most [`BODY_SNIPPET_LEN`] bytes.
    pub fn missing_prefix(expected: &[u8], body: &[u8]) -> Self {
        let end = body.len().min(BODY_SNIPPET_LEN);
        Self::MissingJsonPrefix {
            expected: String::from_utf8_lossy(expected).into_owned(),
            snippet: String::from_utf8_lossy(&body[..end]).into_owned(),
        }
    }

    /// Returns `true` for failures of the exchange itself (as opposed to a
    /// response the connector could not understand).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ReviewError::Transport { .. } | ReviewError::Status { .. } | ReviewError::Timeout { .. }
        )
    }
}

/// Failures of the pipeline trigger port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerError {
    /// The pipeline reported that the check does not apply to this change.
    ///
    /// This is a sentinel, not a failure: the check executor reports
    /// [`crate::CheckStatus::Irrelevant`] for it.
    #[error("irrelevant")]
    Irrelevant,

    /// The request could not be delivered or no response was received.
    #[error("Trigger request to {url} failed: {message}")]
    Transport {
        /// Endpoint URL.
        url: String,
        /// Description of the transport failure.
        message: String,
    },

    /// The endpoint answered with a non-success status.
    #[error("Trigger request to {url} returned status {status}")]
    Status {
        /// Endpoint URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The endpoint answered with a JSON object of the wrong shape.
    #[error("Trigger response could not be decoded: {message}")]
    Decode {
        /// Decoder error.
        message: String,
    },

    /// The call did not complete within the configured bound.
    #[error("Trigger call timed out after {after:?}")]
    Timeout {
        /// The bound that elapsed.
        after: Duration,
    },
}
