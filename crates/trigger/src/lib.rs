//! Pipeline trigger adapter.
//!
//! [`WebhookTrigger`] implements [`checks::PipelineTrigger`] by posting a
//! JSON payload to a webhook, with the intent in the `X-Jarvis` header:
//!
//! | Intent | `X-Jarvis` | `patchSetNumber` |
//! |--------|------------|------------------|
//! | check run | `create` | number |
//! | merge | `merge` | string |
//!
//! `changeNumber` is always a string and `checkerUUID` is empty when no
//! checker was resolved.

pub mod client;
pub mod wire;

pub use client::{WebhookTrigger, INTENT_HEADER};
pub use wire::{parse_ack, TriggerPayload, SUBMITTED_MESSAGE};
