//! Core domain for the review-to-pipeline connector.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and error type used by the connector, together with the port traits
//! the dispatch engine calls. Infrastructure crates implement the traits
//! defined here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; `gerrit` and `trigger` define *how* to supply
//! it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ChangeNumber`, `CheckerUuid`, etc.) |
//! | [`identity`] | Checker identity codec (`scheme:prefix-digest`) |
//! | [`types`] | Pending work, status reports, trigger messages |
//! | [`errors`] | Port error types |
//! | [`ports`] | `ReviewService` and `PipelineTrigger` traits |

pub mod errors;
pub mod identifiers;
pub mod identity;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{ReviewError, TriggerError, BODY_SNIPPET_LEN};
pub use identifiers::{ChangeId, ChangeNumber, CheckerUuid, PatchSetId, RepositoryName, Scheme};
pub use identity::{CheckerIdentity, IdentityCodec, DIGEST_SEPARATOR, SCHEME_SEPARATOR};
pub use ports::{PipelineTrigger, ReviewService};
pub use types::{
    CheckStatus, CheckerInfo, CheckerRegistration, PendingCheckItem, PendingSubmitItem,
    StatusUpdate, Timestamp, TriggerAck, TriggerIntent, TriggerRequest,
};
