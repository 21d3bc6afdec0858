//! Pending-work dispatch engine.
//!
//! A single poller queries the review service on a fixed interval and feeds
//! two bounded queues, each drained by its own worker:
//!
//! ```text
//!                 ┌──► checks queue ──────► check worker ──► CheckExecutor
//! ReviewService ──┤
//!    (poll)       └──► submissions queue ─► submission worker ──► SubmissionExecutor
//! ```
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The engine sequences calls through the
//! [`checks::ReviewService`] and [`checks::PipelineTrigger`] ports. It owns the
//! concurrency model (queues, workers, per-call timeouts, shutdown) but does
//! no I/O of its own.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`config`] | Poll interval, queue capacities, call timeout |
//! | [`queue`] | Bounded queues with drop-on-full |
//! | [`poll`] | The poll loop and per-tick summaries |
//! | [`check`] | Check state machine (`RUNNING` then a terminal status) |
//! | [`submit`] | Eligibility, lock, checker resolution, merge trigger |
//! | [`registry`] | Listing and registering checkers |
//! | [`worker`] | Queue consumers |
//! | [`engine`] | [`Connector`], which runs all of the above |

pub mod check;
pub mod config;
pub mod engine;
pub mod poll;
pub mod queue;
pub mod registry;
pub mod submit;
pub mod worker;

#[cfg(test)]
mod test_support;

pub use check::{truncate_message, terminal_status, CheckError, CheckExecutor, CheckVerdict};
pub use config::{
    DispatchConfig, DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_QUEUE_CAPACITY,
};
pub use engine::Connector;
pub use poll::{HalfSummary, PollSummary, Poller};
pub use queue::{work_queue, Offer, WorkReceiver, WorkSender};
pub use registry::{find_for_repository, list_owned, register, registration_for};
pub use submit::{is_eligible, SubmissionExecutor, SubmitOutcome};
pub use worker::{run_check_worker, run_submission_worker};
