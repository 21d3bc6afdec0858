//! The poll loop.
//!
//! Every poll interval the poller queries the review service for
//! pending checks (scoped to the scheme) and pending submissions, and offers
//! what it finds to the two work queues. The two halves are independent: a
//! failure to fetch one does not prevent the other from running.
//!
//! The interval is fixed. There is no jitter and no backoff; whatever a
//! tick fails to deliver is re-discovered by the next one.

use std::sync::Arc;
use std::time::Duration;

use checks::{
    IdentityCodec, PendingCheckItem, PendingSubmitItem, ReviewError, ReviewService,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::bounded;
use crate::queue::{Offer, WorkSender};
use crate::submit::is_eligible;

/// Counts for one half of a poll tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HalfSummary {
    /// Items returned by the review service.
    pub found: usize,
    /// Items accepted by the queue.
    pub queued: usize,
    /// Items dropped because the queue was full or closed.
    pub dropped: usize,
    /// Submissions filtered out before queueing.
    pub ineligible: usize,
    /// The fetch failure, if the half was skipped.
    pub error: Option<ReviewError>,
}

impl HalfSummary {
    fn failed(error: ReviewError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    fn record(&mut self, offer: Offer) {
        match offer {
            Offer::Queued => self.queued += 1,
            Offer::Dropped | Offer::Closed => self.dropped += 1,
        }
    }
}

/// The outcome of a single poll tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSummary {
    /// Random id correlating the log events of this tick.
    pub cycle: Uuid,
    /// The pending-checks half.
    pub checks: HalfSummary,
    /// The pending-submissions half.
    pub submissions: HalfSummary,
}

/// Feeds the work queues from the review service.
pub struct Poller {
    review: Arc<dyn ReviewService>,
    codec: IdentityCodec,
    checks: WorkSender<PendingCheckItem>,
    submissions: WorkSender<PendingSubmitItem>,
    interval: Duration,
    call_timeout: Duration,
}

impl Poller {
    /// `interval` is the fixed pause before every tick; `call_timeout`
    /// bounds each review-service query.
    pub fn new(
        review: Arc<dyn ReviewService>,
        codec: IdentityCodec,
        checks: WorkSender<PendingCheckItem>,
        submissions: WorkSender<PendingSubmitItem>,
        interval: Duration,
        call_timeout: Duration,
    ) -> Self {
        Self {
            review,
            codec,
            checks,
            submissions,
            interval,
            call_timeout,
        }
    }

    /// Sleeps, then ticks, until `shutdown` is cancelled.
    ///
    /// Consuming the poller drops both queue senders on return, which lets
    /// the workers drain and exit.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval = ?self.interval, scheme = %self.codec.scheme(), "poller started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
            self.tick().await;
        }
        info!("poller stopped");
    }

    /// Runs one poll: fetch and enqueue checks, then submissions.
    pub async fn tick(&self) -> PollSummary {
        let cycle = Uuid::new_v4();
        let span = info_span!("poll", cycle = %cycle);

        async {
            let checks = self.poll_checks().await;
            let submissions = self.poll_submissions().await;
            info!(
                checks_queued = checks.queued,
                checks_dropped = checks.dropped,
                submissions_queued = submissions.queued,
                submissions_dropped = submissions.dropped,
                submissions_ineligible = submissions.ineligible,
                "poll complete",
            );
            PollSummary {
                cycle,
                checks,
                submissions,
            }
        }
        .instrument(span)
        .await
    }

    async fn poll_checks(&self) -> HalfSummary {
        let fetched = bounded(
            self.call_timeout,
            self.review.pending_checks(self.codec.scheme()),
            |after| ReviewError::Timeout {
                operation: "pending_checks",
                after,
            },
        )
        .await;

        let items = match fetched {
            Ok(items) => items,
            Err(err) => {
                warn!(queue = self.checks.name(), error = %err, "failed to fetch pending checks");
                return HalfSummary::failed(err);
            }
        };
        if items.is_empty() {
            debug!("no pending checks");
        }

        let mut summary = HalfSummary {
            found: items.len(),
            ..HalfSummary::default()
        };
        for item in items {
            summary.record(self.checks.offer(item));
        }
        summary
    }

    async fn poll_submissions(&self) -> HalfSummary {
        let fetched = bounded(
            self.call_timeout,
            self.review.pending_submissions(),
            |after| ReviewError::Timeout {
                operation: "pending_submissions",
                after,
            },
        )
        .await;

        let items = match fetched {
            Ok(items) => items,
            Err(err) => {
                warn!(
                    queue = self.submissions.name(),
                    error = %err,
                    "failed to fetch pending submissions",
                );
                return HalfSummary::failed(err);
            }
        };

        let mut summary = HalfSummary {
            found: items.len(),
            ..HalfSummary::default()
        };
        for item in items {
            if !is_eligible(&item) {
                summary.ineligible += 1;
                continue;
            }
            summary.record(self.submissions.offer(item));
        }
        summary
    }
}
