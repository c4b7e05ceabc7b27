//! Dispatch pacing for the scan phase.
//!
//! Spaces successive probe dispatches by a fixed gap so a large target set
//! does not open thousands of connections in the same instant.

use governor::{Quota, RateLimiter as GovLimiter};
use std::sync::Arc;
use std::time::Duration;

type DirectLimiter = GovLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Lets one dispatch through per `gap`, with no burst allowance.
pub struct DispatchPacer {
    limiter: Arc<DirectLimiter>,
}

impl DispatchPacer {
    /// Create a pacer releasing one dispatch per `gap`.
    ///
    /// Returns `None` for a zero gap, meaning dispatch is not paced.
    pub fn new(gap: Duration) -> Option<Self> {
        let quota = Quota::with_period(gap)?;
        Some(Self {
            limiter: Arc::new(GovLimiter::direct(quota)),
        })
    }

    /// Wait until the next dispatch is allowed.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl Clone for DispatchPacer {
    fn clone(&self) -> Self {
        Self {
            limiter: Arc::clone(&self.limiter),
        }
    }
}
