//! Validation phase: expand address specifications into candidates.
//!
//! Every distinct specification is expanded on its own task. Expansions are
//! merged after a join barrier, deduplicated and sorted.

use crate::types::{HostResolver, TargetError, TargetSpec};
use futures::future::join_all;
use std::collections::{BTreeSet, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Outcome of a validation phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Deduplicated candidate addresses, sorted by value.
    pub candidates: Vec<IpAddr>,
    /// Addresses produced before deduplication.
    pub total_raw: usize,
    /// Rejected specifications plus duplicate addresses.
    pub ignored: usize,
    /// Wall time of the phase.
    pub elapsed: Duration,
}

/// Shared state for one validation phase.
struct ValidationContext {
    pending: mpsc::UnboundedSender<Vec<IpAddr>>,
    rejected: AtomicUsize,
}

impl ValidationContext {
    fn accept(&self, addresses: Vec<IpAddr>) {
        // Receiver is held by the pool until the barrier.
        let _ = self.pending.send(addresses);
    }

    fn reject(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }
}

/// Expands specifications concurrently.
#[derive(Clone)]
pub struct ValidationPool {
    resolver: Arc<dyn HostResolver>,
}

impl ValidationPool {
    /// Create a pool resolving hostnames through `resolver`.
    pub fn new(resolver: Arc<dyn HostResolver>) -> Self {
        Self { resolver }
    }

    /// Expand all `specs` and merge the results.
    ///
    /// Never fails: unusable specifications only raise the ignored count.
    pub async fn run<S: AsRef<str>>(&self, specs: &[S]) -> ValidationReport {
        let start = Instant::now();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = Arc::new(ValidationContext {
            pending: tx,
            rejected: AtomicUsize::new(0),
        });

        let mut seen = HashSet::new();
        let distinct: Vec<String> = specs
            .iter()
            .map(|s| s.as_ref().to_string())
            .filter(|s| seen.insert(s.clone()))
            .collect();

        let tasks = distinct.into_iter().map(|raw| {
            let ctx = Arc::clone(&ctx);
            let resolver = Arc::clone(&self.resolver);
            tokio::spawn(async move { expand_one(&raw, resolver.as_ref(), &ctx).await })
        });

        for joined in join_all(tasks).await {
            if let Err(e) = joined {
                debug!("validation task failed: {}", e);
                ctx.reject();
            }
        }

        let rejected = ctx.rejected.load(Ordering::Relaxed);
        drop(ctx);

        let mut total_raw = 0;
        let mut unique = BTreeSet::new();
        while let Some(batch) = rx.recv().await {
            total_raw += batch.len();
            unique.extend(batch);
        }

        let candidates: Vec<IpAddr> = unique.into_iter().collect();
        let report = ValidationReport {
            ignored: rejected + (total_raw - candidates.len()),
            total_raw,
            candidates,
            elapsed: start.elapsed(),
        };

        info!(
            "validated {} candidates ({} raw, {} ignored) in {:?}",
            report.candidates.len(),
            report.total_raw,
            report.ignored,
            report.elapsed
        );
        report
    }
}

/// Expansions larger than this run on the blocking pool.
const BLOCKING_EXPANSION: u128 = 4096;

async fn expand_one(raw: &str, resolver: &dyn HostResolver, ctx: &ValidationContext) {
    let expanded = match TargetSpec::parse(raw) {
        Ok(spec) => match spec.address_count() {
            Some(count) if count > BLOCKING_EXPANSION => {
                debug!("{:?} expands to {} addresses", raw, count);
                tokio::task::spawn_blocking(move || spec.expand_local())
                    .await
                    .unwrap_or_else(|e| Err(TargetError::InvalidFormat(format!("{}: {}", raw, e))))
            }
            _ => spec.expand(resolver).await,
        },
        Err(e) => Err(e),
    };

    match expanded {
        Ok(addresses) => {
            debug!("{:?} -> {} address(es)", raw, addresses.len());
            ctx.accept(addresses);
        }
        Err(e) => {
            debug!("ignoring {:?}: {}", raw, e);
            ctx.reject();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StaticResolver;

    fn pool() -> ValidationPool {
        ValidationPool::new(Arc::new(StaticResolver::new([(
            "kms.example.net",
            vec!["10.0.0.2".parse().unwrap(), "10.0.0.9".parse().unwrap()],
        )])))
    }

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_single_and_cidr() {
        let report = pool().run(&["10.0.0.0/30", "198.51.100.7"]).await;
        assert_eq!(report.candidates.len(), 5);
        assert_eq!(report.total_raw, 5);
        assert_eq!(report.ignored, 0);
        assert_eq!(report.candidates[0], ip("10.0.0.0"));
        assert_eq!(report.candidates[4], ip("198.51.100.7"));
    }

    #[tokio::test]
    async fn test_overlap_counts_duplicates_as_ignored() {
        let report = pool()
            .run(&["10.0.0.0/30", "10.0.0.2-10.0.0.5", "kms.example.net"])
            .await;

        // 4 + 4 + 2 raw, 10.0.0.0..=10.0.0.5 plus 10.0.0.9 unique.
        assert_eq!(report.total_raw, 10);
        assert_eq!(report.candidates.len(), 7);
        assert_eq!(report.ignored, 3);
    }

    #[tokio::test]
    async fn test_invalid_specs_are_ignored_not_fatal() {
        let report = pool()
            .run(&["", "10.0.0.1/33", "not a host!", "unknown.example.net", "10.0.0.1"])
            .await;
        assert_eq!(report.candidates, vec![ip("10.0.0.1")]);
        assert_eq!(report.ignored, 4);
    }

    #[tokio::test]
    async fn test_duplicate_spec_strings_dispatched_once() {
        let report = pool().run(&["10.0.0.1", "10.0.0.1", "10.0.0.1"]).await;
        assert_eq!(report.total_raw, 1);
        assert_eq!(report.ignored, 0);
    }

    #[tokio::test]
    async fn test_large_block_expands_off_the_async_workers() {
        let report = pool().run(&["10.0.0.0/19", "10.0.0.0/24", "2001:db8::/64"]).await;
        assert_eq!(report.candidates.len(), 8192);
        assert_eq!(report.total_raw, 8192 + 256);
        // The IPv6 /64 is over the expansion cap.
        assert_eq!(report.ignored, 256 + 1);
        assert_eq!(report.candidates[8191], ip("10.0.31.255"));
    }

    #[tokio::test]
    async fn test_lenient_range_right_side() {
        let report = pool().run(&["10.0.0.5-garbage"]).await;
        assert_eq!(report.candidates, vec![ip("10.0.0.5")]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let specs: [&str; 0] = [];
        let report = pool().run(&specs).await;
        assert!(report.candidates.is_empty());
        assert_eq!(report.ignored, 0);
    }
}
