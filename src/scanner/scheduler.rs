//! Scan phase: probe every (address, port) pair.
//!
//! Targets are built lazily from the cross product of candidates and ports.
//! Dispatch is paced and stops early when the phase token is cancelled. At
//! most `concurrency` probe tasks are held at once: finished tasks are reaped
//! before each dispatch, and dispatch waits for one to finish when the set is
//! full. Each probe gets its own deadline at dispatch.

use super::rate_limiter::DispatchPacer;
use super::sink::ResultSink;
use super::traits::{ProbeOutcome, ProbeState, Prober};
use crate::config::ProbeTiming;
use crate::error::ScanResult;
use crate::storage::ResultFile;
use crate::types::{PortList, ScanTarget};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Default bound on probes in flight.
pub const DEFAULT_CONCURRENCY: usize = 500;

/// How a scan phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    /// Every target was dispatched and joined.
    Completed,
    /// Dispatch stopped early; in-flight probes were still joined.
    Cancelled,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of one scan phase.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub status: ScanStatus,
    /// Size of the target set, candidates times ports.
    pub scheduled: u64,
    /// Probes actually started.
    pub dispatched: u64,
    /// Reachable endpoints in completion order.
    pub reachable: Vec<String>,
    /// Largest number of probe tasks held at once.
    pub peak_in_flight: usize,
    /// Scan phase wall time.
    pub elapsed: Duration,
}

/// Dispatch progress shared for one phase.
#[derive(Debug)]
pub struct ScanContext {
    total: u64,
    dispatched: AtomicU64,
    peak_in_flight: AtomicUsize,
}

impl ScanContext {
    fn new(total: u64) -> Self {
        Self {
            total,
            dispatched: AtomicU64::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    fn observe_in_flight(&self, held: usize) {
        self.peak_in_flight.fetch_max(held, Ordering::Relaxed);
    }

    /// Largest number of probe tasks held at once so far.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::Relaxed)
    }

    /// Count one dispatch, returning the new total.
    fn dispatch(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Probes dispatched so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Dispatched share of the target set, in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.dispatched() as f64 / self.total as f64
    }
}

/// Drives probes over the candidate set.
pub struct PortScanScheduler {
    prober: Arc<dyn Prober>,
    timing: ProbeTiming,
    concurrency: usize,
    show_progress: bool,
    cancel: CancellationToken,
    artifact: Option<ResultFile>,
}

impl PortScanScheduler {
    /// Create a scheduler dispatching to `prober`.
    pub fn new(prober: Arc<dyn Prober>, timing: ProbeTiming) -> Self {
        Self {
            prober,
            timing,
            concurrency: DEFAULT_CONCURRENCY,
            show_progress: false,
            cancel: CancellationToken::new(),
            artifact: None,
        }
    }

    /// Bound the number of probe tasks held at once. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Show a progress bar on stderr while dispatching.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Use `token` to stop dispatch early.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Overwrite `file` with the reachable endpoints once the phase joins.
    pub fn with_artifact(mut self, file: ResultFile) -> Self {
        self.artifact = Some(file);
        self
    }

    /// Probe every candidate on every port.
    ///
    /// Only fails if the result artifact cannot be written; outcomes collected
    /// before a cancellation are still exported.
    pub async fn run(&self, candidates: &[IpAddr], ports: &PortList) -> ScanResult<ScanSummary> {
        let total = candidates.len() as u64 * ports.len() as u64;
        let ctx = ScanContext::new(total);
        let pacer = DispatchPacer::new(self.timing.dispatch_gap());
        let progress = self.progress_bar(total);
        let deadline = self.timing.timeout() + self.timing.tick();

        info!(
            "scanning {} targets ({} addresses x {} ports), timeout {}ms, tick {}ms",
            total,
            candidates.len(),
            ports.len(),
            self.timing.timeout_ms(),
            self.timing.tick_ms()
        );

        let mut sink = ResultSink::new();
        let mut tasks = JoinSet::new();
        let mut status = ScanStatus::Completed;

        let targets = candidates
            .iter()
            .flat_map(|ip| ports.as_slice().iter().map(move |port| ScanTarget::new(*ip, *port)));

        'dispatch: for target in targets {
            if self.cancel.is_cancelled() {
                status = ScanStatus::Cancelled;
                break;
            }

            if let Some(ref pacer) = pacer {
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        status = ScanStatus::Cancelled;
                        break;
                    }
                    _ = pacer.wait() => {}
                }
            }

            while let Some(joined) = tasks.try_join_next() {
                log_join_error(joined);
            }
            while tasks.len() >= self.concurrency {
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        status = ScanStatus::Cancelled;
                        break 'dispatch;
                    }
                    joined = tasks.join_next() => {
                        if let Some(joined) = joined {
                            log_join_error(joined);
                        }
                    }
                }
            }

            let dispatched = ctx.dispatch();
            if let Some(ref pb) = progress {
                pb.set_position(dispatched);
            }
            trace!("dispatch {} ({:.1}%)", target, ctx.fraction() * 100.0);

            let prober = Arc::clone(&self.prober);
            let handle = sink.handle();
            tasks.spawn(async move {
                let outcome = match tokio::time::timeout(deadline, prober.probe(target)).await {
                    Ok(outcome) => outcome,
                    Err(_) => ProbeOutcome::new(target, ProbeState::TimedOut, deadline),
                };
                if outcome.reachable {
                    debug!("{} reachable in {:?}", target, outcome.elapsed);
                    handle.record(&outcome.target);
                }
            });
            ctx.observe_in_flight(tasks.len());
        }

        if status == ScanStatus::Cancelled {
            warn!(
                "scan cancelled after dispatching {} of {} targets ({} reachable so far)",
                ctx.dispatched(),
                total,
                sink.count()
            );
        }

        while let Some(joined) = tasks.join_next().await {
            log_join_error(joined);
        }

        sink.finish();
        if let Some(pb) = progress {
            pb.finish_with_message(match status {
                ScanStatus::Completed => "Scan complete",
                ScanStatus::Cancelled => "Scan cancelled",
            });
        }

        if let Some(ref file) = self.artifact {
            sink.export(file)?;
        }

        let elapsed = sink.elapsed();
        let summary = ScanSummary {
            status,
            scheduled: total,
            dispatched: ctx.dispatched(),
            reachable: sink.into_entries(),
            peak_in_flight: ctx.peak_in_flight(),
            elapsed,
        };

        info!(
            "scan {}: {} reachable of {} dispatched in {:?}",
            summary.status,
            summary.reachable.len(),
            summary.dispatched,
            summary.elapsed
        );
        Ok(summary)
    }

    fn progress_bar(&self, total: u64) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        ) {
            pb.set_style(style.progress_chars("=>-"));
        }
        Some(pb)
    }
}

fn log_join_error(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        debug!("probe task failed: {}", e);
    }
}
