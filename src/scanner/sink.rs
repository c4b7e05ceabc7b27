//! Reachable-endpoint collector.
//!
//! Probe tasks push `address:port` strings through cloneable [`SinkHandle`]s;
//! the [`ResultSink`] is the single consumer and drains them, in arrival
//! order, once the scan phase has joined.

use crate::error::StorageResult;
use crate::storage::ResultFile;
use crate::types::ScanTarget;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Producer side of a [`ResultSink`].
#[derive(Debug, Clone)]
pub struct SinkHandle {
    tx: mpsc::UnboundedSender<String>,
    count: Arc<AtomicUsize>,
}

impl SinkHandle {
    /// Record a reachable target.
    pub fn record(&self, target: &ScanTarget) {
        self.push(target.endpoint());
    }

    /// Append a raw `address:port` entry.
    pub fn push(&self, endpoint: impl Into<String>) {
        // The receiver lives as long as the sink, which outlives every handle
        // it gives out during a phase.
        if self.tx.send(endpoint.into()).is_ok() {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Append-only accumulator of reachable endpoints for one scan phase.
///
/// Entries are kept exactly as they arrive; duplicates are not suppressed.
#[derive(Debug)]
pub struct ResultSink {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
    entries: Vec<String>,
    count: Arc<AtomicUsize>,
    started: Instant,
    stopped: Option<Duration>,
}

impl ResultSink {
    /// Create an empty sink and start its scan timer.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            entries: Vec::new(),
            count: Arc::new(AtomicUsize::new(0)),
            started: Instant::now(),
            stopped: None,
        }
    }

    /// Get a producer handle.
    pub fn handle(&self) -> SinkHandle {
        SinkHandle {
            tx: self.tx.clone(),
            count: Arc::clone(&self.count),
        }
    }

    /// Number of entries pushed so far, drained or not.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    /// Scan time: running until [`ResultSink::finish`], frozen afterwards.
    pub fn elapsed(&self) -> Duration {
        self.stopped.unwrap_or_else(|| self.started.elapsed())
    }

    /// Drain every pending entry and stop the timer.
    ///
    /// Call after the join barrier; entries pushed later are picked up by the
    /// next call but do not restart the timer.
    pub fn finish(&mut self) -> &[String] {
        while let Ok(entry) = self.rx.try_recv() {
            self.entries.push(entry);
        }
        if self.stopped.is_none() {
            self.stopped = Some(self.started.elapsed());
        }
        &self.entries
    }

    /// Drain and overwrite `file` with one entry per line.
    pub fn export(&mut self, file: &ResultFile) -> StorageResult<()> {
        self.finish();
        file.write(&self.entries)
    }

    /// Consume the sink, returning its entries.
    pub fn into_entries(mut self) -> Vec<String> {
        self.finish();
        self.entries
    }
}

impl Default for ResultSink {
    fn default() -> Self {
        Self::new()
    }
}
