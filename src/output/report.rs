//! Serializable summary of one invocation.

use crate::config::ProbeTiming;
use crate::scanner::{ScanStatus, ScanSummary, ValidationReport};
use crate::types::PortList;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Where the endpoint list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSource {
    /// A fresh validation and scan phase.
    Scan,
    /// The result artifact of an earlier scan.
    Cache,
}

/// Report of a scan, or of a skip-scan load.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub source: ReportSource,
    pub ports: Vec<u16>,
    pub timeout_ms: u64,
    pub tick_ms: u64,
    /// Deduplicated candidate addresses.
    pub candidates: usize,
    /// Addresses before deduplication.
    pub raw_addresses: usize,
    pub ignored: usize,
    pub validation_ms: u64,
    pub scheduled: u64,
    pub dispatched: u64,
    pub reachable_count: usize,
    pub scan_ms: u64,
    pub status: ScanStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_file: Option<String>,
    pub endpoints: Vec<String>,
}

impl ScanReport {
    /// Build a report from both phases of a scan.
    pub fn from_scan(
        started_at: DateTime<Utc>,
        ports: &PortList,
        timing: ProbeTiming,
        validation: &ValidationReport,
        scan: ScanSummary,
    ) -> Self {
        Self {
            started_at,
            source: ReportSource::Scan,
            ports: ports.as_slice().to_vec(),
            timeout_ms: timing.timeout_ms(),
            tick_ms: timing.tick_ms(),
            candidates: validation.candidates.len(),
            raw_addresses: validation.total_raw,
            ignored: validation.ignored,
            validation_ms: validation.elapsed.as_millis() as u64,
            scheduled: scan.scheduled,
            dispatched: scan.dispatched,
            reachable_count: scan.reachable.len(),
            scan_ms: scan.elapsed.as_millis() as u64,
            status: scan.status,
            results_file: None,
            endpoints: scan.reachable,
        }
    }

    /// Build a report for endpoints loaded from the result artifact.
    pub fn from_cache(
        started_at: DateTime<Utc>,
        ports: &PortList,
        timing: ProbeTiming,
        endpoints: Vec<String>,
    ) -> Self {
        Self {
            started_at,
            source: ReportSource::Cache,
            ports: ports.as_slice().to_vec(),
            timeout_ms: timing.timeout_ms(),
            tick_ms: timing.tick_ms(),
            candidates: 0,
            raw_addresses: 0,
            ignored: 0,
            validation_ms: 0,
            scheduled: 0,
            dispatched: 0,
            reachable_count: endpoints.len(),
            scan_ms: 0,
            status: ScanStatus::Completed,
            results_file: None,
            endpoints,
        }
    }

    /// Record the artifact the endpoints were written to or read from.
    pub fn with_results_file(mut self, path: &Path) -> Self {
        self.results_file = Some(path.display().to_string());
        self
    }
}

/// Split an `address:port` entry. IPv6 addresses are written bare, so the
/// port is whatever follows the last colon.
pub fn split_endpoint(endpoint: &str) -> (&str, &str) {
    endpoint.rsplit_once(':').unwrap_or((endpoint, ""))
}
