//! # QDPS - Quick Distributed Port Scanner
//!
//! QDPS expands a set of textual address specifications into a deduplicated
//! candidate set, then runs a bounded, concurrent TCP-connect liveness probe
//! of every (address, port) pair and reports the reachable endpoints.
//!
//! ## Features
//!
//! - **Flexible Targeting**: single addresses, CIDR blocks, hyphenated ranges,
//!   hostnames and local interface subnets
//! - **Bounded Concurrency**: per-probe deadlines, dispatch pacing and a
//!   capped set of tokio tasks, one per target
//! - **Result Artifact**: reachable endpoints written to a flat file, reusable
//!   by later skip-scan runs
//! - **Multiple Output Formats**: plain text, JSON, and CSV
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use qdps::config::ProbeTiming;
//! use qdps::scanner::{ConnectProbe, PortScanScheduler, ValidationPool};
//! use qdps::types::{DnsResolver, PortList};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let validation = ValidationPool::new(Arc::new(DnsResolver::from_system()))
//!     .run(&["192.168.1.0/24", "kms.example.net"])
//!     .await;
//!
//! let timing = ProbeTiming::normalize(1000, 100);
//! let summary = PortScanScheduler::new(Arc::new(ConnectProbe::new(timing)), timing)
//!     .run(&validation.candidates, &PortList::default())
//!     .await?;
//!
//! for endpoint in &summary.reachable {
//!     println!("{}", endpoint);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Address specifications, ports, targets and DNS resolution
//! - [`scanner`] - Validation pool, scan scheduler, connect probe, result sink
//! - [`config`] - Settings file and probe timing policy
//! - [`storage`] - The flat result artifact
//! - [`error`] - Error types
//! - [`output`] - Report rendering

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ScanError, StorageError};
pub use scanner::{
    ConnectProbe, PortScanScheduler, ProbeOutcome, Prober, ResultSink, ScanStatus, ScanSummary,
    ValidationPool, ValidationReport,
};
pub use types::{PortList, ScanTarget, TargetSpec};
