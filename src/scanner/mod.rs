//! Scanner module - validation and scan phases.
//!
//! The validation phase expands address specifications into a deduplicated
//! candidate list; the scan phase probes every candidate on every port with
//! a bounded, paced set of tokio tasks and collects reachable endpoints.

pub mod rate_limiter;
pub mod scheduler;
pub mod sink;
pub mod tcp;
pub mod traits;
pub mod validation;

pub use rate_limiter::DispatchPacer;
pub use scheduler::{PortScanScheduler, ScanContext, ScanStatus, ScanSummary, DEFAULT_CONCURRENCY};
pub use sink::{ResultSink, SinkHandle};
pub use tcp::ConnectProbe;
pub use traits::{FixedProber, ProbeOutcome, ProbeState, Prober};
pub use validation::{ValidationPool, ValidationReport};
