//! Configuration management for QDPS.
//!
//! Provides XDG-compliant settings storage and the probe timing policy.

mod settings;
mod timing;

pub use settings::{AppSettings, Paths, RESULT_FILENAME};
pub use timing::ProbeTiming;
