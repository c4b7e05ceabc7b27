//! Scan result persistence.
//!
//! A single flat artifact, one `address:port` per line, overwritten on every
//! scan phase and read back by skip-scan runs.

mod result_file;

pub use result_file::ResultFile;
