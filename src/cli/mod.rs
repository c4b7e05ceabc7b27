//! Command-line definitions and handlers.
//!
//! QDPS is a single command: validate the address specifications, confirm,
//! scan, report. Every scan option falls back to the settings file.

mod scan;

pub use scan::{ScanCommand, ScanOptions};

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// QDPS - a quick distributed port scanner.
///
/// Expands address specifications (addresses, CIDR blocks, hyphenated
/// ranges, hostnames, local interfaces) into a candidate set and probes
/// every candidate on every port with a bare TCP connect.
#[derive(Parser, Debug)]
#[command(name = "qdps")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Quick distributed TCP port scanner", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub scan: ScanCommand,

    /// Enable verbose output and the progress bar
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Path to a custom settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Output format for results.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV, one row per reachable endpoint
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}
