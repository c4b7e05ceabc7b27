//! JSON output formatting.

use super::ScanReport;
use std::io::{self, Write};

/// Write the report as pretty-printed JSON.
pub fn write_json<W: Write>(report: &ScanReport, mut out: W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, report).map_err(io::Error::other)?;
    writeln!(out)
}

/// Print the report as JSON on stdout.
pub fn print_json(report: &ScanReport) -> io::Result<()> {
    write_json(report, io::stdout().lock())
}
