//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use super::{ReportSource, ScanReport};
use crate::scanner::ScanStatus;
use console::style;
use std::io::{self, Write};

const RULE: &str = "═══════════════════════════════════════════════════════════════";

/// Write the report in human-readable form.
pub fn write_plain<W: Write>(report: &ScanReport, mut out: W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(
        out,
        "                    {} Scan Results",
        style("QDPS").cyan().bold()
    )?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    writeln!(
        out,
        "  {} {}",
        style("Started:").bold(),
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(
        out,
        "  {} {}",
        style("Ports:").bold(),
        report
            .ports
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(",")
    )?;
    writeln!(
        out,
        "  {} timeout {}ms, tick {}ms",
        style("Timing:").bold(),
        report.timeout_ms,
        report.tick_ms
    )?;
    if let Some(ref path) = report.results_file {
        writeln!(out, "  {} {}", style("Results:").bold(), style(path).dim())?;
    }
    writeln!(out)?;

    match report.source {
        ReportSource::Scan => {
            writeln!(
                out,
                "  {} {} candidates from {} addresses, {} ignored [{:.2}s]",
                style("Validation:").bold(),
                style(report.candidates).white().bold(),
                report.raw_addresses,
                style(report.ignored).yellow(),
                report.validation_ms as f64 / 1000.0
            )?;
            writeln!(
                out,
                "  {} {} of {} targets probed, {} reachable [{:.2}s]",
                style("Scan:").bold(),
                report.dispatched,
                report.scheduled,
                style(report.reachable_count).green().bold(),
                report.scan_ms as f64 / 1000.0
            )?;
            if report.status == ScanStatus::Cancelled {
                writeln!(out, "  {}", style("Scan was cancelled before completion.").yellow())?;
            }
        }
        ReportSource::Cache => {
            writeln!(
                out,
                "  {} {} endpoints loaded from previous scan",
                style("Cached:").bold(),
                style(report.reachable_count).green().bold()
            )?;
        }
    }
    writeln!(out)?;

    if report.endpoints.is_empty() {
        writeln!(out, "  {}", style("No reachable endpoints.").dim())?;
    } else {
        for endpoint in &report.endpoints {
            writeln!(out, "  {} {}", style("•").green(), endpoint)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    Ok(())
}

/// Print the report on stdout.
pub fn print_plain(report: &ScanReport) -> io::Result<()> {
    write_plain(report, io::stdout().lock())
}

/// Print a header before validation begins.
pub fn print_scan_header(specs: usize, ports: usize) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("QDPS").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!(
        "{} Validating {} address specifications...",
        style("•").dim(),
        style(specs).white().bold()
    );
    println!(
        "{} Probing {} port(s) per candidate",
        style("•").dim(),
        style(ports).white().bold()
    );
    println!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProbeTiming;
    use crate::types::PortList;
    use chrono::Utc;

    #[test]
    fn test_plain_lists_endpoints() {
        console::set_colors_enabled(false);
        let report = ScanReport::from_cache(
            Utc::now(),
            &PortList::default(),
            ProbeTiming::default(),
            vec!["10.0.0.1:1688".to_string()],
        );

        let mut buf = Vec::new();
        write_plain(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("10.0.0.1:1688"));
        assert!(text.contains("1 endpoints loaded"));
        assert!(text.contains("timeout 1000ms, tick 100ms"));
    }
}
