//! CSV output formatting.

use super::report::split_endpoint;
use super::ScanReport;
use std::io::{self, Write};

/// Write one row per reachable endpoint.
pub fn write_csv<W: Write>(report: &ScanReport, out: W) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    wtr.write_record(["endpoint", "address", "port"])?;

    for endpoint in &report.endpoints {
        let (address, port) = split_endpoint(endpoint);
        wtr.write_record([endpoint.as_str(), address, port])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Print the report as CSV on stdout.
pub fn print_csv(report: &ScanReport) -> io::Result<()> {
    write_csv(report, io::stdout().lock())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProbeTiming;
    use crate::types::PortList;
    use chrono::Utc;

    #[test]
    fn test_csv_rows() {
        let report = ScanReport::from_cache(
            Utc::now(),
            &PortList::default(),
            ProbeTiming::default(),
            vec!["10.0.0.1:1688".to_string(), "2001:db8::1:1688".to_string()],
        );

        let mut buf = Vec::new();
        write_csv(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(
            text,
            "endpoint,address,port\n10.0.0.1:1688,10.0.0.1,1688\n2001:db8::1:1688,2001:db8::1,1688\n"
        );
    }
}
