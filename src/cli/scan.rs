//! Scan command implementation.
//!
//! Resolves options against the settings file, then runs validation, the
//! confirmation prompt, the scan phase and reporting.

use crate::cli::OutputFormat;
use crate::config::{AppSettings, Paths, ProbeTiming};
use crate::error::{CliError, CliResult, ScanError};
use crate::output::{self, ScanReport};
use crate::scanner::{ConnectProbe, PortScanScheduler, ValidationPool};
use crate::storage::ResultFile;
use crate::types::local::{local_ipv4_addresses, local_specs};
use crate::types::{DnsResolver, PortList};
use chrono::Utc;
use clap::Args;
use console::Term;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Scan options.
#[derive(Args, Debug, Default)]
pub struct ScanCommand {
    /// Address specifications: IP, CIDR block, hyphenated range or hostname
    ///
    /// Examples:
    ///   192.168.1.5                Single address
    ///   10.0.0.0/24                CIDR block
    ///   10.0.0.10-10.0.0.20        Inclusive range
    ///   kms.example.net            Hostname (every resolved address)
    #[arg(short = 's', long = "servers", value_name = "SPEC", num_args = 1..)]
    pub servers: Vec<String>,

    /// Ports to probe (e.g. "1688", "80,443", "8000-8010"); port 0 is skipped [default: 1688]
    #[arg(short = 'p', long)]
    pub ports: Option<String>,

    /// Per-probe timeout in milliseconds (10-65535) [default: 1000]
    #[arg(short = 't', long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Poll interval in milliseconds (10-65535) [default: 100]
    #[arg(short = 'S', long, value_name = "MS")]
    pub sleep: Option<u64>,

    /// Also scan the IPv4 addresses of the local interfaces
    #[arg(short = 'l', long)]
    pub local: bool,

    /// Scan the subnet around each local IPv4 address [default mask: 24]
    #[arg(short = 'q', long, value_name = "MASK", num_args = 0..=1)]
    pub quick: Option<Option<u8>>,

    /// Report the previous results instead of scanning, if there are any
    #[arg(short = 'n', long)]
    pub no_scan: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Maximum number of probes in flight [default: 500]
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Output format for results
    #[arg(short = 'o', long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Result file location [default: <data dir>/scan.results]
    #[arg(long, value_name = "PATH")]
    pub results: Option<PathBuf>,
}

/// Scan options after applying settings and normalization.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub ports: PortList,
    pub timing: ProbeTiming,
    pub concurrency: usize,
    pub output: OutputFormat,
    pub results_file: Option<ResultFile>,
    /// Prefix length for quick subnet scans, if requested.
    pub quick_mask: Option<u8>,
}

impl ScanCommand {
    /// Merge command-line values over `settings`.
    pub fn options(&self, settings: &AppSettings, paths: Option<&Paths>) -> CliResult<ScanOptions> {
        let ports = match self.ports {
            Some(ref spec) => spec.parse::<PortList>()?,
            None => PortList::normalize(settings.default_ports.iter().copied()),
        };

        let timing = ProbeTiming::normalize(
            self.timeout.unwrap_or(settings.timeout_ms),
            self.sleep.unwrap_or(settings.tick_ms),
        );

        let concurrency = self.concurrency.unwrap_or(settings.concurrency);
        if concurrency == 0 {
            return Err(ScanError::InvalidConfig("concurrency must be at least 1".to_string()).into());
        }

        let results_file = self
            .results
            .clone()
            .or_else(|| settings.results_file.clone())
            .or_else(|| paths.map(Paths::results_file))
            .map(ResultFile::new);

        Ok(ScanOptions {
            ports,
            timing,
            concurrency,
            output: self.output.unwrap_or(settings.output_format),
            results_file,
            quick_mask: self.quick.map(|mask| mask.unwrap_or(settings.quick_mask)),
        })
    }

    /// Address specifications to validate: `--servers` plus local ones.
    pub fn specs(&self, quick_mask: Option<u8>) -> Vec<String> {
        let mut specs = self.servers.clone();

        if self.local || quick_mask.is_some() {
            let addresses = local_ipv4_addresses();
            if addresses.is_empty() {
                output::print_warning("no usable local IPv4 addresses found");
            }
            debug!("local IPv4 addresses: {:?}", addresses);
            specs.extend(local_specs(&addresses, quick_mask));
        }

        specs
    }

    /// Execute the scan command.
    pub async fn execute(
        &self,
        settings: &AppSettings,
        paths: Option<&Paths>,
        verbose: bool,
        quiet: bool,
    ) -> CliResult<()> {
        let opts = self.options(settings, paths)?;
        let started_at = Utc::now();
        let chatty = !quiet && opts.output == OutputFormat::Plain;

        if self.no_scan {
            match opts.results_file {
                Some(ref file) => {
                    if let Some(endpoints) = file.load()? {
                        info!("loaded {} endpoints from {}", endpoints.len(), file.path().display());
                        let report =
                            ScanReport::from_cache(started_at, &opts.ports, opts.timing, endpoints)
                                .with_results_file(file.path());
                        output::print_report(&report, opts.output)?;
                        return Ok(());
                    }
                    if chatty {
                        output::print_info("No previous results found, scanning instead.");
                    }
                }
                None => output::print_warning("no result file location, scanning instead"),
            }
        }

        let specs = self.specs(opts.quick_mask);
        if specs.is_empty() {
            return Err(CliError::Other(
                "no address specifications given (use --servers, --local or --quick)".to_string(),
            ));
        }

        if chatty {
            output::print_scan_header(specs.len(), opts.ports.len());
        }

        let pool = ValidationPool::new(Arc::new(DnsResolver::from_system()));
        let validation = pool.run(&specs).await;

        if validation.candidates.is_empty() {
            return Err(ScanError::NoCandidates.into());
        }

        if !self.force {
            confirm(&format!(
                "Validated {} candidate(s), {} ignored. Press 'Y' to probe {} target(s); any other key aborts: ",
                validation.candidates.len(),
                validation.ignored,
                validation.candidates.len() * opts.ports.len()
            ))?;
        }

        let cancel = CancellationToken::new();
        let prober = Arc::new(ConnectProbe::new(opts.timing));
        let mut scheduler = PortScanScheduler::new(prober, opts.timing)
            .with_concurrency(opts.concurrency)
            .with_progress(verbose && !quiet)
            .with_cancellation(cancel.clone());
        if let Some(ref file) = opts.results_file {
            scheduler = scheduler.with_artifact(file.clone());
        }

        let interrupt = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                debug!("cannot listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        };
        let summary = scan_until_interrupted(
            scheduler.run(&validation.candidates, &opts.ports),
            interrupt,
            &cancel,
        )
        .await?;

        let mut report =
            ScanReport::from_scan(started_at, &opts.ports, opts.timing, &validation, summary);
        if let Some(ref file) = opts.results_file {
            report = report.with_results_file(file.path());
        }

        output::print_report(&report, opts.output)?;
        Ok(())
    }
}

/// Drive `scan` to completion, cancelling it once `interrupt` resolves.
///
/// The scan is still awaited after cancellation so it can drain in-flight
/// work and export what it collected. `interrupt` is dropped with the scan.
async fn scan_until_interrupted<F, I>(scan: F, interrupt: I, cancel: &CancellationToken) -> F::Output
where
    F: Future,
    I: Future<Output = ()>,
{
    tokio::pin!(scan);
    tokio::select! {
        output = &mut scan => output,
        () = interrupt => {
            eprintln!("\nScan interrupted, finishing in-flight probes...");
            cancel.cancel();
            scan.await
        }
    }
}

/// Ask for a single-key confirmation on the terminal.
fn confirm(prompt: &str) -> CliResult<()> {
    let term = Term::stderr();
    term.write_str(prompt)?;
    let key = term.read_char()?;
    term.write_line("")?;

    if key.eq_ignore_ascii_case(&'y') {
        Ok(())
    } else {
        Err(CliError::Cancelled)
    }
}
