//! Hostname resolution.
//!
//! The [`HostResolver`] trait decouples specification expansion from the DNS
//! stack so validation can run against a fixed table in tests.

use super::target::TargetError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use tracing::debug;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Resolves a hostname to every address it maps to.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Look up all addresses for `host`.
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, TargetError>;
}

/// DNS-backed resolver.
pub struct DnsResolver {
    inner: TokioAsyncResolver,
}

impl DnsResolver {
    /// Build a resolver from the system configuration (e.g. `/etc/resolv.conf`),
    /// falling back to the library defaults when it cannot be read.
    pub fn from_system() -> Self {
        let inner = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            debug!("system resolver configuration unavailable ({}), using defaults", e);
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self { inner }
    }
}

#[async_trait]
impl HostResolver for DnsResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, TargetError> {
        let response = self
            .inner
            .lookup_ip(host)
            .await
            .map_err(|e| TargetError::DnsResolutionFailed(host.to_string(), e.to_string()))?;

        Ok(response.iter().collect())
    }
}

/// Resolver answering from a fixed table.
///
/// Lookups are case-insensitive; unknown names fail like an NXDOMAIN.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    table: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    /// Create a resolver from `(hostname, addresses)` pairs.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<IpAddr>)>,
        S: Into<String>,
    {
        let table = entries
            .into_iter()
            .map(|(host, ips)| (host.into().to_ascii_lowercase(), ips))
            .collect();
        Self { table }
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, TargetError> {
        self.table
            .get(&host.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| {
                TargetError::DnsResolutionFailed(host.to_string(), "no such host".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_resolver_is_case_insensitive() {
        let ip: IpAddr = "192.0.2.10".parse().unwrap();
        let resolver = StaticResolver::new([("KMS.corp.example", vec![ip])]);
        assert_eq!(resolver.lookup("kms.CORP.example").await.unwrap(), vec![ip]);
    }

    #[tokio::test]
    async fn test_static_resolver_unknown_host() {
        let resolver = StaticResolver::default();
        let err = resolver.lookup("missing.example").await.unwrap_err();
        assert!(err.to_string().contains("missing.example"));
    }
}
