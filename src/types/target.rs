//! Address specification parsing and expansion.
//!
//! Classifies one textual specification and expands it into candidate
//! addresses:
//! - Single IP addresses (IPv4 and IPv6)
//! - CIDR notation (192.168.1.0/24)
//! - Hyphenated ranges (10.0.0.1-10.0.0.20)
//! - Hostnames (example.com), resolved through a [`HostResolver`]

use super::resolver::HostResolver;
use ipnetwork::IpNetwork;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Error type for specification parsing and expansion.
///
/// Every variant marks the specification as ignorable; none of them aborts
/// the validation phase.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("empty address specification")]
    Empty,
    #[error("invalid address specification: {0}")]
    InvalidFormat(String),
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),
    #[error("range endpoints belong to different address families: {0}")]
    FamilyMismatch(String),
    #[error("range start is above range end: {0}")]
    ReversedRange(String),
    #[error("range too large: {0} addresses (max: {1})")]
    RangeTooLarge(u128, u128),
    #[error("failed to resolve hostname '{0}': {1}")]
    DnsResolutionFailed(String, String),
    #[error("no IP addresses found for hostname '{0}'")]
    NoAddressesFound(String),
}

/// A classified address specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A single IP address.
    Single(IpAddr),
    /// A CIDR block; the stored address may carry host bits.
    Cidr(IpNetwork),
    /// An inclusive range of addresses of the same family.
    Range { start: IpAddr, end: IpAddr },
    /// A hostname to be resolved.
    Hostname(String),
}

impl TargetSpec {
    /// Maximum number of addresses an IPv6 CIDR or range may expand to.
    ///
    /// IPv4 expansions are never capped.
    pub const MAX_V6_EXPANSION: u128 = 65536;

    /// Classify a specification string.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetError::Empty);
        }

        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::Single(ip));
        }

        if let Some((left, right)) = s.split_once('/') {
            if let Ok(ip) = left.trim().parse::<IpAddr>() {
                let prefix: u8 = right
                    .trim()
                    .parse()
                    .map_err(|_| TargetError::InvalidCidr(s.to_string()))?;
                let network = IpNetwork::new(ip, prefix)
                    .map_err(|_| TargetError::InvalidCidr(s.to_string()))?;
                return Ok(Self::Cidr(network));
            }
        }

        if let Some((left, right)) = s.split_once('-') {
            if let Ok(start) = left.trim().parse::<IpAddr>() {
                let Ok(end) = right.trim().parse::<IpAddr>() else {
                    // Unparsable right-hand side: keep the left address only.
                    return Ok(Self::Single(start));
                };
                if start.is_ipv4() != end.is_ipv4() {
                    return Err(TargetError::FamilyMismatch(s.to_string()));
                }
                return Ok(Self::Range { start, end });
            }
        }

        if is_valid_hostname(s) {
            return Ok(Self::Hostname(s.to_string()));
        }

        Err(TargetError::InvalidFormat(s.to_string()))
    }

    /// Expand this specification into candidate addresses.
    ///
    /// Hostnames are resolved with `resolver`; every other variant expands
    /// locally without touching the network.
    pub async fn expand(&self, resolver: &dyn HostResolver) -> Result<Vec<IpAddr>, TargetError> {
        match self {
            Self::Hostname(host) => {
                let ips = resolver.lookup(host).await?;
                if ips.is_empty() {
                    return Err(TargetError::NoAddressesFound(host.clone()));
                }
                Ok(ips)
            }
            other => other.expand_local(),
        }
    }

    /// Expand a non-hostname specification.
    pub fn expand_local(&self) -> Result<Vec<IpAddr>, TargetError> {
        match self {
            Self::Single(ip) => Ok(vec![*ip]),
            Self::Cidr(IpNetwork::V4(net)) => {
                let (start, end) = cidr_bounds_v4(net.ip(), net.prefix());
                Ok(span_v4(start, end).map(IpAddr::V4).collect())
            }
            Self::Cidr(IpNetwork::V6(net)) => {
                let (start, end) = cidr_bounds_v6(net.ip(), net.prefix());
                Ok(span_v6(start, end)?.map(IpAddr::V6).collect())
            }
            Self::Range { start, end } => match (start, end) {
                (IpAddr::V4(a), IpAddr::V4(b)) => {
                    if a > b {
                        return Err(TargetError::ReversedRange(self.to_string()));
                    }
                    Ok(span_v4(*a, *b).map(IpAddr::V4).collect())
                }
                (IpAddr::V6(a), IpAddr::V6(b)) => {
                    if a > b {
                        return Err(TargetError::ReversedRange(self.to_string()));
                    }
                    Ok(span_v6(*a, *b)?.map(IpAddr::V6).collect())
                }
                _ => Err(TargetError::FamilyMismatch(self.to_string())),
            },
            Self::Hostname(host) => Err(TargetError::InvalidFormat(host.clone())),
        }
    }

    /// Number of addresses this specification expands to, if known locally.
    pub fn address_count(&self) -> Option<u128> {
        match self {
            Self::Single(_) => Some(1),
            Self::Cidr(IpNetwork::V4(net)) => Some(1u128 << (32 - u32::from(net.prefix()))),
            Self::Cidr(IpNetwork::V6(net)) => {
                let host_bits = 128 - u32::from(net.prefix());
                Some(if host_bits >= 128 { u128::MAX } else { 1u128 << host_bits })
            }
            Self::Range { start, end } => match (start, end) {
                (IpAddr::V4(a), IpAddr::V4(b)) if a <= b => {
                    Some(u128::from(u32::from(*b) - u32::from(*a)) + 1)
                }
                (IpAddr::V6(a), IpAddr::V6(b)) if a <= b => {
                    Some((u128::from(*b) - u128::from(*a)).saturating_add(1))
                }
                _ => Some(0),
            },
            Self::Hostname(_) => None,
        }
    }
}

impl FromStr for TargetSpec {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(ip) => write!(f, "{}", ip),
            Self::Cidr(network) => write!(f, "{}", network),
            Self::Range { start, end } => write!(f, "{}-{}", start, end),
            Self::Hostname(hostname) => write!(f, "{}", hostname),
        }
    }
}

/// First and last address of an IPv4 CIDR block.
pub fn cidr_bounds_v4(ip: Ipv4Addr, prefix: u8) -> (Ipv4Addr, Ipv4Addr) {
    let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
    let ip = u32::from(ip);
    (Ipv4Addr::from(ip & mask), Ipv4Addr::from(ip | !mask))
}

/// First and last address of an IPv6 CIDR block.
pub fn cidr_bounds_v6(ip: Ipv6Addr, prefix: u8) -> (Ipv6Addr, Ipv6Addr) {
    let mask = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
    let ip = u128::from(ip);
    (Ipv6Addr::from(ip & mask), Ipv6Addr::from(ip | !mask))
}

/// Every IPv4 address whose integer encoding lies in `[start, end]`.
pub fn span_v4(start: Ipv4Addr, end: Ipv4Addr) -> impl Iterator<Item = Ipv4Addr> {
    (u32::from(start)..=u32::from(end)).map(Ipv4Addr::from)
}

/// Every IPv6 address in `[start, end]`, refusing spans above the cap.
pub fn span_v6(
    start: Ipv6Addr,
    end: Ipv6Addr,
) -> Result<impl Iterator<Item = Ipv6Addr>, TargetError> {
    let (lo, hi) = (u128::from(start), u128::from(end));
    let count = hi.saturating_sub(lo).saturating_add(1);
    if count > TargetSpec::MAX_V6_EXPANSION {
        return Err(TargetError::RangeTooLarge(count, TargetSpec::MAX_V6_EXPANSION));
    }
    Ok((lo..=hi).map(Ipv6Addr::from))
}

/// Check whether a string follows DNS hostname grammar.
///
/// Dot-separated labels of 1-63 ASCII alphanumerics with internal hyphens.
pub fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    s.split('.').all(|label| {
        let bytes = label.as_bytes();
        !bytes.is_empty()
            && bytes.len() <= 63
            && bytes[0].is_ascii_alphanumeric()
            && bytes[bytes.len() - 1].is_ascii_alphanumeric()
            && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::resolver::StaticResolver;

    fn v4(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_single_ipv4() {
        let spec = TargetSpec::parse("192.168.1.5").unwrap();
        assert_eq!(spec, TargetSpec::Single(v4("192.168.1.5")));
        assert_eq!(spec.expand_local().unwrap(), vec![v4("192.168.1.5")]);
    }

    #[test]
    fn test_parse_single_ipv6() {
        let spec = TargetSpec::parse("::1").unwrap();
        assert!(matches!(spec, TargetSpec::Single(IpAddr::V6(_))));
    }

    #[test]
    fn test_empty_and_whitespace_are_rejected() {
        assert_eq!(TargetSpec::parse(""), Err(TargetError::Empty));
        assert_eq!(TargetSpec::parse("   \t"), Err(TargetError::Empty));
    }

    #[test]
    fn test_cidr_slash_30() {
        let spec = TargetSpec::parse("10.0.0.0/30").unwrap();
        let ips = spec.expand_local().unwrap();
        assert_eq!(
            ips,
            vec![v4("10.0.0.0"), v4("10.0.0.1"), v4("10.0.0.2"), v4("10.0.0.3")]
        );
    }

    #[test]
    fn test_cidr_masks_host_bits() {
        let ips = TargetSpec::parse("172.16.5.10/20").unwrap().expand_local().unwrap();
        assert_eq!(ips.len(), 4096);
        assert_eq!(ips.first(), Some(&v4("172.16.0.0")));
        assert_eq!(ips.last(), Some(&v4("172.16.15.255")));
    }

    #[test]
    fn test_cidr_counts_match_prefix() {
        for prefix in 16..=32u8 {
            let spec = TargetSpec::parse(&format!("192.168.77.9/{}", prefix)).unwrap();
            let ips = spec.expand_local().unwrap();
            assert_eq!(ips.len() as u128, 1u128 << (32 - prefix));
            assert_eq!(spec.address_count(), Some(1u128 << (32 - prefix)));
        }
    }

    #[test]
    fn test_cidr_bounds_extremes() {
        let ip = Ipv4Addr::new(10, 20, 30, 40);
        assert_eq!(
            cidr_bounds_v4(ip, 0),
            (Ipv4Addr::new(0, 0, 0, 0), Ipv4Addr::new(255, 255, 255, 255))
        );
        assert_eq!(cidr_bounds_v4(ip, 32), (ip, ip));
    }

    #[test]
    fn test_cidr_invalid_prefix_is_rejected() {
        assert!(matches!(
            TargetSpec::parse("192.168.0.1/33"),
            Err(TargetError::InvalidCidr(_))
        ));
        assert!(matches!(
            TargetSpec::parse("192.168.0.1/abc"),
            Err(TargetError::InvalidCidr(_))
        ));
        assert!(matches!(
            TargetSpec::parse("2001:db8::/129"),
            Err(TargetError::InvalidCidr(_))
        ));
    }

    #[test]
    fn test_hyphen_range_is_inclusive() {
        let ips = TargetSpec::parse("10.0.0.254-10.0.1.1")
            .unwrap()
            .expand_local()
            .unwrap();
        assert_eq!(
            ips,
            vec![v4("10.0.0.254"), v4("10.0.0.255"), v4("10.0.1.0"), v4("10.0.1.1")]
        );
    }

    #[test]
    fn test_hyphen_range_bad_right_side_keeps_left() {
        let spec = TargetSpec::parse("10.0.0.7-banana").unwrap();
        assert_eq!(spec, TargetSpec::Single(v4("10.0.0.7")));
        assert_eq!(spec.expand_local().unwrap(), vec![v4("10.0.0.7")]);
    }

    #[test]
    fn test_hyphen_range_family_mismatch() {
        assert!(matches!(
            TargetSpec::parse("10.0.0.1-::1"),
            Err(TargetError::FamilyMismatch(_))
        ));
    }

    #[test]
    fn test_reversed_range_is_ignorable() {
        let spec = TargetSpec::parse("10.0.0.9-10.0.0.1").unwrap();
        assert!(matches!(spec.expand_local(), Err(TargetError::ReversedRange(_))));
    }

    #[test]
    fn test_ipv6_cidr_expands_within_cap() {
        let ips = TargetSpec::parse("2001:db8::/126").unwrap().expand_local().unwrap();
        assert_eq!(ips.len(), 4);
        assert_eq!(ips[0], "2001:db8::".parse::<IpAddr>().unwrap());
        assert_eq!(ips[3], "2001:db8::3".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_ipv6_cidr_over_cap_is_rejected() {
        let spec = TargetSpec::parse("2001:db8::/64").unwrap();
        assert!(matches!(spec.expand_local(), Err(TargetError::RangeTooLarge(_, _))));
    }

    #[test]
    fn test_ipv6_range() {
        let ips = TargetSpec::parse("fe80::1-fe80::3").unwrap().expand_local().unwrap();
        assert_eq!(ips.len(), 3);
    }

    #[test]
    fn test_parse_hostname() {
        let spec = TargetSpec::parse("kms.Example.com").unwrap();
        assert_eq!(spec, TargetSpec::Hostname("kms.Example.com".to_string()));
        assert_eq!(spec.address_count(), None);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            TargetSpec::parse("im_wrong"),
            Err(TargetError::InvalidFormat(_))
        ));
        assert!(matches!(
            TargetSpec::parse("host/24"),
            Err(TargetError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_valid_hostname() {
        assert!(is_valid_hostname("example.com"));
        assert!(is_valid_hostname("sub.example.com"));
        assert!(is_valid_hostname("my-server"));
        assert!(is_valid_hostname("300.10.1.1"));
        assert!(!is_valid_hostname(""));
        assert!(!is_valid_hostname("-invalid.com"));
        assert!(!is_valid_hostname("invalid-.com"));
        assert!(!is_valid_hostname("double..dot"));
        assert!(!is_valid_hostname("bücher.de"));
        assert!(!is_valid_hostname(&"a".repeat(64)));
    }

    #[tokio::test]
    async fn test_expand_hostname_uses_resolver() {
        let resolver = StaticResolver::new([("kms.lan", vec![v4("10.1.1.1"), v4("10.1.1.2")])]);
        let spec = TargetSpec::parse("kms.lan").unwrap();
        let ips = spec.expand(&resolver).await.unwrap();
        assert_eq!(ips, vec![v4("10.1.1.1"), v4("10.1.1.2")]);
    }

    #[tokio::test]
    async fn test_expand_unknown_hostname_fails() {
        let resolver = StaticResolver::default();
        let spec = TargetSpec::parse("nowhere.invalid").unwrap();
        assert!(matches!(
            spec.expand(&resolver).await,
            Err(TargetError::DnsResolutionFailed(_, _))
        ));
    }
}
