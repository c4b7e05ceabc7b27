//! Port list parsing and normalization.
//!
//! A [`PortList`] is never empty once normalized: when no usable port is
//! supplied it falls back to [`PortList::DEFAULT_PORT`].
//!
//! Port 0 is accepted by the parser but never kept. A connect to port 0
//! always fails, so it is dropped with a debug log instead of being probed.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Error type for port parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("invalid port number: {0}")]
    InvalidFormat(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),
}

/// Ordered, duplicate-free list of ports to probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PortList(Vec<u16>);

impl PortList {
    /// Port probed when the caller supplies none (KMS).
    pub const DEFAULT_PORT: u16 = 1688;

    /// Build a list from raw ports.
    ///
    /// Port 0 and repeated ports are dropped, first occurrence wins. An empty
    /// result is replaced by the default port, so `"0"` means 1688.
    pub fn normalize(ports: impl IntoIterator<Item = u16>) -> Self {
        let mut seen = HashSet::new();
        let ports: Vec<u16> = ports
            .into_iter()
            .filter(|&p| {
                if p == 0 {
                    debug!("dropping port 0");
                    return false;
                }
                seen.insert(p)
            })
            .collect();

        if ports.is_empty() {
            Self(vec![Self::DEFAULT_PORT])
        } else {
            Self(ports)
        }
    }

    /// The ports in probe order.
    pub fn as_slice(&self) -> &[u16] {
        &self.0
    }

    /// Number of ports.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a normalized list.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for PortList {
    fn default() -> Self {
        Self(vec![Self::DEFAULT_PORT])
    }
}

/// Parses `"1688"`, `"80,443"`, `"8000-8010"` or any comma-separated mix.
impl FromStr for PortList {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut ports = Vec::new();

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if let Some((start, end)) = part.split_once('-') {
                let start = parse_port(start)?;
                let end = parse_port(end)?;
                if start > end {
                    return Err(PortError::InvalidRange(start, end));
                }
                ports.extend(start..=end);
            } else {
                ports.push(parse_port(part)?);
            }
        }

        Ok(Self::normalize(ports))
    }
}

fn parse_port(s: &str) -> Result<u16, PortError> {
    s.trim()
        .parse()
        .map_err(|_| PortError::InvalidFormat(s.trim().to_string()))
}

impl fmt::Display for PortList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_falls_back_to_default() {
        assert_eq!(PortList::normalize([]).as_slice(), &[1688]);
        assert_eq!(PortList::normalize([0, 0]).as_slice(), &[1688]);
        assert_eq!("".parse::<PortList>().unwrap().as_slice(), &[1688]);
    }

    #[test]
    fn test_port_zero_is_dropped_from_parsed_lists() {
        assert_eq!("0,80".parse::<PortList>().unwrap().as_slice(), &[80]);
        assert_eq!("0-2".parse::<PortList>().unwrap().as_slice(), &[1, 2]);
        assert_eq!("0".parse::<PortList>().unwrap().as_slice(), &[1688]);
    }

    #[test]
    fn test_normalize_keeps_first_occurrence_order() {
        let ports = PortList::normalize([443, 80, 443, 1688, 80]);
        assert_eq!(ports.as_slice(), &[443, 80, 1688]);
    }

    #[test]
    fn test_parse_mixed_list() {
        let ports: PortList = "22, 80,8000-8003".parse().unwrap();
        assert_eq!(ports.as_slice(), &[22, 80, 8000, 8001, 8002, 8003]);
        assert_eq!(ports.to_string(), "22,80,8000,8001,8002,8003");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(
            "80,http".parse::<PortList>(),
            Err(PortError::InvalidFormat("http".to_string()))
        );
        assert!("70000".parse::<PortList>().is_err());
        assert_eq!(
            "90-80".parse::<PortList>(),
            Err(PortError::InvalidRange(90, 80))
        );
    }
}
