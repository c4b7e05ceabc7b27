//! Address specifications derived from the local network interfaces.

use pnet::datalink::{self, NetworkInterface};
use std::net::{IpAddr, Ipv4Addr};

/// Default prefix length for quick subnet scans (256 addresses).
pub const DEFAULT_QUICK_MASK: u8 = 24;

/// Normalize a quick-scan prefix length: anything above 32 becomes the default.
pub fn normalize_quick_mask(mask: u8) -> u8 {
    if mask <= 32 {
        mask
    } else {
        DEFAULT_QUICK_MASK
    }
}

/// IPv4 addresses of every interface that is up and not a loopback.
pub fn local_ipv4_addresses() -> Vec<Ipv4Addr> {
    ipv4_addresses_of(&datalink::interfaces())
}

fn ipv4_addresses_of(interfaces: &[NetworkInterface]) -> Vec<Ipv4Addr> {
    interfaces
        .iter()
        .filter(|i| i.is_up() && !i.is_loopback())
        .flat_map(|i| i.ips.iter())
        .filter_map(|net| match net.ip() {
            IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_link_local() => Some(ip),
            _ => None,
        })
        .collect()
}

/// Specifications for the local addresses.
///
/// With `quick_mask` set, each address is widened to `<address>/<mask>`.
pub fn local_specs(addresses: &[Ipv4Addr], quick_mask: Option<u8>) -> Vec<String> {
    addresses
        .iter()
        .map(|ip| match quick_mask {
            Some(mask) => format!("{}/{}", ip, normalize_quick_mask(mask)),
            None => ip.to_string(),
        })
        .collect()
}
