//! Core type definitions: address specifications, scan targets and port lists.

mod endpoint;
pub mod local;
mod port;
mod resolver;
mod target;

pub use endpoint::ScanTarget;
pub use port::{PortError, PortList};
pub use resolver::{DnsResolver, HostResolver, StaticResolver};
pub use target::{
    cidr_bounds_v4, cidr_bounds_v6, is_valid_hostname, span_v4, span_v6, TargetError, TargetSpec,
};
