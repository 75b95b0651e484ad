//! Masternode service address

use crate::error::MasternodeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

/// Where peers reach a masternode: an `(ip, port)` pair. Only the
/// network default port is ever accepted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAddress(SocketAddr);

impl ServiceAddress {
    pub fn new(addr: SocketAddr) -> Self {
        ServiceAddress(addr)
    }

    /// Parse `ip[:port]`, substituting `default_port` when the port is
    /// omitted.
    pub fn parse(s: &str, default_port: u16) -> Result<Self, MasternodeError> {
        if let Ok(addr) = SocketAddr::from_str(s) {
            return Ok(ServiceAddress(addr));
        }
        if let Ok(ip) = IpAddr::from_str(s) {
            return Ok(ServiceAddress(SocketAddr::new(ip, default_port)));
        }
        Err(MasternodeError::BadAddress(s.to_string()))
    }

    pub fn ip(&self) -> IpAddr {
        self.0.ip()
    }

    pub fn port(&self) -> u16 {
        self.0.port()
    }

    pub fn socket_addr(&self) -> SocketAddr {
        self.0
    }

    /// RFC1918, loopback or link-local; such addresses are tracked but
    /// never relayed outside of regtest.
    pub fn is_local(&self) -> bool {
        match self.ip() {
            IpAddr::V4(ip) => ip.is_private() || ip.is_loopback() || ip.is_link_local(),
            IpAddr::V6(ip) => ip.is_loopback() || (ip.segments()[0] & 0xffc0) == 0xfe80,
        }
    }

    /// Publicly routable: specified, not local.
    pub fn is_routable(&self) -> bool {
        !self.ip().is_unspecified() && !self.is_local()
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
