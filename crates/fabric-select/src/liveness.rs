//! Network interface address lookup used to check that a device is live.
//!
//! The engine only needs `name → addresses`. Production uses
//! [`SystemAddrs`], which reads the kernel's interface address list;
//! tests substitute closures.

use std::io;
use std::net::IpAddr;

/// Source of IP addresses assigned to a network interface.
///
/// Called while the selection engine holds its exclusive lock, so
/// implementations must be cheap and must not block.
pub trait AddrSource: Send + Sync {
    /// Addresses assigned to `name`. An unknown interface is an error.
    fn interface_addrs(&self, name: &str) -> io::Result<Vec<IpAddr>>;
}

impl<F> AddrSource for F
where
    F: Fn(&str) -> io::Result<Vec<IpAddr>> + Send + Sync,
{
    fn interface_addrs(&self, name: &str) -> io::Result<Vec<IpAddr>> {
        self(name)
    }
}

/// Whether any address is assigned and not the unspecified address.
pub fn has_live_addr(addrs: &[IpAddr]) -> bool {
    addrs.iter().any(|a| !a.is_unspecified())
}

/// Reads interface addresses from the operating system via `getifaddrs(3)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAddrs;

#[cfg(unix)]
impl AddrSource for SystemAddrs {
    fn interface_addrs(&self, name: &str) -> io::Result<Vec<IpAddr>> {
        let mut found = false;
        let mut addrs = Vec::new();

        for ifaddr in nix::ifaddrs::getifaddrs().map_err(io::Error::from)? {
            if ifaddr.interface_name != name {
                continue;
            }
            found = true;
            let Some(storage) = ifaddr.address else {
                continue;
            };
            if let Some(v4) = storage.as_sockaddr_in() {
                addrs.push(IpAddr::V4(v4.ip()));
            } else if let Some(v6) = storage.as_sockaddr_in6() {
                addrs.push(IpAddr::V6(v6.ip()));
            }
        }

        if !found {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such network interface: {name}"),
            ));
        }
        tracing::trace!(interface = name, ?addrs, "interface addresses");
        Ok(addrs)
    }
}

#[cfg(not(unix))]
impl AddrSource for SystemAddrs {
    fn interface_addrs(&self, name: &str) -> io::Result<Vec<IpAddr>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("interface address lookup unsupported on this platform ({name})"),
        ))
    }
}
