// # Address Fetcher Trait
//
// Defines the interface for resolving the host's public address through an
// external lookup service.
//
// ## Implementations
//
// - HTTP (reqwest): `ipsaver-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ipsaver_core::AddressFetcher;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let fetcher = /* AddressFetcher implementation */;
//
//     let ip = fetcher.fetch("https://api.ipify.org").await?;
//     println!("public address: {}", ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::{Error, Result};

/// Address family served by a lookup endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// Human-readable family name
    pub fn name(self) -> &'static str {
        match self {
            AddressFamily::V4 => "IPv4",
            AddressFamily::V6 => "IPv6",
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait for address fetcher implementations
///
/// A fetcher performs exactly one request per call and returns the parsed
/// address or a failure. It does not retry, cache or filter by family; the
/// monitor owns all of that.
///
/// # Errors
///
/// - [`Error::Network`]: connection failure, timeout or non-2xx status
/// - [`Error::Parse`]: the body (trimmed) is not an IP address literal
#[async_trait]
pub trait AddressFetcher: Send + Sync {
    /// Fetch the caller's public address from `url`
    async fn fetch(&self, url: &str) -> Result<IpAddr>;

    /// Get the fetcher name (for logging/debugging)
    fn fetcher_name(&self) -> &'static str;
}

/// Narrow a fetched address to IPv4
///
/// IPv4-mapped IPv6 literals are accepted as their IPv4 form.
pub fn expect_ipv4(addr: IpAddr) -> Result<Ipv4Addr> {
    match addr.to_canonical() {
        IpAddr::V4(v4) => Ok(v4),
        IpAddr::V6(_) => Err(Error::WrongFamily {
            expected: AddressFamily::V4.name(),
            actual: addr.to_string(),
        }),
    }
}

/// Narrow a fetched address to IPv6
pub fn expect_ipv6(addr: IpAddr) -> Result<Ipv6Addr> {
    match addr.to_canonical() {
        IpAddr::V6(v6) => Ok(v6),
        IpAddr::V4(_) => Err(Error::WrongFamily {
            expected: AddressFamily::V6.name(),
            actual: addr.to_string(),
        }),
    }
}
