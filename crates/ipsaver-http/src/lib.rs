// # HTTP Address Fetcher
//
// This crate provides the reqwest-backed AddressFetcher for the IP status
// monitor.
//
// ## Lookup Services
//
// A lookup service answers a plain GET with the caller's public address as
// the entire response body, e.g. `203.0.113.7\n`. No authentication, no JSON.
//
// ## Behavior
//
// - One request per call, no retries (the monitor simply tries again next
//   cycle)
// - Connection errors, timeouts and non-2xx statuses are network failures
// - A body that is not an address literal after trimming is a parse failure
// - Bodies over a few hundred bytes are rejected unread as parse failures

use ipsaver_core::traits::AddressFetcher;
use ipsaver_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// Default request timeout
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Largest response body accepted from a lookup service
const MAX_BODY_BYTES: usize = 256;

/// HTTP-based address fetcher
#[derive(Debug, Clone)]
pub struct HttpAddressFetcher {
    /// HTTP client
    client: reqwest::Client,
}

impl HttpAddressFetcher {
    /// Create a fetcher with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a fetcher with a custom per-request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ipsaver/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

/// Read the response body, refusing anything longer than `MAX_BODY_BYTES`
async fn read_body(mut response: reqwest::Response, url: &str) -> Result<String> {
    if let Some(len) = response
        .content_length()
        .filter(|len| *len > MAX_BODY_BYTES as u64)
    {
        return Err(Error::parse(format!(
            "Response from {} too large: {} bytes",
            url, len
        )));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| Error::network(format!("Failed to read response from {}: {}", url, e)))?
    {
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(Error::parse(format!(
                "Response from {} exceeds {} bytes",
                url, MAX_BODY_BYTES
            )));
        }
        body.extend_from_slice(&chunk);
    }

    String::from_utf8(body)
        .map_err(|_| Error::parse(format!("Response from {} is not valid UTF-8", url)))
}

/// Parse a lookup service response body
pub fn parse_address(body: &str) -> Result<IpAddr> {
    let text = body.trim();
    text.parse()
        .map_err(|_| Error::parse(format!("Invalid IP address: {:?}", text)))
}

#[async_trait::async_trait]
impl AddressFetcher for HttpAddressFetcher {
    async fn fetch(&self, url: &str) -> Result<IpAddr> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "HTTP error from {}: {}",
                url,
                response.status()
            )));
        }

        let body = read_body(response, url).await?;

        let ip = parse_address(&body)?;
        tracing::debug!("{} resolved to {}", url, ip);
        Ok(ip)
    }

    fn fetcher_name(&self) -> &'static str {
        "http"
    }
}
