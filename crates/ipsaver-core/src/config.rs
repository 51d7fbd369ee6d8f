//! Configuration types for the IP status monitor
//!
//! The production values are fixed: two ipify endpoints polled once an hour,
//! with the status kept in `ipStatus.txt` under a base directory. The
//! structures below exist so the library can be embedded and exercised with
//! shorter intervals; the daemon always uses [`MonitorConfig::default`].

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Lookup service returning the caller's IPv4 address as plain text
pub const DEFAULT_IPV4_URL: &str = "https://api.ipify.org";

/// Lookup service returning the caller's IPv6 address as plain text
pub const DEFAULT_IPV6_URL: &str = "https://api6.ipify.org";

/// Interval between checks (one hour)
pub const ONE_HOUR: Duration = Duration::from_millis(3_600_000);

/// File name of the persisted status record inside the base directory
pub const STATUS_FILE_NAME: &str = "ipStatus.txt";

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// URL to fetch the IPv4 address from
    pub ipv4_url: String,

    /// URL to fetch the IPv6 address from
    pub ipv6_url: String,

    /// Fixed-rate interval between cycles
    pub interval: Duration,

    /// Capacity of the monitor event channel
    ///
    /// When full, new events are dropped with a warning log.
    pub event_channel_capacity: usize,
}

impl MonitorConfig {
    /// Create a new configuration with the production defaults
    pub fn new() -> Self {
        Self {
            ipv4_url: DEFAULT_IPV4_URL.to_string(),
            ipv6_url: DEFAULT_IPV6_URL.to_string(),
            interval: ONE_HOUR,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Override the fixed-rate interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Override both lookup endpoints
    pub fn with_urls(mut self, ipv4_url: impl Into<String>, ipv6_url: impl Into<String>) -> Self {
        self.ipv4_url = ipv4_url.into();
        self.ipv6_url = ipv6_url.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_url("IPv4 lookup URL", &self.ipv4_url)?;
        validate_url("IPv6 lookup URL", &self.ipv6_url)?;

        if self.interval.is_zero() {
            return Err(crate::Error::config("Check interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_url(what: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{} cannot be empty", what)));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            what, url
        )));
    }
    Ok(())
}

fn default_event_channel_capacity() -> usize {
    64
}

/// Resolve the status file location from the base directory
///
/// The base directory must already exist; it is never guessed or created.
pub fn status_file_path(base_dir: impl AsRef<Path>) -> Result<PathBuf, crate::Error> {
    let base_dir = base_dir.as_ref();

    if base_dir.as_os_str().is_empty() {
        return Err(crate::Error::startup("Base directory path is empty"));
    }
    if !base_dir.is_dir() {
        return Err(crate::Error::startup(format!(
            "Base directory does not exist or is not a directory: {}",
            base_dir.display()
        )));
    }

    Ok(base_dir.join(STATUS_FILE_NAME))
}
