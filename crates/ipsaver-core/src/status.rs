//! The persisted status record
//!
//! A [`StatusRecord`] is built once per cycle from the previous record and the
//! freshly observed addresses; it is never edited in place.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "ipv4": "1.2.3.4",
//!   "ipv6": "2001:db8::1",
//!   "lastCheckTime": "2025-01-09T12:00:00Z",
//!   "lastUpdateTime": "2025-01-09T11:00:00Z"
//! }
//! ```
//!
//! Absent fields are omitted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{Error, Result};

/// Snapshot of the known public addresses and when they were checked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ipv4: Option<Ipv4Addr>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    ipv6: Option<Ipv6Addr>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_check_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_update_time: Option<DateTime<Utc>>,
}

impl StatusRecord {
    /// Create a record from its four fields
    pub fn new(
        ipv4: Option<Ipv4Addr>,
        ipv6: Option<Ipv6Addr>,
        last_check_time: Option<DateTime<Utc>>,
        last_update_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            ipv4,
            ipv6,
            last_check_time,
            last_update_time,
        }
    }

    /// The all-absent record used before the first cycle or after corruption
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether every field is absent
    pub fn is_empty(&self) -> bool {
        *self == Self::empty()
    }

    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        self.ipv4
    }

    pub fn ipv6(&self) -> Option<Ipv6Addr> {
        self.ipv6
    }

    pub fn last_check_time(&self) -> Option<DateTime<Utc>> {
        self.last_check_time
    }

    pub fn last_update_time(&self) -> Option<DateTime<Utc>> {
        self.last_update_time
    }

    /// The addresses held by this record
    pub fn addresses(&self) -> ObservedAddresses {
        ObservedAddresses::new(self.ipv4, self.ipv6)
    }

    /// Check the timestamp invariants
    ///
    /// An update can only be recorded by a check, so `lastUpdateTime`
    /// requires `lastCheckTime` and can never be later than it.
    pub fn validate(&self) -> Result<()> {
        match (self.last_check_time, self.last_update_time) {
            (None, Some(update)) => Err(Error::status_store(format!(
                "lastUpdateTime {} present without lastCheckTime",
                update
            ))),
            (Some(check), Some(update)) if update > check => Err(Error::status_store(format!(
                "lastUpdateTime {} is after lastCheckTime {}",
                update, check
            ))),
            _ => Ok(()),
        }
    }

    /// Serialize to the pretty-printed on-disk representation
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate the on-disk representation
    pub fn from_json(json: &str) -> Result<Self> {
        let record: Self = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }
}

impl fmt::Display for StatusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ipv4={} ipv6={} lastCheck={} lastUpdate={}",
            display_opt(self.ipv4),
            display_opt(self.ipv6),
            display_opt(self.last_check_time),
            display_opt(self.last_update_time),
        )
    }
}

/// Addresses resolved in one cycle, one slot per family
///
/// A slot is `None` when the lookup for that family failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservedAddresses {
    pub ipv4: Option<Ipv4Addr>,
    pub ipv6: Option<Ipv6Addr>,
}

impl ObservedAddresses {
    pub fn new(ipv4: Option<Ipv4Addr>, ipv6: Option<Ipv6Addr>) -> Self {
        Self { ipv4, ipv6 }
    }
}

fn display_opt<T: fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
