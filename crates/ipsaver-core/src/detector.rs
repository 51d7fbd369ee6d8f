//! Change detection
//!
//! Decides how the next [`StatusRecord`] is derived from the baseline and the
//! addresses observed in the current cycle:
//!
//! - `lastCheckTime` is always the check time of this cycle
//! - the address fields are whatever was observed, including absent when a
//!   lookup failed (a failed lookup does not keep the previous address)
//! - `lastUpdateTime` moves to the check time only if either family changed,
//!   where absent → present and present → absent both count as a change

use chrono::{DateTime, Utc};

use crate::status::{ObservedAddresses, StatusRecord};

/// Whether the observed addresses differ from the baseline in either family
pub fn addresses_changed(old: &ObservedAddresses, new: &ObservedAddresses) -> bool {
    old.ipv4 != new.ipv4 || old.ipv6 != new.ipv6
}

/// Build the record for this cycle
///
/// A carried-over update time never exceeds `check_time`, so a wall clock
/// stepped backwards still yields a record that loads.
pub fn decide(
    old: &StatusRecord,
    observed: ObservedAddresses,
    check_time: DateTime<Utc>,
) -> StatusRecord {
    let last_update_time = if addresses_changed(&old.addresses(), &observed) {
        Some(check_time)
    } else {
        old.last_update_time().map(|update| update.min(check_time))
    };

    StatusRecord::new(
        observed.ipv4,
        observed.ipv6,
        Some(check_time),
        last_update_time,
    )
}
