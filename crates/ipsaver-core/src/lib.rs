// # ipsaver-core
//
// Core library for the public IP status monitor.
//
// ## Architecture Overview
//
// This library records the host's public IPv4/IPv6 addresses once an hour:
// - **AddressFetcher**: Trait for resolving an address from a lookup service
// - **StatusStore**: Trait for persisting the status record between runs
// - **StatusRecord**: The persisted snapshot (addresses + check/update times)
// - **detector**: Decides whether the last-update time advances
// - **IpMonitor**: Fixed-rate scheduler driving fetch → decide → persist
//
// ## Design Principles
//
// 1. **Separation of Concerns**: No HTTP client code in core
// 2. **Fixed-Rate**: Cadence is anchored to the last check, not to process start
// 3. **Failure Isolation**: A failed lookup or save never stops the monitor
// 4. **Library-First**: All core functionality can be used as a library

pub mod config;
pub mod detector;
pub mod error;
pub mod scheduler;
pub mod state;
pub mod status;
pub mod traits;

// Re-export core types for convenience
pub use config::MonitorConfig;
pub use error::{Error, Result};
pub use scheduler::{IpMonitor, MonitorEvent};
pub use state::{FileStatusStore, MemoryStatusStore};
pub use status::{ObservedAddresses, StatusRecord};
pub use traits::{AddressFamily, AddressFetcher, StatusStore};
