//! Core traits for the IP status monitor
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`AddressFetcher`]: Resolve a public address from a lookup service
//! - [`StatusStore`]: Persist the status record between runs

pub mod address_fetcher;
pub mod status_store;

pub use address_fetcher::{AddressFamily, AddressFetcher, expect_ipv4, expect_ipv6};
pub use status_store::StatusStore;
