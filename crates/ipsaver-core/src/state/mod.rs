// # Status Store Implementations
//
// This module provides implementations of the StatusStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileStatusStore;
pub use memory::MemoryStatusStore;
