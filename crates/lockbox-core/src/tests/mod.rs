//! Scenario and property tests for the crate lifecycle.
//!
//! # Test Structure
//!
//! - `lifecycle.rs`: end-to-end scenarios driven through the controller
//! - `runtime.rs`: the cross-thread mailbox
//! - `properties.rs`: property tests over arbitrary event sequences
//! - `helpers.rs`: demo catalog, world and config factories

mod helpers;
mod lifecycle;

// Re-export for convenience
pub use helpers::*;
