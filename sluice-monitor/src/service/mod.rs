//! Service Module
//!
//! State layer for the monitor: the execution store and the broadcast hub
//! that relays its mutations to observers.

pub mod execution;
pub mod hub;

// Re-export for convenience
pub use execution::{ExecutionStore, StoreError, Subscription};
pub use hub::{BroadcastHub, ObserverId};
