//! Polling and aggregation services for the GRVT Account Monitor
//!
//! This crate provides the orchestration layer above the GRVT client: the
//! roster of configured accounts, the per-cycle aggregator, and the poller
//! that publishes an immutable snapshot on every interval tick or manual
//! trigger.

pub mod aggregator;
pub mod poller;
pub mod roster;

pub use aggregator::Aggregator;
pub use poller::Poller;
pub use roster::{Roster, MAX_ROSTER_SLOTS};
