//! Core types for the GRVT Account Monitor
//!
//! This crate defines the shared data structures used across the monitor,
//! including account identities, per-cycle balance records with outcome
//! classification, and the aggregated snapshot handed to the display layer.

pub mod account;
pub mod error;
pub mod snapshot;

pub use account::{AccountIdentity, Credential};
pub use error::{MonitorError, MonitorResult};
pub use snapshot::{AccountBalance, BalanceRecord, FailureKind, OutcomeStatus, Snapshot};
