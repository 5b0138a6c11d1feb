//! GRVT integration for the GRVT Account Monitor
//!
//! This crate provides the authenticated client for the GRVT account-summary
//! endpoint: per-request HMAC signing, defensive normalization of the
//! variably-shaped summary payload, and classification of every fetch
//! outcome into a well-formed balance record.

pub mod client;
pub mod normalize;
pub mod sign;

pub use client::GrvtClient;
pub use normalize::{normalize, RawBalanceFields};
pub use sign::sign;
