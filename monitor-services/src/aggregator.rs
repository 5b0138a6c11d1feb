//! Per-cycle aggregation across the account roster
//!
//! Fans one fetch out per roster slot, collects the rows back in roster
//! order, and derives the portfolio aggregates. A failing account degrades
//! only its own row; `fetch` never errors, so the cycle always produces a
//! complete snapshot.

use chrono::Utc;
use futures::future::join_all;
use monitor_core::{AccountBalance, Snapshot};
use monitor_grvt::GrvtClient;
use tracing::{debug, instrument};

use crate::roster::Roster;

/// Aggregates account summaries into a snapshot
#[derive(Debug, Clone)]
pub struct Aggregator {
    client: GrvtClient,
}

impl Aggregator {
    pub fn new(client: GrvtClient) -> Self {
        Self { client }
    }

    /// Run one aggregation cycle over the roster
    ///
    /// Fetches run concurrently, one in-flight request per account, bounded
    /// by the roster size. `join_all` yields results in input order, so the
    /// snapshot rows are in roster order regardless of completion order.
    #[instrument(skip_all, fields(accounts = roster.len()))]
    pub async fn aggregate(&self, roster: &Roster) -> Snapshot {
        let records = join_all(
            roster
                .accounts()
                .iter()
                .map(|identity| self.client.fetch(identity, Utc::now())),
        )
        .await;

        let accounts: Vec<AccountBalance> = roster
            .accounts()
            .iter()
            .cloned()
            .zip(records)
            .map(|(identity, record)| AccountBalance { identity, record })
            .collect();

        let snapshot = Snapshot::from_rows(accounts, Utc::now());
        debug!(
            total_equity = %snapshot.total_equity,
            connected = snapshot
                .accounts
                .iter()
                .filter(|row| row.record.status.is_connected())
                .count(),
            "Aggregation cycle complete"
        );
        snapshot
    }
}
