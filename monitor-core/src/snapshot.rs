//! Balance records, outcome classification, and the aggregated snapshot

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::account::AccountIdentity;

/// Short stable classifier for a transport-level or payload-level failure
///
/// These render as fixed strings (`timeout`, `connection`, ...) rather than
/// the underlying error's free-text message, so tests and alerting can match
/// on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// The request exceeded its per-request deadline
    Timeout,
    /// DNS, connection refused/reset, or other connect-phase failure
    Connection,
    /// TLS handshake or certificate validation failure
    Tls,
    /// A 200 response whose body violated the payload contract
    Payload,
    /// Anything the above buckets do not cover
    Other,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Connection => "connection",
            FailureKind::Tls => "tls",
            FailureKind::Payload => "payload",
            FailureKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// Classified outcome of one account fetch
///
/// Exactly one tag per [`BalanceRecord`]. Every failure path carries a
/// classifier, never a bare "failed" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// The account responded and its balance normalized successfully
    Connected,
    /// 401 or 403: bad credentials, a configuration problem
    AuthError,
    /// 404: unknown sub-account id
    NotFound,
    /// Any other non-200 status from the upstream
    ServerError(u16),
    /// Transport failure or payload-contract violation
    NetworkFailure(FailureKind),
}

impl OutcomeStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, OutcomeStatus::Connected)
    }
}

impl std::fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeStatus::Connected => write!(f, "connected"),
            OutcomeStatus::AuthError => write!(f, "auth_error"),
            OutcomeStatus::NotFound => write!(f, "not_found"),
            OutcomeStatus::ServerError(code) => write!(f, "server_error({})", code),
            OutcomeStatus::NetworkFailure(kind) => write!(f, "network_failure({})", kind),
        }
    }
}

/// One account's balance as of one poll cycle
///
/// Created fresh every cycle and never mutated; the next cycle supersedes it
/// with a new record.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceRecord {
    /// Total account equity; zero for every non-connected outcome
    pub equity: Decimal,

    /// Margin usage as a percentage (0-100+ scale)
    pub margin_ratio_percent: Decimal,

    /// Classified outcome of the fetch that produced this record
    #[serde(flatten)]
    pub status: OutcomeStatus,

    /// When the fetch was issued
    pub fetched_at: DateTime<Utc>,
}

impl BalanceRecord {
    /// Record for a successfully fetched and normalized balance
    pub fn connected(
        equity: Decimal,
        margin_ratio_percent: Decimal,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            equity,
            margin_ratio_percent,
            status: OutcomeStatus::Connected,
            fetched_at,
        }
    }

    /// Well-formed record for any failure outcome: zero balances, classified status
    pub fn failed(status: OutcomeStatus, fetched_at: DateTime<Utc>) -> Self {
        Self {
            equity: Decimal::ZERO,
            margin_ratio_percent: Decimal::ZERO,
            status,
            fetched_at,
        }
    }
}

/// One roster slot paired with its latest balance record
#[derive(Debug, Clone, Serialize)]
pub struct AccountBalance {
    pub identity: AccountIdentity,
    pub record: BalanceRecord,
}

/// One complete, immutable, point-in-time aggregation across the roster
///
/// Contains one row per roster slot in roster order; accounts that failed
/// still produce a row, carrying their failure status. Published atomically
/// each cycle — readers see either the previous complete snapshot or this
/// one, never a partial state.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Per-account rows, roster order preserved
    pub accounts: Vec<AccountBalance>,

    /// Sum of equity over connected rows; failed rows contribute zero
    pub total_equity: Decimal,

    /// Number of roster slots in this snapshot
    pub account_count: usize,

    /// Mean margin percentage over all rows, failed rows included at zero.
    /// This understates the true mean among reporting accounts; kept for
    /// compatibility with the upstream dashboard's aggregate.
    pub average_margin_ratio_percent: Decimal,

    /// When this snapshot was assembled
    pub generated_at: DateTime<Utc>,
}

impl Snapshot {
    /// Assemble a snapshot from collected per-account rows
    ///
    /// Rows must already be in roster order; this only derives the
    /// aggregates. An empty row set yields zero aggregates, which is a valid
    /// snapshot (empty roster), not an error.
    pub fn from_rows(accounts: Vec<AccountBalance>, generated_at: DateTime<Utc>) -> Self {
        let total_equity = accounts
            .iter()
            .filter(|row| row.record.status.is_connected())
            .map(|row| row.record.equity)
            .sum();

        let account_count = accounts.len();

        let average_margin_ratio_percent = if account_count == 0 {
            Decimal::ZERO
        } else {
            let margin_sum: Decimal = accounts
                .iter()
                .map(|row| row.record.margin_ratio_percent)
                .sum();
            margin_sum / Decimal::from(account_count)
        };

        Self {
            accounts,
            total_equity,
            account_count,
            average_margin_ratio_percent,
            generated_at,
        }
    }
}
