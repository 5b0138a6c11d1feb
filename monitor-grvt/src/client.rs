//! GRVT account-summary client
//!
//! Executes one authenticated GET per account per cycle and classifies the
//! outcome. `fetch` never fails: every HTTP status, transport error, and
//! payload violation is mapped to an [`OutcomeStatus`] and returned inside a
//! well-formed [`BalanceRecord`], so the aggregation layer treats all
//! outcomes uniformly.

use chrono::{DateTime, Utc};
use monitor_core::{AccountIdentity, BalanceRecord, Credential, FailureKind, OutcomeStatus};
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::normalize::{normalize, RawBalanceFields};
use crate::sign::sign;

/// Base URL for the GRVT REST API
const GRVT_API_BASE: &str = "https://api.grvt.io";

/// Default per-request timeout; unbounded waits are disallowed
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const HEADER_API_KEY: &str = "grvt-api-key";
const HEADER_TIMESTAMP: &str = "grvt-timestamp";
const HEADER_SIGNATURE: &str = "grvt-signature";

/// GRVT API client
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct GrvtClient {
    client: Client,
    base_url: String,
}

impl GrvtClient {
    /// Create a client against the production API with the default timeout
    pub fn new() -> Self {
        Self::with_base_url(GRVT_API_BASE, DEFAULT_TIMEOUT)
    }

    /// Create a client against an alternate base URL (staging, tests)
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one account's summary and classify the outcome
    ///
    /// Issues exactly one outbound request, no retries; retry cadence belongs
    /// to the poll loop. The signing timestamp is the caller-provided `now`.
    #[instrument(skip(self, identity), fields(account = %identity.label))]
    pub async fn fetch(&self, identity: &AccountIdentity, now: DateTime<Utc>) -> BalanceRecord {
        match self.request_summary(&identity.credential, now.timestamp_millis()).await {
            Ok(fields) => {
                debug!(
                    equity = %fields.equity,
                    margin_ratio = %fields.margin_ratio,
                    "Account summary fetched"
                );
                BalanceRecord::connected(
                    fields.equity,
                    fields.margin_ratio * Decimal::ONE_HUNDRED,
                    now,
                )
            }
            Err(status) => {
                warn!(%status, "Account summary fetch failed");
                BalanceRecord::failed(status, now)
            }
        }
    }

    /// Execute the signed GET and map the outcome
    ///
    /// The error side is already the classified status, not an error type;
    /// `fetch` only has to wrap it into a record.
    async fn request_summary(
        &self,
        credential: &Credential,
        timestamp_ms: i64,
    ) -> Result<RawBalanceFields, OutcomeStatus> {
        // Tolerate padded or accidentally-numeric ids from configuration
        let sub_id = credential.sub_account_id.trim();
        let path = format!("/v1/accounts/{}/summary", sub_id);

        let signature = sign(&credential.api_secret, timestamp_ms, "GET", &path)
            .map_err(|e| {
                warn!("Request signing failed: {}", e);
                OutcomeStatus::NetworkFailure(FailureKind::Other)
            })?;

        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching GRVT account summary from: {}", url);

        let response = self
            .client
            .get(&url)
            .header(HEADER_API_KEY, &credential.api_key)
            .header(HEADER_TIMESTAMP, timestamp_ms.to_string())
            .header(HEADER_SIGNATURE, signature)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| OutcomeStatus::NetworkFailure(classify_transport(&e)))?;

        match response.status().as_u16() {
            200 => {
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| {
                        warn!("Summary body was not JSON: {}", e);
                        OutcomeStatus::NetworkFailure(FailureKind::Payload)
                    })?;

                normalize(&body).map_err(|e| {
                    // A 200 whose body violates the payload contract is not a
                    // zero balance; surface it as a classified failure.
                    warn!("Summary payload failed to normalize: {}", e);
                    OutcomeStatus::NetworkFailure(FailureKind::Payload)
                })
            }
            401 | 403 => Err(OutcomeStatus::AuthError),
            404 => Err(OutcomeStatus::NotFound),
            code => Err(OutcomeStatus::ServerError(code)),
        }
    }
}

impl Default for GrvtClient {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GrvtClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrvtClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Derive a short stable classifier from a transport-level failure
///
/// TLS problems are checked before the connect-phase bucket because rustls
/// handshake failures surface as connect errors in reqwest.
fn classify_transport(err: &reqwest::Error) -> FailureKind {
    if err.is_timeout() {
        return FailureKind::Timeout;
    }

    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let text = cause.to_string().to_lowercase();
        if text.contains("certificate") || text.contains("tls") || text.contains("handshake") {
            return FailureKind::Tls;
        }
        source = cause.source();
    }

    if err.is_connect() {
        return FailureKind::Connection;
    }

    FailureKind::Other
}
