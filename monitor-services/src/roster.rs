//! The fixed, ordered roster of accounts to poll
//!
//! Loaded once at startup from already-resolved credentials; absence of a
//! slot is detected here, at load time, not re-probed every cycle.

use monitor_core::{AccountIdentity, Credential, MonitorError, MonitorResult};
use tracing::{debug, info};

/// Maximum number of configured roster slots
pub const MAX_ROSTER_SLOTS: usize = 6;

/// The ordered list of configured accounts
///
/// Immutable after load; every poll cycle walks it in order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    accounts: Vec<AccountIdentity>,
}

impl Roster {
    pub fn new(accounts: Vec<AccountIdentity>) -> Self {
        Self { accounts }
    }

    /// Load the roster from `GRVT_ACCOUNT_{i}_*` environment variables
    ///
    /// See [`Roster::from_env_with_prefix`].
    pub fn from_env() -> MonitorResult<Self> {
        Self::from_env_with_prefix("GRVT")
    }

    /// Load the roster from `{prefix}_ACCOUNT_{i}_*` environment variables
    ///
    /// Scans slots 1 through [`MAX_ROSTER_SLOTS`] for `_API_KEY`,
    /// `_API_SECRET`, and `_SUB_ID`, with an optional `_LABEL` defaulting to
    /// `account-{i}`. A slot with none of the three variables is simply
    /// absent from the roster; a slot with only some of them is a
    /// configuration error.
    pub fn from_env_with_prefix(prefix: &str) -> MonitorResult<Self> {
        let mut accounts = Vec::new();

        for slot in 1..=MAX_ROSTER_SLOTS {
            let var = |suffix: &str| -> Option<String> {
                std::env::var(format!("{}_ACCOUNT_{}_{}", prefix, slot, suffix)).ok()
            };

            let api_key = var("API_KEY");
            let api_secret = var("API_SECRET");
            let sub_id = var("SUB_ID");

            match (api_key, api_secret, sub_id) {
                (Some(api_key), Some(api_secret), Some(sub_id)) => {
                    let label = var("LABEL").unwrap_or_else(|| format!("account-{}", slot));
                    debug!(slot, %label, "Roster slot configured");
                    accounts.push(AccountIdentity::new(
                        label,
                        Credential::new(api_key, api_secret, sub_id),
                    ));
                }
                (None, None, None) => {
                    debug!(slot, "Roster slot absent");
                }
                _ => {
                    return Err(MonitorError::config(format!(
                        "Roster slot {} is partially configured: \
                         {}_ACCOUNT_{}_API_KEY, _API_SECRET and _SUB_ID must all be set",
                        slot, prefix, slot
                    )));
                }
            }
        }

        info!("Loaded roster with {} account(s)", accounts.len());
        Ok(Self { accounts })
    }

    pub fn accounts(&self) -> &[AccountIdentity] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
