//! Account identity and credential structures

use serde::Serialize;

/// API credentials for one GRVT sub-account
///
/// Held only for the duration of a request cycle. Never persisted, and the
/// `Debug` impl redacts the secret so credentials cannot leak into logs.
#[derive(Clone)]
pub struct Credential {
    /// API key sent in the `grvt-api-key` header
    pub api_key: String,

    /// HMAC signing secret (raw UTF-8 key bytes)
    pub api_secret: String,

    /// Sub-account identifier embedded in the request path
    pub sub_account_id: String,
}

impl Credential {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        sub_account_id: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            sub_account_id: sub_account_id.into(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("sub_account_id", &self.sub_account_id)
            .finish()
    }
}

/// One configured roster slot: a stable display label plus its credentials
///
/// Created once at roster-load time and immutable afterwards.
#[derive(Debug, Clone)]
pub struct AccountIdentity {
    /// Stable label for display and logging (e.g. the roster slot name)
    pub label: String,

    /// Resolved credentials for this account
    pub credential: Credential,
}

impl AccountIdentity {
    pub fn new(label: impl Into<String>, credential: Credential) -> Self {
        Self {
            label: label.into(),
            credential,
        }
    }
}

// Only the label crosses the display boundary; credentials stay inside the core.
impl Serialize for AccountIdentity {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.label)
    }
}
