//! Defensive extraction of balance fields from the summary payload
//!
//! The upstream wraps the real fields under a `result` key on some paths and
//! returns them at the top level on others, and has shipped both snake_case
//! and camelCase field names. Extraction is done against `serde_json::Value`
//! rather than a rigid struct so both shapes normalize to the same record.

use monitor_core::{MonitorError, MonitorResult};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Canonical fields pulled out of one summary payload
///
/// `margin_ratio` is still the upstream fraction (0.0-1.0+); the conversion
/// to a percentage belongs to the client, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBalanceFields {
    pub equity: Decimal,
    pub margin_ratio: Decimal,
}

/// Normalize one summary payload into [`RawBalanceFields`]
///
/// Tries the `result`-wrapped form first, then the top level. Each field is
/// looked up under its primary key, then one fallback alias; a field absent
/// under both names defaults to zero, while a field that is present but not
/// numeric is a normalization failure, never coerced to zero.
pub fn normalize(raw: &Value) -> MonitorResult<RawBalanceFields> {
    let body = match raw.get("result") {
        Some(inner) if inner.is_object() => inner,
        _ => raw,
    };

    let equity = extract_decimal(body, "total_equity", "totalEquity")?;
    let margin_ratio = extract_decimal(body, "margin_usage_ratio", "marginUsageRatio")?;

    Ok(RawBalanceFields {
        equity,
        margin_ratio,
    })
}

/// Look up `primary` then `alias`; only absence under both means zero
///
/// A present `null` is a present non-numeric value, so it goes through
/// `parse_decimal` and fails like any other wrong type.
fn extract_decimal(body: &Value, primary: &str, alias: &str) -> MonitorResult<Decimal> {
    match body.get(primary).or_else(|| body.get(alias)) {
        None => Ok(Decimal::ZERO),
        Some(value) => parse_decimal(value, primary),
    }
}

fn parse_decimal(value: &Value, field: &str) -> MonitorResult<Decimal> {
    match value {
        // serde_json renders numbers in shortest decimal form, so going
        // through the string keeps 0.1 as 0.1 instead of a float artifact.
        Value::Number(n) => parse_repr(&n.to_string())
            .map_err(|e| MonitorError::parse(format!("Field '{}' out of range: {}", field, e))),
        Value::String(s) => parse_repr(s.trim())
            .map_err(|_| MonitorError::parse(format!("Field '{}' is not numeric: {:?}", field, s))),
        other => Err(MonitorError::parse(format!(
            "Field '{}' has non-numeric type: {}",
            field,
            type_name(other)
        ))),
    }
}

/// Plain decimal form first, then exponent notation (serde_json renders
/// extreme floats as e.g. `1e30`)
fn parse_repr(repr: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str(repr).or_else(|_| Decimal::from_scientific(repr))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
