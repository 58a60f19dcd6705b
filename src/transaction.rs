// src/transaction.rs
//! Validated transaction records
//!
//! A [`Transaction`] can only be obtained through validation, either from
//! [`Transaction::new`] or from a [`RawTransaction`] as produced by the
//! ingestion layer. Deserializing a `Transaction` directly goes through the
//! same checks.

use crate::ValidationError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Immutable, validated transaction record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTransaction")]
pub struct Transaction {
    transaction_id: String,
    user_id: String,
    merchant_id: String,
    amount: f64,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_method: Option<String>,
}

impl Transaction {
    /// Build a transaction from already-typed fields.
    pub fn new(
        transaction_id: impl Into<String>,
        user_id: impl Into<String>,
        merchant_id: impl Into<String>,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let transaction_id = non_empty("transaction_id", transaction_id.into())?;
        let user_id = non_empty("user_id", user_id.into())?;
        let merchant_id = non_empty("merchant_id", merchant_id.into())?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(ValidationError::InvalidAmount(amount.to_string()));
        }

        Ok(Self {
            transaction_id,
            user_id,
            merchant_id,
            amount,
            timestamp,
            location: None,
            payment_method: None,
        })
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_payment_method(mut self, payment_method: impl Into<String>) -> Self {
        self.payment_method = Some(payment_method.into());
        self
    }

    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn payment_method(&self) -> Option<&str> {
        self.payment_method.as_deref()
    }
}

/// Amount as it appears in a source record: JSON numbers or CSV/JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

/// Unvalidated record straight from a source
///
/// Every field is optional so that a missing column is reported as a
/// [`ValidationError`] rather than a deserialization failure of the whole
/// source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub merchant_id: Option<String>,
    #[serde(default)]
    pub amount: Option<RawAmount>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = ValidationError;

    fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
        let amount = match raw.amount {
            Some(RawAmount::Number(n)) => n,
            Some(RawAmount::Text(text)) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| ValidationError::InvalidAmount(text.clone()))?,
            None => return Err(ValidationError::MissingField("amount")),
        };
        let timestamp = parse_timestamp(&required("timestamp", raw.timestamp)?)?;

        let mut txn = Transaction::new(
            required("transaction_id", raw.transaction_id)?,
            required("user_id", raw.user_id)?,
            required("merchant_id", raw.merchant_id)?,
            amount,
            timestamp,
        )?;
        txn.location = raw.location.filter(|s| !s.trim().is_empty());
        txn.payment_method = raw.payment_method.filter(|s| !s.trim().is_empty());
        Ok(txn)
    }
}

/// Parse an RFC 3339 instant, or a naive `YYYY-MM-DD HH:MM:SS` taken as UTC.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, ValidationError> {
    let text = text.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ValidationError::InvalidTimestamp(text.to_string()))
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}

fn non_empty(field: &'static str, value: String) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw() -> RawTransaction {
        RawTransaction {
            transaction_id: Some("t1".to_string()),
            user_id: Some("u1".to_string()),
            merchant_id: Some("m1".to_string()),
            amount: Some(RawAmount::Text("100".to_string())),
            timestamp: Some("2025-09-16 10:00:00".to_string()),
            location: Some("NY".to_string()),
            payment_method: Some(String::new()),
        }
    }

    #[test]
    fn test_raw_record_validation() {
        let txn = Transaction::try_from(raw()).unwrap();

        assert_eq!(txn.transaction_id(), "t1");
        assert_eq!(txn.amount(), 100.0);
        assert_eq!(txn.timestamp(), Utc.with_ymd_and_hms(2025, 9, 16, 10, 0, 0).unwrap());
        assert_eq!(txn.location(), Some("NY"));
        assert_eq!(txn.payment_method(), None);
    }

    #[test]
    fn test_missing_field() {
        let mut record = raw();
        record.merchant_id = None;

        match Transaction::try_from(record) {
            Err(ValidationError::MissingField(field)) => assert_eq!(field, "merchant_id"),
            other => panic!("Expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_amounts() {
        let mut record = raw();
        record.amount = Some(RawAmount::Text("abc".to_string()));
        assert!(matches!(
            Transaction::try_from(record),
            Err(ValidationError::InvalidAmount(_))
        ));

        let mut record = raw();
        record.amount = Some(RawAmount::Number(-5.0));
        assert!(matches!(
            Transaction::try_from(record),
            Err(ValidationError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 9, 16, 10, 0, 0).unwrap();

        assert_eq!(parse_timestamp("2025-09-16T10:00:00Z").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-09-16T12:00:00+02:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-09-16T10:00:00").unwrap(), expected);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_naive_timestamp_with_fraction() {
        let expected = Utc.with_ymd_and_hms(2025, 9, 16, 10, 0, 0).unwrap()
            + chrono::Duration::milliseconds(123);

        assert_eq!(parse_timestamp("2025-09-16T10:00:00.123").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-09-16 10:00:00.123").unwrap(), expected);
    }

    #[test]
    fn test_empty_identifier_rejected() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            Transaction::new(" ", "u1", "m1", 1.0, ts),
            Err(ValidationError::EmptyField("transaction_id"))
        ));
    }

    #[test]
    fn test_json_deserialization_validates() {
        let ok = r#"{"transaction_id":"t9","user_id":"u1","merchant_id":"m1","amount":12.5,"timestamp":"2025-01-01T00:00:00Z"}"#;
        let txn: Transaction = serde_json::from_str(ok).unwrap();
        assert_eq!(txn.amount(), 12.5);

        let bad = r#"{"transaction_id":"t9","user_id":"u1","amount":12.5,"timestamp":"2025-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<Transaction>(bad).is_err());
    }
}
