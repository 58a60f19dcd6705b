// src/ingest/sources.rs
//! Per-format record readers

use crate::{RawTransaction, IngestError, Transaction, ValidationError};
use std::io::{BufRead, Read};

/// Stream CSV rows, matching columns by header name.
///
/// Unknown columns are ignored; missing ones surface as
/// [`ValidationError::MissingField`] on the affected rows.
pub fn read_csv<R: Read>(reader: R) -> impl Iterator<Item = Result<Transaction, ValidationError>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
        .into_deserialize::<RawTransaction>()
        .map(|row| match row {
            Ok(raw) => Transaction::try_from(raw),
            Err(e) => Err(ValidationError::Malformed(e.to_string())),
        })
}

/// Read a JSON array of records. The array itself must parse; individual
/// elements are validated lazily.
pub fn read_json<R: Read>(
    reader: R,
) -> Result<impl Iterator<Item = Result<Transaction, ValidationError>>, IngestError> {
    let records: Vec<serde_json::Value> = serde_json::from_reader(reader)?;
    Ok(records.into_iter().map(from_json_value))
}

/// Stream newline-delimited JSON objects, skipping blank lines.
pub fn read_json_lines<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = Result<Transaction, ValidationError>> {
    reader.lines().filter_map(|line| match line {
        Ok(line) if line.trim().is_empty() => None,
        Ok(line) => Some(
            serde_json::from_str::<RawTransaction>(&line)
                .map_err(|e| ValidationError::Malformed(e.to_string()))
                .and_then(Transaction::try_from),
        ),
        Err(e) => Some(Err(ValidationError::Malformed(e.to_string()))),
    })
}

fn from_json_value(value: serde_json::Value) -> Result<Transaction, ValidationError> {
    serde_json::from_value::<RawTransaction>(value)
        .map_err(|e| ValidationError::Malformed(e.to_string()))
        .and_then(Transaction::try_from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_with_extra_columns() {
        let data = "transaction_id,user_id,merchant_id,amount,timestamp,location,payment_method\n\
                    1,u1,m1,100,2025-09-16 10:00:00,NY,CreditCard\n";

        let records: Vec<_> = read_csv(data.as_bytes()).collect();
        assert_eq!(records.len(), 1);

        let txn = records[0].as_ref().unwrap();
        assert_eq!(txn.transaction_id(), "1");
        assert_eq!(txn.amount(), 100.0);
        assert_eq!(txn.location(), Some("NY"));
        assert_eq!(txn.payment_method(), Some("CreditCard"));
    }

    #[test]
    fn test_csv_missing_column() {
        let data = "transaction_id,user_id,amount,timestamp\n1,u1,100,2025-09-16 10:00:00\n";

        let records: Vec<_> = read_csv(data.as_bytes()).collect();
        assert_eq!(records[0], Err(ValidationError::MissingField("merchant_id")));
    }

    #[test]
    fn test_json_array() {
        let data = r#"[
            {"transaction_id":"1","user_id":"u1","merchant_id":"m1","amount":10.5,"timestamp":"2025-09-16T10:00:00Z"},
            {"transaction_id":"2","user_id":"u1","merchant_id":"m1","amount":"7","timestamp":"2025-09-16T10:00:01Z"},
            {"transaction_id":"3","user_id":"u1","merchant_id":"m1","timestamp":"2025-09-16T10:00:02Z"},
            42
        ]"#;

        let records: Vec<_> = read_json(data.as_bytes()).unwrap().collect();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].as_ref().unwrap().amount(), 10.5);
        assert_eq!(records[1].as_ref().unwrap().amount(), 7.0);
        assert_eq!(records[2], Err(ValidationError::MissingField("amount")));
        assert!(matches!(records[3], Err(ValidationError::Malformed(_))));
    }

    #[test]
    fn test_json_array_must_parse() {
        assert!(matches!(read_json("{not json".as_bytes()), Err(IngestError::Json(_))));
    }

    #[test]
    fn test_json_lines() {
        let data = "{\"transaction_id\":\"1\",\"user_id\":\"u1\",\"merchant_id\":\"m1\",\"amount\":1,\"timestamp\":\"2025-09-16T10:00:00Z\"}\n\
                    \n\
                    not json\n";

        let records: Vec<_> = read_json_lines(data.as_bytes()).collect();
        assert_eq!(records.len(), 2);
        assert!(records[0].is_ok());
        assert!(matches!(records[1], Err(ValidationError::Malformed(_))));
    }
}
