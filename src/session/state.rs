//! Session state exposed to presentation code

use crate::error::{Error, ErrorKind};
use alloy::primitives::U256;
use serde::{Deserialize, Serialize, Serializer};
use std::str::FromStr;

/// Decimal string, the same form the count is persisted in
fn serialize_decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Pending transfer form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub recipient: String,
    /// Decimal ether amount as typed
    pub amount: String,
    pub keyword: String,
    pub message: String,
}

/// One field of a [`TransferRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferField {
    Recipient,
    Amount,
    Keyword,
    Message,
}

impl FromStr for TransferField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "recipient" | "addressTo" => Ok(TransferField::Recipient),
            "amount" => Ok(TransferField::Amount),
            "keyword" => Ok(TransferField::Keyword),
            "message" => Ok(TransferField::Message),
            other => Err(Error::FieldUpdate(format!("unknown field '{}'", other))),
        }
    }
}

impl TransferRequest {
    pub fn set(&mut self, field: TransferField, value: String) {
        let slot = match field {
            TransferField::Recipient => &mut self.recipient,
            TransferField::Amount => &mut self.amount,
            TransferField::Keyword => &mut self.keyword,
            TransferField::Message => &mut self.message,
        };
        *slot = value;
    }

    pub fn get(&self, field: TransferField) -> &str {
        match field {
            TransferField::Recipient => &self.recipient,
            TransferField::Amount => &self.amount,
            TransferField::Keyword => &self.keyword,
            TransferField::Message => &self.message,
        }
    }
}

/// A decoded transfer from the contract's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub sender: String,
    pub recipient: String,
    /// Ether amount for display ("1.5")
    pub amount: String,
    #[serde(serialize_with = "serialize_decimal")]
    pub amount_wei: U256,
    pub message: String,
    pub keyword: String,
    /// Local time for display
    pub timestamp: String,
    pub timestamp_secs: u64,
}

/// Where the session is in the connect/submit cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Submitting,
}

/// Last error, ready for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for SessionError {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    /// Authorized account, empty when disconnected
    pub account: String,
    pub request: TransferRequest,
    pub history: Vec<TransactionRecord>,
    /// True only while a submission is waiting on the wallet or the chain
    pub in_flight: bool,
    /// Cached on-chain transaction count
    #[serde(serialize_with = "serialize_decimal")]
    pub transaction_count: U256,
    pub connection: ConnectionState,
    pub error: Option<SessionError>,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        !self.account.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names() {
        assert_eq!("addressTo".parse::<TransferField>().unwrap(), TransferField::Recipient);
        assert_eq!("message".parse::<TransferField>().unwrap(), TransferField::Message);
        assert!(matches!(
            "amountt".parse::<TransferField>(),
            Err(Error::FieldUpdate(_))
        ));
    }

    #[test]
    fn test_last_write_wins_per_field() {
        let mut request = TransferRequest::default();
        let writes = [
            (TransferField::Amount, "1"),
            (TransferField::Recipient, "0xabc"),
            (TransferField::Amount, "2.5"),
            (TransferField::Message, "lunch"),
            (TransferField::Recipient, "0xdef"),
        ];
        for (field, value) in writes {
            request.set(field, value.to_string());
        }

        assert_eq!(request.get(TransferField::Recipient), "0xdef");
        assert_eq!(request.get(TransferField::Amount), "2.5");
        assert_eq!(request.get(TransferField::Message), "lunch");
        assert_eq!(request.get(TransferField::Keyword), "");
    }

    #[test]
    fn test_counts_serialize_as_decimal() {
        let state = SessionState {
            transaction_count: U256::from(26),
            ..SessionState::default()
        };
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["transaction_count"], "26");
        assert_eq!(value["connection"], "disconnected");

        let record = TransactionRecord {
            sender: String::new(),
            recipient: String::new(),
            amount: "1.5".to_string(),
            amount_wei: U256::from(1_500_000_000_000_000_000u128),
            message: String::new(),
            keyword: String::new(),
            timestamp: String::new(),
            timestamp_secs: 0,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["amount_wei"], "1500000000000000000");
    }

    #[test]
    fn test_session_error_from_error() {
        let err = SessionError::from(&Error::NoAuthorizedAccounts);
        assert_eq!(err.kind, ErrorKind::NoAuthorizedAccounts);
        assert_eq!(
            err.message,
            "No authorized accounts found. Please connect your wallet."
        );
    }
}
