//! Decoding raw contract records into display records

use super::state::TransactionRecord;
use crate::gateway::TransferStruct;
use crate::units::format_ether;
use crate::{Error, Result};
use alloy::primitives::U256;
use chrono::{DateTime, Local};

/// en-US style, matching what browsers print for a local date
const DISPLAY_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

impl TryFrom<TransferStruct> for TransactionRecord {
    type Error = Error;

    fn try_from(raw: TransferStruct) -> Result<Self> {
        let timestamp_secs = timestamp_secs(raw.timestamp)?;
        let timestamp = display_timestamp(timestamp_secs)?;

        Ok(Self {
            sender: raw.sender.to_string(),
            recipient: raw.receiver.to_string(),
            amount: format_ether(raw.amount),
            amount_wei: raw.amount,
            message: raw.message,
            keyword: raw.keyword,
            timestamp,
            timestamp_secs,
        })
    }
}

fn timestamp_secs(raw: U256) -> Result<u64> {
    if raw > U256::from(i64::MAX as u64) {
        return Err(Error::Decode(format!("timestamp {} out of range", raw)));
    }
    Ok(raw.to::<u64>())
}

fn display_timestamp(secs: u64) -> Result<String> {
    let utc = DateTime::from_timestamp(secs as i64, 0)
        .ok_or_else(|| Error::Decode(format!("timestamp {} is not a valid date", secs)))?;
    Ok(utc.with_timezone(&Local).format(DISPLAY_FORMAT).to_string())
}

/// Decode every record, dropping the ones that fail
pub fn decode_history(raw: Vec<TransferStruct>) -> Vec<TransactionRecord> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, record)| match TransactionRecord::try_from(record) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!(index, error = %e, "Dropping undecodable transaction record");
                None
            }
        })
        .collect()
}
