//! Transaction records and the hierarchical (JSON) transaction feed.

use crate::{
    error::{BatchError, BatchResult},
    types::{AccountId, TransactionId},
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub transaction_id: TransactionId,
    pub account_id:     AccountId,
    pub description:    String,
    /// Signed by the feed; summing credit and debit gives the balance delta.
    pub credit:         Option<Decimal>,
    pub debit:          Option<Decimal>,
    pub timestamp:      NaiveDateTime,
}

impl Transaction {
    /// Net delta this transaction applies to its account.
    pub fn transaction_amount(&self) -> Decimal {
        match (self.credit, self.debit) {
            (Some(credit), Some(debit)) => credit + debit,
            (Some(credit), None)        => credit,
            (None, Some(debit))         => debit,
            (None, None)                => Decimal::ZERO,
        }
    }
}

/// One `transaction` fragment as it appears in the feed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionFragment {
    transaction_id: TransactionId,
    account_id:     AccountId,
    #[serde(default)]
    description:    Option<String>,
    #[serde(default)]
    credit:         Option<Decimal>,
    #[serde(default)]
    debit:          Option<Decimal>,
    timestamp:      String,
}

#[derive(Debug, Deserialize)]
struct TransactionDocument {
    transactions: Vec<TransactionFragment>,
}

/// Parsed transaction feed. Yields fragments in document order.
pub struct TransactionFeed {
    fragments: std::vec::IntoIter<TransactionFragment>,
    timestamp_format: String,
    position: u64,
}

impl TransactionFeed {
    pub fn open(path: impl AsRef<Path>, timestamp_format: &str) -> BatchResult<Self> {
        let file = File::open(path.as_ref())?;
        let document: TransactionDocument = serde_json::from_reader(BufReader::new(file))?;
        Ok(Self::from_document(document, timestamp_format))
    }

    pub fn parse_str(json: &str, timestamp_format: &str) -> BatchResult<Self> {
        let document: TransactionDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(document, timestamp_format))
    }

    fn from_document(document: TransactionDocument, timestamp_format: &str) -> Self {
        Self {
            fragments: document.transactions.into_iter(),
            timestamp_format: timestamp_format.to_string(),
            position: 0,
        }
    }

    /// Number of fragments consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn next_transaction(&mut self) -> BatchResult<Option<Transaction>> {
        let Some(fragment) = self.fragments.next() else {
            return Ok(None);
        };
        self.position += 1;

        let timestamp = NaiveDateTime::parse_from_str(fragment.timestamp.trim(), &self.timestamp_format)
            .map_err(|_| BatchError::FormatError {
                record: self.position,
                field: "timestamp",
                value: fragment.timestamp.clone(),
            })?;

        Ok(Some(Transaction {
            transaction_id: fragment.transaction_id,
            account_id:     fragment.account_id,
            description:    fragment.description.unwrap_or_default(),
            credit:         fragment.credit,
            debit:          fragment.debit,
            timestamp,
        }))
    }
}
