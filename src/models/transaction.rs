//! Transaction model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, CategoryId, TransactionId, TransactionKind};

/// A single ledger entry.
///
/// Transactions are validated upstream; the analytics never special-case
/// missing or malformed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Account the transaction was booked on.
    pub account_id: AccountId,
    /// Assigned category, if any.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Income, expense or transfer.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// Amount in ledger currency (>= 0).
    pub amount: f64,
    /// When the transaction happened (RFC 3339).
    pub occurred_at: DateTime<Utc>,
    /// Whether the transaction is still pending.
    #[serde(default)]
    pub is_pending: bool,
}

impl Transaction {
    /// Returns the calendar date (UTC) the transaction is bucketed on.
    #[inline]
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.occurred_at.date_naive()
    }

    /// Returns `true` for income transactions.
    #[inline]
    #[must_use]
    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    /// Returns `true` for expense transactions.
    #[inline]
    #[must_use]
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}
