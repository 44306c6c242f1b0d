//! Enumeration types for constrained ledger values.

use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;

/// Effect of a transaction on the ledger.
///
/// Amounts are always non-negative; the kind alone decides whether a
/// transaction counts as money in or money out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionKind {
    /// Money coming in.
    Income,
    /// Money going out.
    Expense,
    /// Movement between own accounts; neither income nor expense.
    Transfer,
}

impl TransactionKind {
    /// Returns the lowercase wire name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }
}

impl core::fmt::Display for TransactionKind {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for TransactionKind {
    type Err = AnalyticsError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            other => Err(AnalyticsError::InvalidArgument(format!(
                "unknown transaction kind `{other}`"
            ))),
        }
    }
}

/// Calendar unit used for bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Granularity {
    /// One calendar day.
    Day,
    /// One ISO week (Monday to Sunday).
    Week,
    /// One calendar month.
    Month,
    /// One calendar year.
    Year,
}

impl Granularity {
    /// Returns the lowercase wire name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Number of trailing periods shown when the caller does not ask for
    /// a specific count.
    #[inline]
    #[must_use]
    pub const fn default_period_count(self) -> u32 {
        match self {
            Self::Day => 30,
            Self::Week | Self::Month => 12,
            Self::Year => 5,
        }
    }
}

impl core::fmt::Display for Granularity {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Granularity {
    type Err = AnalyticsError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            other => Err(AnalyticsError::InvalidArgument(format!(
                "unknown granularity `{other}`"
            ))),
        }
    }
}
