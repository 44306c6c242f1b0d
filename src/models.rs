//! Ledger entities consumed by the analytics.
//!
//! Strongly-typed transactions, budgets and categories, newtype ID
//! wrappers, and enumeration types for constrained values.

mod budget;
mod category;
mod enums;
mod ids;
mod transaction;

pub use budget::Budget;
pub use category::Category;
pub use chrono::{DateTime, NaiveDate, Utc};
pub use enums::{Granularity, TransactionKind};
pub use ids::{AccountId, BudgetId, CategoryId, TransactionId};
pub use transaction::Transaction;
