//! In-memory ledger.
//!
//! Provides [`InMemoryLedger`], a thread-safe in-memory implementation of
//! the ledger source traits, seeded through its `insert_*` methods. Used
//! by tests and by embedders that already hold their data in memory.

use std::sync::Mutex;

#[cfg(feature = "async")]
use core::future::{self, Future};

use super::TransactionFilter;
use crate::error::{AnalyticsError, Result};
use crate::models::{Budget, Category, NaiveDate, Transaction};

/// Thread-safe in-memory ledger.
///
/// This type implements both [`super::LedgerSource`] (async) and
/// [`super::BlockingLedgerSource`] (blocking).
///
/// # Example
///
/// ```rust
/// use ledger_trends::ledger::InMemoryLedger;
///
/// let ledger = InMemoryLedger::new();
/// // Use with the Analytics or AnalyticsBlocking builders:
/// // AnalyticsBlocking::builder().source(ledger).build()
/// ```
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    /// All state behind a single mutex for thread-safe interior mutability.
    inner: Mutex<Inner>,
}

/// Inner mutable state.
#[derive(Debug, Default)]
struct Inner {
    /// Stored transactions.
    transactions: Vec<Transaction>,
    /// Stored budgets.
    budgets: Vec<Budget>,
    /// Stored categories.
    categories: Vec<Category>,
}

impl InMemoryLedger {
    /// Creates a new empty ledger.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends transactions.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    #[inline]
    pub fn insert_transactions<I: IntoIterator<Item = Transaction>>(&self, items: I) -> Result<()> {
        self.with_lock(|inner| inner.transactions.extend(items))
    }

    /// Appends budgets.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    #[inline]
    pub fn insert_budgets<I: IntoIterator<Item = Budget>>(&self, items: I) -> Result<()> {
        self.with_lock(|inner| inner.budgets.extend(items))
    }

    /// Appends categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the internal lock is poisoned.
    #[inline]
    pub fn insert_categories<I: IntoIterator<Item = Category>>(&self, items: I) -> Result<()> {
        self.with_lock(|inner| inner.categories.extend(items))
    }

    /// Acquires the inner lock and applies a closure.
    fn with_lock<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> Result<R> {
        let mut inner = self.inner.lock().map_err(|err| lock_error(&err))?;
        Ok(f(&mut inner))
    }

    /// Clones the transactions matching `filter`.
    pub(crate) fn filtered_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        self.with_lock(|inner| {
            inner
                .transactions
                .iter()
                .filter(|tx| filter.matches(tx))
                .cloned()
                .collect()
        })
    }

    /// Clones the budgets active at `active_at`.
    pub(crate) fn active_budgets(&self, active_at: NaiveDate) -> Result<Vec<Budget>> {
        self.with_lock(|inner| {
            inner
                .budgets
                .iter()
                .filter(|budget| budget.covers(active_at))
                .cloned()
                .collect()
        })
    }

    /// Clones all categories.
    pub(crate) fn all_categories(&self) -> Result<Vec<Category>> {
        self.with_lock(|inner| inner.categories.clone())
    }
}

/// Wraps a mutex poison error.
fn lock_error<T>(err: &std::sync::PoisonError<T>) -> AnalyticsError {
    AnalyticsError::Source(err.to_string().into())
}

// ── BlockingLedgerSource implementation ────────────────────────────────

#[cfg(feature = "blocking")]
impl super::BlockingLedgerSource for InMemoryLedger {
    #[inline]
    fn transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        self.filtered_transactions(filter)
    }

    #[inline]
    fn budgets(&self, active_at: NaiveDate) -> Result<Vec<Budget>> {
        self.active_budgets(active_at)
    }

    #[inline]
    fn categories(&self) -> Result<Vec<Category>> {
        self.all_categories()
    }
}

// ── LedgerSource (async) implementation ────────────────────────────────

#[cfg(feature = "async")]
impl super::LedgerSource for InMemoryLedger {
    #[inline]
    fn transactions(
        &self,
        filter: &TransactionFilter,
    ) -> impl Future<Output = Result<Vec<Transaction>>> + Send {
        future::ready(self.filtered_transactions(filter))
    }

    #[inline]
    fn budgets(&self, active_at: NaiveDate) -> impl Future<Output = Result<Vec<Budget>>> + Send {
        future::ready(self.active_budgets(active_at))
    }

    #[inline]
    fn categories(&self) -> impl Future<Output = Result<Vec<Category>>> + Send {
        future::ready(self.all_categories())
    }
}
