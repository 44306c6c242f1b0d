//! Transaction query criteria.

use std::collections::HashSet;

use crate::models::{AccountId, CategoryId, NaiveDate, Transaction, TransactionKind};

/// Criteria for selecting transactions from a ledger.
///
/// All criteria are combined with AND. An empty set means "any". Pending
/// transactions are excluded unless [`Self::include_pending`] is set.
///
/// # Example
///
/// ```rust
/// use ledger_trends::ledger::TransactionFilter;
/// use ledger_trends::models::{NaiveDate, TransactionKind};
///
/// let filter = TransactionFilter::new()
///     .date_range(
///         NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
///         NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
///     )
///     .kind(TransactionKind::Expense);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Start date (inclusive).
    pub date_from: Option<NaiveDate>,
    /// End date (inclusive).
    pub date_to: Option<NaiveDate>,
    /// Accepted accounts.
    pub accounts: HashSet<AccountId>,
    /// Accepted categories; uncategorized transactions never match a
    /// non-empty set.
    pub categories: HashSet<CategoryId>,
    /// Accepted transaction kinds.
    pub kinds: HashSet<TransactionKind>,
    /// Whether pending transactions are returned.
    pub include_pending: bool,
}

impl TransactionFilter {
    /// Creates a filter that matches every settled transaction.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to transactions within the given date range (inclusive).
    #[inline]
    #[must_use]
    pub const fn date_range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    /// Restricts to transactions on or after `from`.
    #[inline]
    #[must_use]
    pub const fn since(mut self, from: NaiveDate) -> Self {
        self.date_from = Some(from);
        self
    }

    /// Restricts to transactions on or before `to`.
    #[inline]
    #[must_use]
    pub const fn until(mut self, to: NaiveDate) -> Self {
        self.date_to = Some(to);
        self
    }

    /// Adds an accepted account.
    #[inline]
    #[must_use]
    pub fn account(mut self, id: AccountId) -> Self {
        let _new = self.accounts.insert(id);
        self
    }

    /// Adds an accepted category.
    #[inline]
    #[must_use]
    pub fn category(mut self, id: CategoryId) -> Self {
        let _new = self.categories.insert(id);
        self
    }

    /// Adds an accepted transaction kind.
    #[inline]
    #[must_use]
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        let _new = self.kinds.insert(kind);
        self
    }

    /// Sets whether pending transactions are returned.
    #[inline]
    #[must_use]
    pub const fn include_pending(mut self, include: bool) -> Self {
        self.include_pending = include;
        self
    }

    /// Returns `true` if the transaction satisfies all set criteria.
    #[inline]
    #[must_use]
    pub fn matches(&self, tx: &Transaction) -> bool {
        (self.include_pending || !tx.is_pending)
            && self.matches_date(tx)
            && (self.accounts.is_empty() || self.accounts.contains(&tx.account_id))
            && self.matches_category(tx)
            && (self.kinds.is_empty() || self.kinds.contains(&tx.kind))
    }

    /// Checks date range criteria.
    fn matches_date(&self, tx: &Transaction) -> bool {
        let date = tx.date();
        self.date_from.is_none_or(|from| date >= from) && self.date_to.is_none_or(|to| date <= to)
    }

    /// Checks category criteria.
    fn matches_category(&self, tx: &Transaction) -> bool {
        self.categories.is_empty()
            || tx
                .category_id
                .as_ref()
                .is_some_and(|id| self.categories.contains(id))
    }
}
