//! Category distribution of transactions within a date range.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Category, CategoryId, Transaction, TransactionKind};

/// Label used for transactions without a category.
pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Total and share of one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    /// Category, or `None` for the uncategorized bucket.
    pub category_id: Option<CategoryId>,
    /// Display name.
    pub display_name: String,
    /// Sum of matching amounts.
    pub total: f64,
    /// Percentage of the sum over all returned rows (0 to 100).
    pub share: f64,
    /// Number of transactions summed.
    pub transaction_count: usize,
}

impl CategorySummary {
    /// Returns `true` for the bucket of transactions without a category.
    #[inline]
    #[must_use]
    pub const fn is_uncategorized(&self) -> bool {
        self.category_id.is_none()
    }
}

/// Sums transactions of `kind` dated inside `[from, to]` per category.
///
/// Missing bounds are open. Transactions without a category are grouped
/// under [`UNCATEGORIZED_LABEL`] rather than dropped. Rows are sorted by
/// total descending, ties by display name. When the grand total is zero
/// the result is empty.
#[must_use]
pub fn summarize_categories(
    transactions: &[Transaction],
    categories: &[Category],
    kind: TransactionKind,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<CategorySummary> {
    let mut totals: HashMap<Option<&CategoryId>, (f64, usize)> = HashMap::new();
    for tx in transactions {
        let date = tx.date();
        if tx.kind != kind
            || from.is_some_and(|start| date < start)
            || to.is_some_and(|end| date > end)
        {
            continue;
        }
        let entry = totals.entry(tx.category_id.as_ref()).or_insert((0.0, 0));
        entry.0 += tx.amount;
        entry.1 += 1;
    }

    let grand_total: f64 = totals.values().map(|&(total, _)| total).sum();
    if grand_total <= 0.0_f64 {
        return Vec::new();
    }

    let names: HashMap<&CategoryId, &str> = categories
        .iter()
        .map(|category| (&category.id, category.name.as_str()))
        .collect();

    let mut rows: Vec<CategorySummary> = totals
        .into_iter()
        .map(|(id, (total, transaction_count))| CategorySummary {
            display_name: display_name(id, &names),
            category_id: id.cloned(),
            total,
            share: total / grand_total * 100.0_f64,
            transaction_count,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.display_name.cmp(&b.display_name))
    });
    rows
}

/// Resolves a category's display name, falling back to its raw ID.
fn display_name(id: Option<&CategoryId>, names: &HashMap<&CategoryId, &str>) -> String {
    id.map_or_else(
        || UNCATEGORIZED_LABEL.to_owned(),
        |category| {
            names
                .get(category)
                .map_or_else(|| category.to_string(), |&name| name.to_owned())
        },
    )
}
