//! Budget burn-down: spending against each active budget's limit.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Budget, BudgetId, CategoryId, Transaction};

/// Percentage from which a budget is flagged as close to its limit.
pub const WARNING_THRESHOLD_PCT: f64 = 80.0;

/// Fallback display name for budgets without a name or category.
const UNNAMED_BUDGET: &str = "Budget";

/// How urgently a budget needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertLevel {
    /// Below [`WARNING_THRESHOLD_PCT`].
    Normal,
    /// At or above [`WARNING_THRESHOLD_PCT`], at most 100 %.
    Warning,
    /// Spending is over the limit.
    Exceeded,
    /// The limit is zero, so no percentage exists.
    Unavailable,
}

impl AlertLevel {
    /// Classifies a spent percentage.
    #[inline]
    #[must_use]
    pub fn from_percentage(percentage: Option<f64>) -> Self {
        match percentage {
            None => Self::Unavailable,
            Some(pct) if pct > 100.0_f64 => Self::Exceeded,
            Some(pct) if pct >= WARNING_THRESHOLD_PCT => Self::Warning,
            Some(_) => Self::Normal,
        }
    }
}

/// Spending progress of one budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProgress {
    /// Budget identifier.
    pub budget_id: BudgetId,
    /// Display name.
    pub display_name: String,
    /// Category the budget is scoped to.
    pub category_id: Option<CategoryId>,
    /// Spending limit.
    pub limit_amount: f64,
    /// Matching expenses inside the budget window.
    pub spent: f64,
    /// `limit_amount - spent`; negative when overspent.
    pub remaining: f64,
    /// `spent / limit_amount * 100`, uncapped; `None` for a zero limit.
    pub percentage: Option<f64>,
    /// Share of the budget window elapsed at evaluation time.
    pub elapsed_pct: Option<f64>,
    /// Alert classification of `percentage`.
    pub alert_level: AlertLevel,
}

/// Spent share of a limit in percent; `None` when the limit is zero.
#[inline]
#[must_use]
pub fn budget_percentage(spent: f64, limit_amount: f64) -> Option<f64> {
    if limit_amount == 0.0_f64 {
        return None;
    }
    let pct = spent / limit_amount * 100.0_f64;
    pct.is_finite().then_some(pct)
}

/// Returns `true` if the budget window contains `today`.
#[inline]
#[must_use]
pub fn is_active(budget: &Budget, today: NaiveDate) -> bool {
    budget.covers(today)
}

/// Evaluates one budget against the ledger.
///
/// Counts settled expense transactions dated inside the budget window and,
/// for a category-scoped budget, booked on that category.
#[must_use]
pub fn evaluate_budget(
    budget: &Budget,
    transactions: &[Transaction],
    today: NaiveDate,
) -> BudgetProgress {
    let spent: f64 = transactions
        .iter()
        .filter(|tx| counts_toward(budget, tx))
        .map(|tx| tx.amount)
        .sum();
    let percentage = budget_percentage(spent, budget.amount);
    BudgetProgress {
        budget_id: budget.id.clone(),
        display_name: budget_display_name(budget),
        category_id: budget.category_id.clone(),
        limit_amount: budget.amount,
        spent,
        remaining: budget.amount - spent,
        percentage,
        elapsed_pct: elapsed_pct(budget, today),
        alert_level: AlertLevel::from_percentage(percentage),
    }
}

/// Evaluates every budget active at `today`, ranked for alerting.
#[must_use]
pub fn evaluate_budgets(
    budgets: &[Budget],
    transactions: &[Transaction],
    today: NaiveDate,
) -> Vec<BudgetProgress> {
    let mut progress: Vec<BudgetProgress> = budgets
        .iter()
        .filter(|budget| is_active(budget, today))
        .map(|budget| evaluate_budget(budget, transactions, today))
        .collect();
    rank(&mut progress);
    progress
}

/// Sorts by percentage descending (undefined percentages last), ties by
/// display name, then budget ID.
#[inline]
pub fn rank(progress: &mut [BudgetProgress]) {
    progress.sort_by(|a, b| match (a.percentage, b.percentage) {
        (Some(pa), Some(pb)) => pb.total_cmp(&pa),
        (Some(_), None) => core::cmp::Ordering::Less,
        (None, Some(_)) => core::cmp::Ordering::Greater,
        (None, None) => core::cmp::Ordering::Equal,
    }
    .then_with(|| a.display_name.cmp(&b.display_name))
    .then_with(|| a.budget_id.cmp(&b.budget_id)));
}

/// Returns the `n` most urgent budgets that have a defined percentage.
#[must_use]
pub fn top_alerts(progress: &[BudgetProgress], n: usize) -> Vec<BudgetProgress> {
    let mut ranked: Vec<BudgetProgress> = progress
        .iter()
        .filter(|row| row.percentage.is_some())
        .cloned()
        .collect();
    rank(&mut ranked);
    ranked.truncate(n);
    ranked
}

/// Whether a transaction is spending against the budget.
fn counts_toward(budget: &Budget, tx: &Transaction) -> bool {
    tx.is_expense()
        && !tx.is_pending
        && budget.covers(tx.date())
        && budget
            .category_id
            .as_ref()
            .is_none_or(|category| tx.category_id.as_ref() == Some(category))
}

/// Budget name, else its category name, else a generic label.
fn budget_display_name(budget: &Budget) -> String {
    let name = budget.name.trim();
    if !name.is_empty() {
        return name.to_owned();
    }
    budget
        .category_name
        .as_deref()
        .map(str::trim)
        .filter(|category| !category.is_empty())
        .unwrap_or(UNNAMED_BUDGET)
        .to_owned()
}

/// Percentage of the budget window's days that have started by `today`.
fn elapsed_pct(budget: &Budget, today: NaiveDate) -> Option<f64> {
    let total_days = budget
        .period_end
        .signed_duration_since(budget.period_start)
        .num_days()
        .checked_add(1)?;
    if total_days <= 0 {
        return None;
    }
    let elapsed_days = today
        .min(budget.period_end)
        .signed_duration_since(budget.period_start)
        .num_days()
        .checked_add(1)?
        .max(0);
    let elapsed = f64::from(i32::try_from(elapsed_days).ok()?);
    let total = f64::from(i32::try_from(total_days).ok()?);
    Some(elapsed / total * 100.0_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;
    use crate::trends::tests::{date, tx};

    fn budget(id: &str, name: &str, category: Option<&str>, amount: f64) -> Budget {
        Budget {
            id: BudgetId::from(id),
            name: name.to_owned(),
            category_id: category.map(CategoryId::from),
            category_name: None,
            amount,
            period_start: date(2024, 5, 1),
            period_end: date(2024, 5, 31),
        }
    }

    #[test]
    fn overspent_budget() {
        let transactions = vec![
            tx("t1", TransactionKind::Expense, 200.0, date(2024, 5, 3), Some("food")),
            tx("t2", TransactionKind::Expense, 50.0, date(2024, 5, 20), Some("food")),
        ];
        let progress = evaluate_budget(
            &budget("b1", "Food", Some("food"), 200.0),
            &transactions,
            date(2024, 5, 21),
        );
        assert_eq!(progress.percentage, Some(125.0));
        assert!((progress.remaining + 50.0).abs() < f64::EPSILON);
        assert_eq!(progress.alert_level, AlertLevel::Exceeded);
    }

    #[test]
    fn zero_limit_has_undefined_percentage() {
        let transactions = vec![tx(
            "t1",
            TransactionKind::Expense,
            10.0,
            date(2024, 5, 3),
            None,
        )];
        let progress = evaluate_budget(
            &budget("b1", "Fun", None, 0.0),
            &transactions,
            date(2024, 5, 3),
        );
        assert!(progress.percentage.is_none());
        assert_eq!(progress.alert_level, AlertLevel::Unavailable);
        assert!((progress.remaining + 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn only_matching_settled_expenses_count() {
        let mut pending = tx(
            "t4",
            TransactionKind::Expense,
            1000.0,
            date(2024, 5, 4),
            Some("food"),
        );
        pending.is_pending = true;
        let transactions = vec![
            tx("t1", TransactionKind::Expense, 40.0, date(2024, 5, 2), Some("food")),
            tx("t2", TransactionKind::Expense, 40.0, date(2024, 5, 2), Some("rent")),
            tx("t3", TransactionKind::Income, 40.0, date(2024, 5, 2), Some("food")),
            tx("t5", TransactionKind::Expense, 40.0, date(2024, 4, 30), Some("food")),
            pending,
        ];
        let scoped = evaluate_budget(
            &budget("b1", "Food", Some("food"), 100.0),
            &transactions,
            date(2024, 5, 10),
        );
        assert!((scoped.spent - 40.0).abs() < f64::EPSILON);

        let unscoped = evaluate_budget(
            &budget("b2", "All", None, 100.0),
            &transactions,
            date(2024, 5, 10),
        );
        assert!((unscoped.spent - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ranking_is_descending_with_name_tie_break() {
        let transactions = vec![
            tx("t1", TransactionKind::Expense, 90.0, date(2024, 5, 2), Some("a")),
            tx("t2", TransactionKind::Expense, 50.0, date(2024, 5, 2), Some("b")),
            tx("t3", TransactionKind::Expense, 50.0, date(2024, 5, 2), Some("c")),
        ];
        let budgets = vec![
            budget("b-c", "Charlie", Some("c"), 100.0),
            budget("b-b", "Bravo", Some("b"), 100.0),
            budget("b-a", "Alpha", Some("a"), 100.0),
            budget("b-z", "Zero", Some("z"), 0.0),
        ];
        let ranked = evaluate_budgets(&budgets, &transactions, date(2024, 5, 15));
        let names: Vec<&str> = ranked.iter().map(|p| p.display_name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Bravo", "Charlie", "Zero"]);

        let alerts = top_alerts(&ranked, 3);
        let names: Vec<&str> = alerts.iter().map(|p| p.display_name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Bravo", "Charlie"]);
        assert_eq!(alerts[0].alert_level, AlertLevel::Warning);
        assert_eq!(top_alerts(&ranked, 10).len(), 3);
    }

    #[test]
    fn inactive_budgets_are_skipped() {
        let budgets = vec![budget("b1", "May", None, 100.0)];
        assert!(evaluate_budgets(&budgets, &[], date(2024, 6, 1)).is_empty());
        assert_eq!(evaluate_budgets(&budgets, &[], date(2024, 5, 31)).len(), 1);
    }

    #[test]
    fn display_name_fallbacks() {
        let mut b = budget("b1", "  ", Some("food"), 100.0);
        b.category_name = Some("Food".to_owned());
        assert_eq!(evaluate_budget(&b, &[], date(2024, 5, 1)).display_name, "Food");
        b.category_name = None;
        assert_eq!(
            evaluate_budget(&b, &[], date(2024, 5, 1)).display_name,
            UNNAMED_BUDGET
        );
    }

    #[test]
    fn elapsed_pace() {
        let b = budget("b1", "May", None, 100.0);
        let last_day = evaluate_budget(&b, &[], date(2024, 5, 31));
        assert_eq!(last_day.elapsed_pct, Some(100.0));
        let first_day = evaluate_budget(&b, &[], date(2024, 5, 1));
        assert!((first_day.elapsed_pct.unwrap() - 100.0 / 31.0).abs() < 1e-9);
        let before = evaluate_budget(&b, &[], date(2024, 4, 1));
        assert_eq!(before.elapsed_pct, Some(0.0));
    }
}
