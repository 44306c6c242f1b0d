//! Budget model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{BudgetId, CategoryId};

/// A spending limit over an inclusive calendar window, optionally scoped
/// to a single category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// Unique identifier.
    pub id: BudgetId,
    /// User-facing name (may be empty).
    #[serde(default)]
    pub name: String,
    /// Category the budget is scoped to; `None` covers all expenses.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// Denormalized category name for display.
    #[serde(default)]
    pub category_name: Option<String>,
    /// Spending limit.
    pub amount: f64,
    /// First day of the budget window.
    pub period_start: NaiveDate,
    /// Last day of the budget window (inclusive).
    pub period_end: NaiveDate,
}

impl Budget {
    /// Returns `true` if `date` falls inside the budget window.
    #[inline]
    #[must_use]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.period_start <= date && date <= self.period_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_scoped_budget() {
        let json = r#"{
            "id": "b-groceries",
            "name": "Groceries",
            "categoryId": "cat-food",
            "categoryName": "Food",
            "amount": 400.0,
            "periodStart": "2024-01-01",
            "periodEnd": "2024-01-31"
        }"#;
        let budget: Budget = serde_json::from_str(json).unwrap();
        assert_eq!(budget.category_id, Some(CategoryId::from("cat-food")));
        assert!((budget.amount - 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn deserialize_unscoped_budget() {
        let json = r#"{
            "id": "b-all",
            "amount": 2000,
            "periodStart": "2024-01-01",
            "periodEnd": "2024-12-31"
        }"#;
        let budget: Budget = serde_json::from_str(json).unwrap();
        assert!(budget.category_id.is_none());
        assert!(budget.name.is_empty());
    }

    #[test]
    fn covers_is_inclusive() {
        let budget = Budget {
            id: BudgetId::from("b-1"),
            name: "Monthly".to_owned(),
            category_id: None,
            category_name: None,
            amount: 100.0,
            period_start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        };
        assert!(budget.covers(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert!(budget.covers(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()));
        assert!(!budget.covers(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()));
        assert!(!budget.covers(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
    }
}
