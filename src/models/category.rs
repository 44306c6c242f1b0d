//! Category model.

use serde::{Deserialize, Serialize};

use super::CategoryId;

/// A transaction category. Only its display name matters to the analytics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique identifier.
    pub id: CategoryId,
    /// Display name.
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_category() {
        let json = r#"{"id": "cat-rent", "name": "Rent"}"#;
        let category: Category = serde_json::from_str(json).unwrap();
        assert_eq!(category.id, CategoryId::from("cat-rent"));
        assert_eq!(category.name, "Rent");
    }
}
