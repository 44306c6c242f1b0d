//! Newtype wrappers for entity identifiers.
//!
//! The ledger hands out opaque string identifiers for every entity; the
//! wrappers keep a category ID from being passed where an account ID is
//! expected.

use serde::{Deserialize, Serialize};

/// Defines a newtype ID wrapping a `String`.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from the given string.
            #[inline]
            #[must_use]
            pub const fn new(value: String) -> Self {
                Self(value)
            }

            /// Returns a reference to the inner string.
            #[inline]
            #[must_use]
            pub fn as_inner(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper and returns the inner string.
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

define_string_id! {
    /// Unique identifier for a ledger transaction.
    TransactionId
}

define_string_id! {
    /// Unique identifier for an account.
    AccountId
}

define_string_id! {
    /// Unique identifier for a spending/income category.
    CategoryId
}

define_string_id! {
    /// Unique identifier for a budget.
    BudgetId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_id_serializes_as_plain_string() {
        let id = CategoryId::new("cat-food".to_owned());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""cat-food""#);
        let deserialized: CategoryId = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn string_id_display() {
        let id = AccountId::new("acc-123".to_owned());
        assert_eq!(id.to_string(), "acc-123");
    }

    #[test]
    fn id_from_str_and_string() {
        let from_str: BudgetId = "b-1".into();
        let from_string: BudgetId = "b-1".to_owned().into();
        assert_eq!(from_str, from_string);
        assert_eq!(from_str.as_inner(), "b-1");
    }

    #[test]
    fn id_into_inner() {
        let id = TransactionId::new("tx-9".to_owned());
        assert_eq!(id.into_inner(), "tx-9");
    }

    #[test]
    fn ids_order_lexicographically() {
        let a = CategoryId::from("alpha");
        let b = CategoryId::from("beta");
        assert!(a < b);
    }
}
