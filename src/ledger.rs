//! Ledger sources the analytics read transactions and budgets from.
//!
//! This module defines the [`LedgerSource`] (async) and
//! [`BlockingLedgerSource`] (blocking) traits via a shared macro, plus the
//! [`TransactionFilter`] passed to transaction queries.

#[cfg(feature = "storage-file")]
mod file;
mod filter;
mod memory;

#[cfg(feature = "storage-file")]
pub use file::FileLedger;
pub use filter::TransactionFilter;
pub use memory::InMemoryLedger;

/// Generates a ledger source trait (async or blocking) with all query
/// methods.
///
/// Uses `@methods` to define the method list once, and `@method` to render
/// each method in async (`impl Future + Send`) or blocking (`fn`) style.
macro_rules! define_ledger {
    // ── Entry points ────────────────────────────────────────────────
    (
        trait_name: $trait_name:ident,
        trait_doc: $trait_doc:expr,
        mode: async_mode,
    ) => {
        #[doc = $trait_doc]
        pub trait $trait_name: core::fmt::Debug + Send + Sync {
            define_ledger!(@methods async_mode);
        }
    };
    (
        trait_name: $trait_name:ident,
        trait_doc: $trait_doc:expr,
        mode: blocking,
    ) => {
        #[doc = $trait_doc]
        pub trait $trait_name: core::fmt::Debug + Send + Sync {
            define_ledger!(@methods blocking);
        }
    };

    // ── Single method list (shared between both variants) ───────────
    (@methods $mode:ident) => {
        define_ledger!(@method $mode, transactions,
            "Returns the transactions matching `filter`.\n\n# Errors\n\nReturns an error if the ledger cannot be read.",
            filter: &TransactionFilter, -> Result<Vec<Transaction>>);
        define_ledger!(@method $mode, budgets,
            "Returns the budgets whose window contains `active_at`.\n\n# Errors\n\nReturns an error if the ledger cannot be read.",
            active_at: NaiveDate, -> Result<Vec<Budget>>);
        define_ledger!(@method $mode, categories,
            "Returns all categories.\n\n# Errors\n\nReturns an error if the ledger cannot be read.",
            -> Result<Vec<Category>>);
    };

    // ── Blocking method renderer ────────────────────────────────────
    (@method blocking, $name:ident, $doc:expr,
     $($param:ident: $param_ty:ty,)* -> $ret:ty) => {
        #[doc = $doc]
        fn $name(&self $(, $param: $param_ty)*) -> $ret;
    };

    // ── Async method renderer (returns impl Future + Send) ──────────
    (@method async_mode, $name:ident, $doc:expr,
     $($param:ident: $param_ty:ty,)* -> $ret:ty) => {
        #[doc = $doc]
        fn $name(&self $(, $param: $param_ty)*)
            -> impl core::future::Future<Output = $ret> + Send;
    };
}

#[cfg(feature = "async")]
mod async_ledger {
    //! Async ledger trait definition.

    use super::TransactionFilter;
    use crate::error::Result;
    use crate::models::{Budget, Category, NaiveDate, Transaction};

    define_ledger! {
        trait_name: LedgerSource,
        trait_doc: "Async source of ledger data.\n\nAll methods take `&self`; implementations use interior mutability\n(e.g. `Mutex`) where they hold mutable state.",
        mode: async_mode,
    }
}

#[cfg(feature = "blocking")]
mod blocking_ledger {
    //! Blocking ledger trait definition.

    use super::TransactionFilter;
    use crate::error::Result;
    use crate::models::{Budget, Category, NaiveDate, Transaction};

    define_ledger! {
        trait_name: BlockingLedgerSource,
        trait_doc: "Blocking source of ledger data.\n\nAll methods take `&self`; implementations use interior mutability\n(e.g. `Mutex`) where they hold mutable state.",
        mode: blocking,
    }
}

#[cfg(feature = "async")]
pub use async_ledger::LedgerSource;
#[cfg(feature = "blocking")]
pub use blocking_ledger::BlockingLedgerSource;
