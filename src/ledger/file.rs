//! JSON-file-based ledger.
//!
//! Reads each entity type from a separate JSON file under a configurable
//! directory (default: `$XDG_DATA_HOME/ledger-trends/`). The ledger never
//! writes to that directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[cfg(feature = "async")]
use core::future::Future;

use super::TransactionFilter;
use crate::error::{AnalyticsError, Result};
use crate::models::{Budget, Category, NaiveDate, Transaction};

/// Application name used for the XDG data directory.
const APP_NAME: &str = "ledger-trends";

/// File name for transactions.
const TRANSACTIONS_FILE: &str = "transactions.json";
/// File name for budgets.
const BUDGETS_FILE: &str = "budgets.json";
/// File name for categories.
const CATEGORIES_FILE: &str = "categories.json";
/// Sentinel file used for cross-process file locking.
const LOCK_FILE: &str = "ledger.lock";

/// File-backed ledger reading JSON arrays.
///
/// The ledger only reads: opening it never creates the directory or any
/// file, and a missing directory or entity file reads as an empty list.
///
/// # Concurrency
///
/// Reads hold an in-process [`Mutex`]. When a writer maintains a
/// `ledger.lock` sentinel, reads also take a shared advisory lock on it, so
/// a writer holding the exclusive lock never exposes a half-written file.
///
/// # File layout
///
/// ```text
/// <dir>/
///   ledger.lock           (optional cross-process lock sentinel)
///   transactions.json
///   budgets.json
///   categories.json
/// ```
#[derive(Debug)]
pub struct FileLedger {
    /// Root directory containing all JSON files.
    dir: PathBuf,
    /// Mutex serializing concurrent in-process access.
    lock: Mutex<()>,
}

impl FileLedger {
    /// Opens a ledger rooted at the given directory.
    ///
    /// Nothing is created. The directory may be missing or read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` exists but is not a directory, or cannot
    /// be inspected.
    #[inline]
    pub fn new(dir: PathBuf) -> Result<Self> {
        match fs::metadata(&dir) {
            Ok(meta) if !meta.is_dir() => {
                return Err(AnalyticsError::Source(
                    format!("{} is not a directory", dir.display()).into(),
                ));
            }
            Ok(_) => tracing::debug!(dir = %dir.display(), "opened file ledger"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(dir = %dir.display(), "ledger directory missing, reading as empty");
            }
            Err(err) => return Err(source_io_error(err)),
        }
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    /// Returns the default XDG-compliant data directory for this application.
    ///
    /// On Linux: `$XDG_DATA_HOME/ledger-trends/` (typically
    /// `~/.local/share/ledger-trends/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    #[inline]
    pub fn default_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|data_path| data_path.join(APP_NAME))
            .ok_or_else(|| {
                AnalyticsError::Source("could not determine platform data directory".into())
            })
    }

    /// Returns the directory the ledger reads from.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// Acquires an in-process mutex guard and, if `ledger.lock` exists, a
    /// shared (read) file lock, executes `op`, then releases the file lock.
    fn with_shared_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        let lock_file = match fs::File::open(self.dir.join(LOCK_FILE)) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return op(),
            Err(err) => return Err(source_io_error(err)),
        };
        lock_file.lock_shared().map_err(source_io_error)?;
        let result = op();
        // Only surface the unlock error when the operation succeeded;
        // otherwise the original error is more useful.
        if let Err(err) = lock_file.unlock()
            && result.is_ok()
        {
            return Err(source_io_error(err));
        }
        result
    }

    /// Reads and deserializes a JSON file. Returns an empty `Vec` if the
    /// file does not exist.
    fn read_entities<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        let path = self.dir.join(name);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                let items: Vec<T> = serde_json::from_str(&contents)?;
                tracing::debug!(file = name, count = items.len(), "read ledger file");
                Ok(items)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(file = name, "ledger file missing, treating as empty");
                Ok(Vec::new())
            }
            Err(err) => Err(source_io_error(err)),
        }
    }

    /// Reads transactions and applies `filter`.
    fn read_transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        self.with_shared_lock(|| {
            let mut items: Vec<Transaction> = self.read_entities(TRANSACTIONS_FILE)?;
            items.retain(|tx| filter.matches(tx));
            Ok(items)
        })
    }

    /// Reads budgets active at `active_at`.
    fn read_budgets(&self, active_at: NaiveDate) -> Result<Vec<Budget>> {
        self.with_shared_lock(|| {
            let mut items: Vec<Budget> = self.read_entities(BUDGETS_FILE)?;
            items.retain(|budget| budget.covers(active_at));
            Ok(items)
        })
    }

    /// Reads all categories.
    fn read_categories(&self) -> Result<Vec<Category>> {
        self.with_shared_lock(|| self.read_entities(CATEGORIES_FILE))
    }
}

// ── Free-standing helpers ───────────────────────────────────────────────

/// Wraps an I/O error into an [`AnalyticsError::Source`].
fn source_io_error(err: std::io::Error) -> AnalyticsError {
    AnalyticsError::Source(Box::new(err))
}

/// Wraps a mutex poison error into an [`AnalyticsError::Source`].
fn lock_poison_error<T>(err: &std::sync::PoisonError<T>) -> AnalyticsError {
    AnalyticsError::Source(err.to_string().into())
}

// ── BlockingLedgerSource implementation ────────────────────────────────

#[cfg(feature = "blocking")]
impl super::BlockingLedgerSource for FileLedger {
    #[inline]
    fn transactions(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        self.read_transactions(filter)
    }

    #[inline]
    fn budgets(&self, active_at: NaiveDate) -> Result<Vec<Budget>> {
        self.read_budgets(active_at)
    }

    #[inline]
    fn categories(&self) -> Result<Vec<Category>> {
        self.read_categories()
    }
}

// ── LedgerSource (async) implementation ────────────────────────────────

#[cfg(feature = "async")]
impl super::LedgerSource for FileLedger {
    #[inline]
    fn transactions(
        &self,
        filter: &TransactionFilter,
    ) -> impl Future<Output = Result<Vec<Transaction>>> + Send {
        core::future::ready(self.read_transactions(filter))
    }

    #[inline]
    fn budgets(&self, active_at: NaiveDate) -> impl Future<Output = Result<Vec<Budget>>> + Send {
        core::future::ready(self.read_budgets(active_at))
    }

    #[inline]
    fn categories(&self) -> impl Future<Output = Result<Vec<Category>>> + Send {
        core::future::ready(self.read_categories())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetId, CategoryId, TransactionKind};
    use crate::trends::tests::{date, tx};

    /// Helper to create a [`FileLedger`] in a temporary directory.
    fn temp_ledger() -> (FileLedger, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::new(dir.path().to_path_buf()).unwrap();
        (ledger, dir)
    }

    /// Writes `items` as a JSON array into the ledger directory.
    fn write_json<T: serde::Serialize>(dir: &tempfile::TempDir, name: &str, items: &[T]) {
        let json = serde_json::to_string_pretty(items).unwrap();
        fs::write(dir.path().join(name), json).unwrap();
    }

    fn seed(dir: &tempfile::TempDir) {
        let mut pending = tx("t3", TransactionKind::Expense, 99.0, date(2024, 5, 3), None);
        pending.is_pending = true;
        write_json(
            dir,
            TRANSACTIONS_FILE,
            &[
                tx("t1", TransactionKind::Expense, 10.0, date(2024, 5, 1), Some("food")),
                tx("t2", TransactionKind::Income, 20.0, date(2024, 6, 2), None),
                pending,
            ],
        );
        write_json(
            dir,
            BUDGETS_FILE,
            &[Budget {
                id: BudgetId::from("b-may"),
                name: "May".to_owned(),
                category_id: Some(CategoryId::from("food")),
                category_name: Some("Food".to_owned()),
                amount: 300.0,
                period_start: date(2024, 5, 1),
                period_end: date(2024, 5, 31),
            }],
        );
        write_json(
            dir,
            CATEGORIES_FILE,
            &[Category {
                id: CategoryId::from("food"),
                name: "Food".to_owned(),
            }],
        );
    }

    #[test]
    fn new_does_not_create_anything() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        let ledger = FileLedger::new(nested.clone()).unwrap();
        assert!(!nested.exists());
        assert_eq!(ledger.dir(), nested.as_path());
    }

    #[test]
    fn new_rejects_a_regular_file() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("ledger.json");
        fs::write(&path, "[]").unwrap();
        let err = FileLedger::new(path).unwrap_err();
        assert!(matches!(err, AnalyticsError::Source(_)));
    }

    #[test]
    fn default_dir_ends_with_app_name() {
        if let Ok(dir) = FileLedger::default_dir() {
            assert!(dir.ends_with(APP_NAME));
        }
    }

    #[cfg(feature = "blocking")]
    mod blocking {
        use super::*;
        use crate::ledger::BlockingLedgerSource;

        #[test]
        fn missing_files_read_as_empty() {
            let (ledger, _dir) = temp_ledger();
            assert!(ledger.transactions(&TransactionFilter::new()).unwrap().is_empty());
            assert!(ledger.budgets(date(2024, 5, 1)).unwrap().is_empty());
            assert!(ledger.categories().unwrap().is_empty());
        }

        #[test]
        fn missing_directory_reads_as_empty() {
            let root = tempfile::tempdir().unwrap();
            let ledger = FileLedger::new(root.path().join("absent")).unwrap();
            assert!(ledger.transactions(&TransactionFilter::new()).unwrap().is_empty());
            assert!(ledger.categories().unwrap().is_empty());
            assert!(!root.path().join("absent").exists());
        }

        #[test]
        fn reads_do_not_write_into_the_directory() {
            let (ledger, dir) = temp_ledger();
            seed(&dir);
            assert_eq!(ledger.categories().unwrap().len(), 1);
            assert!(!dir.path().join(LOCK_FILE).exists());
        }

        #[test]
        fn existing_lock_sentinel_is_honoured() {
            let (ledger, dir) = temp_ledger();
            seed(&dir);
            fs::write(dir.path().join(LOCK_FILE), "").unwrap();
            assert_eq!(ledger.budgets(date(2024, 5, 15)).unwrap().len(), 1);
            assert_eq!(ledger.categories().unwrap()[0].name, "Food");
        }

        #[cfg(unix)]
        #[test]
        fn read_only_directory_is_readable() {
            use std::os::unix::fs::PermissionsExt as _;

            let (ledger, dir) = temp_ledger();
            seed(&dir);
            fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o555)).unwrap();
            let reopened = FileLedger::new(dir.path().to_path_buf()).unwrap();
            let result = reopened.transactions(&TransactionFilter::new());
            fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();
            assert_eq!(result.unwrap().len(), 2);
            assert_eq!(ledger.categories().unwrap().len(), 1);
        }

        #[test]
        fn reads_and_filters_seeded_files() {
            let (ledger, dir) = temp_ledger();
            seed(&dir);

            let settled = ledger.transactions(&TransactionFilter::new()).unwrap();
            assert_eq!(settled.len(), 2);
            let all = ledger
                .transactions(&TransactionFilter::new().include_pending(true))
                .unwrap();
            assert_eq!(all.len(), 3);
            let may = ledger
                .transactions(
                    &TransactionFilter::new().date_range(date(2024, 5, 1), date(2024, 5, 31)),
                )
                .unwrap();
            assert_eq!(may.len(), 1);
            assert_eq!(may[0].category_id, Some(CategoryId::from("food")));

            assert_eq!(ledger.budgets(date(2024, 5, 15)).unwrap().len(), 1);
            assert!(ledger.budgets(date(2024, 6, 15)).unwrap().is_empty());
            assert_eq!(ledger.categories().unwrap()[0].name, "Food");
        }

        #[test]
        fn malformed_file_is_a_serialization_error() {
            let (ledger, dir) = temp_ledger();
            fs::write(dir.path().join(CATEGORIES_FILE), "{ not json").unwrap();
            let err = ledger.categories().unwrap_err();
            assert!(matches!(err, AnalyticsError::Serialization(_)));
        }
    }

    #[cfg(feature = "async")]
    mod async_tests {
        use super::*;
        use crate::ledger::LedgerSource;

        #[tokio::test]
        async fn missing_files_read_as_empty() {
            let (ledger, _dir) = temp_ledger();
            assert!(ledger.categories().await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn reads_seeded_files() {
            let (ledger, dir) = temp_ledger();
            seed(&dir);
            let incomes = ledger
                .transactions(&TransactionFilter::new().kind(TransactionKind::Income))
                .await
                .unwrap();
            assert_eq!(incomes.len(), 1);
            assert_eq!(ledger.budgets(date(2024, 5, 31)).await.unwrap().len(), 1);
        }
    }
}
