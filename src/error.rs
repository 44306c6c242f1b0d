//! Error types for the ledger analytics library.

/// All errors that can occur when fetching ledger data or running an
/// analytics query.
///
/// Degenerate arithmetic (zero denominators, too few points) is never an
/// error: those cases surface as `None` on the corresponding result.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The ledger source (transaction/budget repository) failed.
    #[error("ledger source error: {0}")]
    Source(Box<dyn core::error::Error + Send + Sync>),

    /// A query parameter was outside its accepted range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, AnalyticsError>;
