//! Error types for the accumulation engine

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::types::Affinity;

/// Main error type for the accumulation engine
#[derive(Error, Debug)]
pub enum Error {
    /// Date string matches none of the accepted formats
    ///
    /// Accepted formats are `YYYY-MM-DD` (interpreted as midnight) and
    /// `YYYY-MM-DDTHH:MM:SS`.
    #[error("Invalid date format: {input:?} (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)")]
    InvalidDateFormat {
        /// The string that failed to parse
        input: String,
    },

    /// Unit name outside the supported set
    ///
    /// Raised only when parsing unit names from strings; constructed
    /// intervals always carry a valid unit.
    #[error("Unsupported temporal unit: {unit:?}")]
    UnsupportedUnit {
        /// The unrecognized unit name
        unit: String,
    },

    /// Interval scalar must be at least 1
    #[error("Invalid interval scalar: {scalar} (must be >= 1)")]
    InvalidScalar {
        /// The rejected scalar value
        scalar: u32,
    },

    /// Series length differs from the temporal axis length
    #[error("Dimension length mismatch for {series}: expected {expected} rows, got {actual}")]
    DimensionLengthMismatch {
        /// Label of the offending series
        series: String,
        /// Row count of the temporal axis
        expected: usize,
        /// Row count of the offending series
        actual: usize,
    },

    /// Series affinity differs from what the operation requires
    #[error("Affinity mismatch for {series}: expected {expected}, got {actual}")]
    AffinityMismatch {
        /// Label of the offending series
        series: String,
        /// Affinity required by the operation
        expected: Affinity,
        /// Affinity the series actually has
        actual: Affinity,
    },

    /// A cell with no observations was reduced under a policy that forbids it
    ///
    /// Only raised under [`EmptyCellPolicy::Fail`](crate::EmptyCellPolicy);
    /// the default policy skips such cells instead.
    #[error("Empty cell reduction at bucket {bucket} for group {path:?}, quantity {quantity:?}")]
    EmptyCellReduction {
        /// Start instant of the empty bucket
        bucket: NaiveDateTime,
        /// Group path of the cell, root to leaf
        path: String,
        /// Label of the quantity being reduced
        quantity: String,
    },

    /// Bucket count exceeds the configured safety limit
    #[error("Bucket limit exceeded: range produces at least {buckets} buckets, limit is {limit}")]
    BucketLimitExceeded {
        /// Bucket count reached before generation stopped
        buckets: usize,
        /// Configured maximum
        limit: usize,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
