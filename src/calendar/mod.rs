//! Calendar Ranges and Interval Stepping
//!
//! This module owns the temporal half of accumulation: how a date range is
//! materialized, and how it is cut into contiguous half-open buckets by a
//! fixed calendar step.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │            Calendar                 │
//! │  inclusive [start, end] range       │
//! │  materialized as daily instants     │
//! └─────────────────────────────────────┘
//!                  ↓
//! ┌─────────────────────────────────────┐
//! │            Interval                 │
//! │  scalar × TemporalUnit step         │
//! │  month/year steps clamp the day     │
//! └─────────────────────────────────────┘
//!                  ↓
//! ┌─────────────────────────────────────┐
//! │        Bucket boundaries            │
//! │  [b0, b1, ..., bk], bk > end        │
//! │  buckets are [b_i, b_{i+1})         │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use timegrain::calendar::{Calendar, Interval, TemporalUnit};
//!
//! let cal = Calendar::parse("2025-01-01", "2025-03-05")?;
//! let monthly = Interval::new(TemporalUnit::Months, 1)?;
//!
//! let boundaries = cal.bucket_boundaries(&monthly);
//! assert_eq!(boundaries.len(), 4); // three monthly buckets
//! # Ok::<(), timegrain::Error>(())
//! ```

pub mod interval;
pub mod range;

// Re-export main types from interval
pub use interval::{days_in_month, is_leap_year, Interval, TemporalUnit};

// Re-export main types from range
pub use range::Calendar;
