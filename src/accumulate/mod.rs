//! Temporal Accumulation Pipeline
//!
//! This module turns aligned observation series into reduced cells. Rows are
//! grouped by their category value combination, assigned to calendar buckets
//! by their instant, and each (group, bucket, quantity) cell is collapsed by
//! the quantity's aggregation policy.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │          Aligned series             │
//! │  temporal + categories + quantities │
//! └─────────────────────────────────────┘
//!                  ↓
//! ┌─────────────────────────────────────┐
//! │          CategoryTree               │
//! │  nested first-seen-order grouping   │
//! └─────────────────────────────────────┘
//!                  ↓
//! ┌─────────────────────────────────────┐
//! │        Bucket assignment            │
//! │  binary search over boundaries      │
//! └─────────────────────────────────────┘
//!                  ↓
//! ┌─────────────────────────────────────┐
//! │          Accumulation               │
//! │  one reduced series per cell        │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use timegrain::accumulate::{Accumulator, Aggregation, Quantity};
//! use timegrain::calendar::Calendar;
//! use timegrain::types::DataSeries;
//!
//! let days = Calendar::parse("2025-01-01", "2025-01-03")?;
//! let region = DataSeries::categorical(["east", "east", "west"]).with_name("region");
//! let sales = DataSeries::numerical([1.0, 2.0, 3.0]).with_name("sales");
//!
//! let result = Accumulator::new(days.as_series())
//!     .with_category(region)
//!     .with_quantity(Quantity::new(sales).with_aggregation(Aggregation::MaxValue))
//!     .accumulate()?;
//!
//! // One cell per (region, day) that saw data
//! assert_eq!(result.len(), 3);
//! # Ok::<(), timegrain::Error>(())
//! ```

pub mod engine;
pub mod grouping;
pub mod policy;

// Re-export main types from engine
pub use engine::{
    AccumulatedCell, Accumulation, Accumulator, AccumulatorStats, AccumulatorStatsSnapshot,
    CellKey, Quantity, DEFAULT_MAX_BUCKETS,
};

// Re-export main types from grouping
pub use grouping::{CategoryTree, GroupNode, Leaf, ALL_GROUP_KEY};

// Re-export main types from policy
pub use policy::{Aggregation, EmptyCellPolicy};
