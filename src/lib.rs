//! timegrain - Temporal bucketing and aggregation for categorized series
//!
//! This library partitions observations into calendar buckets and nested
//! category groups, then reduces every (group, bucket, quantity) cell:
//! - Calendar-aware bucket stepping (month-end clamping, leap handling)
//! - Nested grouping by category combinations, first-seen key order
//! - Cumulative sums, moving averages, last/max/min and passthrough cells
//! - Affinity-checked series containers with fail-fast validation
//!
//! # Example
//!
//! ```rust
//! use timegrain::accumulate::{Accumulator, Aggregation, Quantity};
//! use timegrain::calendar::Calendar;
//! use timegrain::types::DataSeries;
//!
//! let days = Calendar::parse("2025-01-01", "2025-01-03")?;
//! let sales = DataSeries::numerical([1.0, 2.0, 3.0]).with_name("sales");
//!
//! let result = Accumulator::new(days.as_series())
//!     .with_quantity(Quantity::new(sales).with_aggregation(Aggregation::CumulativeSum))
//!     .accumulate()?;
//!
//! let running: Vec<f64> = result.cells().iter().map(|c| c.series.numbers()[0]).collect();
//! assert_eq!(running, vec![1.0, 3.0, 6.0]);
//! # Ok::<(), timegrain::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accumulate;
pub mod calendar;
pub mod error;
pub mod types;

// Re-export main types
pub use accumulate::{Accumulation, Accumulator, Aggregation, EmptyCellPolicy, Quantity};
pub use calendar::{Calendar, Interval, TemporalUnit};
pub use error::{Error, Result};
pub use types::{Affinity, DataSeries, StaticMap, Value};
