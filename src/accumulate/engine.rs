//! The accumulation engine
//!
//! [`Accumulator`] ties the pieces together: it validates the configured
//! series against each other, derives bucket boundaries from the calendar
//! (or from the temporal axis itself), groups rows by category combination,
//! and reduces every (group, bucket, quantity) cell with that quantity's
//! aggregation policy.
//!
//! Accumulation is a pure function of the configuration; the engine keeps no
//! state between runs apart from atomic run counters, so a configured
//! accumulator can be shared across threads and run repeatedly.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use super::grouping::CategoryTree;
use super::policy::{Aggregation, EmptyCellPolicy, LeafReducer};
use crate::calendar::range::bounded_boundaries;
use crate::calendar::{Calendar, Interval};
use crate::error::{Error, Result};
use crate::types::{Affinity, DataSeries, StaticMap, Value};

/// Default cap on the number of buckets one run may generate
///
/// Guards against degenerate interval/range combinations, such as a
/// millisecond step across a decade.
pub const DEFAULT_MAX_BUCKETS: usize = 1_000_000;

/// A quantity to accumulate: a series plus its reduction policy
///
/// # Example
///
/// ```rust
/// use timegrain::accumulate::{Aggregation, Quantity};
/// use timegrain::types::DataSeries;
///
/// let revenue = DataSeries::numerical([10.0, 20.0]).with_name("revenue");
/// let quantity = Quantity::new(revenue).with_aggregation(Aggregation::CumulativeSum);
/// assert_eq!(quantity.aggregation(), Aggregation::CumulativeSum);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    series: DataSeries,
    aggregation: Aggregation,
}

impl Quantity {
    /// Wrap a series with the default passthrough policy
    pub fn new(series: DataSeries) -> Self {
        Self {
            series,
            aggregation: Aggregation::default(),
        }
    }

    /// Set the reduction policy (builder style)
    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// The underlying series
    pub fn series(&self) -> &DataSeries {
        &self.series
    }

    /// The reduction policy
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }
}

// ============================================================================
// Run statistics
// ============================================================================

/// Run counters, updated atomically on every successful accumulation
///
/// Shared-reference friendly: the engine updates these through `&self`, so a
/// long-lived accumulator behind an `Arc` keeps counting across threads.
#[derive(Debug, Default)]
pub struct AccumulatorStats {
    runs: AtomicU64,
    rows_processed: AtomicU64,
    rows_excluded: AtomicU64,
    buckets_built: AtomicU64,
    leaves_built: AtomicU64,
    cells_emitted: AtomicU64,
    empty_cells: AtomicU64,
}

impl AccumulatorStats {
    /// Copy the counters into a plain snapshot
    pub fn snapshot(&self) -> AccumulatorStatsSnapshot {
        AccumulatorStatsSnapshot {
            runs: self.runs.load(Ordering::Relaxed),
            rows_processed: self.rows_processed.load(Ordering::Relaxed),
            rows_excluded: self.rows_excluded.load(Ordering::Relaxed),
            buckets_built: self.buckets_built.load(Ordering::Relaxed),
            leaves_built: self.leaves_built.load(Ordering::Relaxed),
            cells_emitted: self.cells_emitted.load(Ordering::Relaxed),
            empty_cells: self.empty_cells.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`AccumulatorStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccumulatorStatsSnapshot {
    /// Completed accumulation runs
    pub runs: u64,
    /// Rows fed into runs
    pub rows_processed: u64,
    /// Rows outside an explicitly supplied calendar
    pub rows_excluded: u64,
    /// Buckets generated across runs
    pub buckets_built: u64,
    /// Grouping leaves built across runs
    pub leaves_built: u64,
    /// Cells emitted across runs
    pub cells_emitted: u64,
    /// Cells passed over as empty
    pub empty_cells: u64,
}

// ============================================================================
// Output
// ============================================================================

/// Address of one output cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellKey {
    /// Category key path, first level to last
    pub path: Vec<String>,
    /// Start instant of the cell's bucket
    pub bucket: NaiveDateTime,
    /// Label of the cell's quantity
    pub quantity: String,
}

/// One output cell: its address and its reduced values
///
/// Most policies produce a single value per cell; the passthrough policy
/// keeps every observation, so the payload is a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccumulatedCell {
    /// Where this cell sits in the (group, bucket, quantity) space
    pub key: CellKey,
    /// The reduced values, tagged with the quantity's affinity
    pub series: DataSeries,
}

/// The output of one accumulation run
///
/// Cells are ordered group-major: all cells of the first leaf come first,
/// bucket by bucket in chronological order, with one cell per quantity
/// inside a bucket. [`Accumulation::get`] offers keyed lookup; if two
/// quantities were given the same name, lookup resolves to the later one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Accumulation {
    cells: Vec<AccumulatedCell>,
    buckets: Vec<NaiveDateTime>,
    static_maps: Vec<StaticMap>,
    stats: AccumulatorStatsSnapshot,
    #[serde(skip)]
    index: HashMap<CellKey, usize>,
}

impl Accumulation {
    fn from_parts(
        cells: Vec<AccumulatedCell>,
        buckets: Vec<NaiveDateTime>,
        static_maps: Vec<StaticMap>,
        stats: AccumulatorStatsSnapshot,
    ) -> Self {
        let index = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| (cell.key.clone(), i))
            .collect();
        Self {
            cells,
            buckets,
            static_maps,
            stats,
            index,
        }
    }

    /// All cells, group-major, buckets chronological within a group
    pub fn cells(&self) -> &[AccumulatedCell] {
        &self.cells
    }

    /// Start instants of the generated buckets, chronological
    pub fn buckets(&self) -> &[NaiveDateTime] {
        &self.buckets
    }

    /// The static maps, passed through unmodified
    pub fn static_maps(&self) -> &[StaticMap] {
        &self.static_maps
    }

    /// Counters as they stood when this run finished
    pub fn stats(&self) -> AccumulatorStatsSnapshot {
        self.stats
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the run produced no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Look up one cell's values by group path, bucket start and quantity
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let series = accumulation.get(&["a", "x"], bucket_start, "revenue");
    /// ```
    pub fn get(
        &self,
        path: &[&str],
        bucket: NaiveDateTime,
        quantity: &str,
    ) -> Option<&DataSeries> {
        let key = CellKey {
            path: path.iter().map(|s| s.to_string()).collect(),
            bucket,
            quantity: quantity.to_string(),
        };
        self.index.get(&key).map(|&i| &self.cells[i].series)
    }

    /// Iterate over the cells of one group path, in emission order
    pub fn group(&self, path: &[&str]) -> impl Iterator<Item = &AccumulatedCell> {
        let wanted: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        self.cells
            .iter()
            .filter(move |cell| cell.key.path == wanted)
    }
}

// ============================================================================
// Engine
// ============================================================================

/// The accumulation engine
///
/// Configured builder-style, then run with [`Accumulator::accumulate`]. A
/// run never mutates the configuration, so the same accumulator can be run
/// any number of times and from any number of threads.
///
/// # Example
///
/// ```rust
/// use timegrain::accumulate::{Accumulator, Aggregation, Quantity};
/// use timegrain::calendar::Calendar;
/// use timegrain::types::DataSeries;
///
/// let days = Calendar::parse("2025-01-01", "2025-01-03")?;
/// let sales = DataSeries::numerical([1.0, 2.0, 3.0]).with_name("sales");
///
/// let accumulator = Accumulator::new(days.as_series())
///     .with_quantity(Quantity::new(sales).with_aggregation(Aggregation::CumulativeSum));
///
/// let result = accumulator.accumulate()?;
/// let totals: Vec<f64> = result.cells().iter().map(|c| c.series.numbers()[0]).collect();
/// assert_eq!(totals, vec![1.0, 3.0, 6.0]);
/// # Ok::<(), timegrain::Error>(())
/// ```
#[derive(Debug)]
pub struct Accumulator {
    temporal: DataSeries,
    categories: Vec<DataSeries>,
    quantities: Vec<Quantity>,
    static_maps: Vec<StaticMap>,
    calendar: Option<Calendar>,
    interval: Interval,
    empty_cell_policy: EmptyCellPolicy,
    max_buckets: usize,
    stats: AccumulatorStats,
}

impl Accumulator {
    /// Create an engine over a temporal axis
    ///
    /// Defaults: one-day interval, no explicit calendar (boundaries derive
    /// from the axis itself), empty cells skipped,
    /// [`DEFAULT_MAX_BUCKETS`] bucket cap.
    pub fn new(temporal: DataSeries) -> Self {
        Self {
            temporal,
            categories: Vec::new(),
            quantities: Vec::new(),
            static_maps: Vec::new(),
            calendar: None,
            interval: Interval::default(),
            empty_cell_policy: EmptyCellPolicy::default(),
            max_buckets: DEFAULT_MAX_BUCKETS,
            stats: AccumulatorStats::default(),
        }
    }

    /// Add a category dimension; grouping nests in the order added
    pub fn with_category(mut self, series: DataSeries) -> Self {
        self.categories.push(series);
        self
    }

    /// Add a quantity to reduce
    pub fn with_quantity(mut self, quantity: Quantity) -> Self {
        self.quantities.push(quantity);
        self
    }

    /// Attach a static map; it is passed through to the output unmodified
    pub fn with_static_map(mut self, map: StaticMap) -> Self {
        self.static_maps.push(map);
        self
    }

    /// Bucket an explicit range instead of the axis min/max range
    ///
    /// Rows outside the calendar are excluded from every cell.
    pub fn with_calendar(mut self, calendar: Calendar) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// Set the bucket width
    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    /// Set what an irreducible empty cell does to the run
    pub fn with_empty_cell_policy(mut self, policy: EmptyCellPolicy) -> Self {
        self.empty_cell_policy = policy;
        self
    }

    /// Override the bucket safety cap
    pub fn with_max_buckets(mut self, max_buckets: usize) -> Self {
        self.max_buckets = max_buckets;
        self
    }

    /// The engine's run counters
    pub fn stats(&self) -> &AccumulatorStats {
        &self.stats
    }

    /// Run the accumulation
    ///
    /// # Errors
    ///
    /// - [`Error::AffinityMismatch`] when the axis is not temporal, or a
    ///   numeric-folding quantity is not numerical
    /// - [`Error::DimensionLengthMismatch`] when a category or quantity
    ///   series disagrees with the axis length
    /// - [`Error::BucketLimitExceeded`] when the interval/range combination
    ///   passes the bucket cap
    /// - [`Error::EmptyCellReduction`] under [`EmptyCellPolicy::Fail`]
    pub fn accumulate(&self) -> Result<Accumulation> {
        self.validate()?;

        let instants = self.temporal.instants();
        let boundaries = self.boundaries(&instants)?;

        if boundaries.len() < 2 {
            debug!(rows = instants.len(), "no buckets to accumulate");
            self.stats.runs.fetch_add(1, Ordering::Relaxed);
            self.stats
                .rows_processed
                .fetch_add(instants.len() as u64, Ordering::Relaxed);
            return Ok(Accumulation::from_parts(
                Vec::new(),
                Vec::new(),
                self.static_maps.clone(),
                self.stats.snapshot(),
            ));
        }

        let bucket_count = boundaries.len() - 1;
        let assignments: Vec<Option<usize>> = instants
            .iter()
            .map(|t| bucket_of(&boundaries, *t))
            .collect();
        let excluded = assignments.iter().filter(|a| a.is_none()).count();
        if excluded > 0 {
            warn!(
                excluded,
                rows = instants.len(),
                "rows outside the supplied calendar were excluded"
            );
        }

        let tree = CategoryTree::build(&self.categories, instants.len());
        let leaves = tree.leaves();
        debug!(
            rows = instants.len(),
            buckets = bucket_count,
            leaves = leaves.len(),
            quantities = self.quantities.len(),
            "accumulating"
        );

        let labels: Vec<String> = self
            .quantities
            .iter()
            .enumerate()
            .map(|(qi, q)| q.series().label_or(&format!("quantities[{}]", qi)))
            .collect();

        let mut cells = Vec::new();
        let mut empty_cells = 0u64;

        for leaf in &leaves {
            let mut rows_by_bucket: Vec<Vec<usize>> = vec![Vec::new(); bucket_count];
            for &row in leaf.rows {
                if let Some(bucket) = assignments[row] {
                    rows_by_bucket[bucket].push(row);
                }
            }

            // Reduce quantity by quantity so cross-bucket state stays
            // within one reducer, then emit interleaved by bucket.
            let mut outputs: Vec<Vec<Option<DataSeries>>> =
                Vec::with_capacity(self.quantities.len());
            for (quantity, label) in self.quantities.iter().zip(&labels) {
                let mut reducer = LeafReducer::new(quantity.aggregation());
                let mut per_bucket = Vec::with_capacity(bucket_count);
                for (bi, rows) in rows_by_bucket.iter().enumerate() {
                    let values: Vec<Value> = rows
                        .iter()
                        .filter_map(|&row| quantity.series().get(row).cloned())
                        .collect();
                    match reducer.reduce_bucket(&values) {
                        Some(reduced) => {
                            let series =
                                DataSeries::new(reduced, quantity.series().affinity())?
                                    .with_name(label.clone());
                            per_bucket.push(Some(series));
                        }
                        None => {
                            empty_cells += 1;
                            if quantity.aggregation().requires_observation()
                                && self.empty_cell_policy == EmptyCellPolicy::Fail
                            {
                                return Err(Error::EmptyCellReduction {
                                    bucket: boundaries[bi],
                                    path: leaf.path.join("/"),
                                    quantity: label.clone(),
                                });
                            }
                            per_bucket.push(None);
                        }
                    }
                }
                outputs.push(per_bucket);
            }

            for bi in 0..bucket_count {
                for (per_bucket, label) in outputs.iter_mut().zip(&labels) {
                    if let Some(series) = per_bucket[bi].take() {
                        cells.push(AccumulatedCell {
                            key: CellKey {
                                path: leaf.path.clone(),
                                bucket: boundaries[bi],
                                quantity: label.clone(),
                            },
                            series,
                        });
                    }
                }
            }
        }

        self.stats.runs.fetch_add(1, Ordering::Relaxed);
        self.stats
            .rows_processed
            .fetch_add(instants.len() as u64, Ordering::Relaxed);
        self.stats
            .rows_excluded
            .fetch_add(excluded as u64, Ordering::Relaxed);
        self.stats
            .buckets_built
            .fetch_add(bucket_count as u64, Ordering::Relaxed);
        self.stats
            .leaves_built
            .fetch_add(leaves.len() as u64, Ordering::Relaxed);
        self.stats
            .cells_emitted
            .fetch_add(cells.len() as u64, Ordering::Relaxed);
        self.stats
            .empty_cells
            .fetch_add(empty_cells, Ordering::Relaxed);

        debug!(cells = cells.len(), empty_cells, "accumulation complete");

        Ok(Accumulation::from_parts(
            cells,
            boundaries[..bucket_count].to_vec(),
            self.static_maps.clone(),
            self.stats.snapshot(),
        ))
    }

    fn validate(&self) -> Result<()> {
        if self.temporal.affinity() != Affinity::Temporal {
            return Err(Error::AffinityMismatch {
                series: self.temporal.label_or("temporal"),
                expected: Affinity::Temporal,
                actual: self.temporal.affinity(),
            });
        }

        let expected = self.temporal.len();
        for (i, category) in self.categories.iter().enumerate() {
            if category.len() != expected {
                return Err(Error::DimensionLengthMismatch {
                    series: category.label_or(&format!("categories[{}]", i)),
                    expected,
                    actual: category.len(),
                });
            }
        }
        for (i, quantity) in self.quantities.iter().enumerate() {
            let label = quantity.series().label_or(&format!("quantities[{}]", i));
            if quantity.series().len() != expected {
                return Err(Error::DimensionLengthMismatch {
                    series: label,
                    expected,
                    actual: quantity.series().len(),
                });
            }
            if quantity.aggregation().requires_numeric()
                && quantity.series().affinity() != Affinity::Numerical
            {
                return Err(Error::AffinityMismatch {
                    series: label,
                    expected: Affinity::Numerical,
                    actual: quantity.series().affinity(),
                });
            }
        }
        Ok(())
    }

    /// Bucket boundaries for this run
    ///
    /// An explicit calendar wins; otherwise the range spans the axis
    /// min/max, so every row lands in some bucket.
    fn boundaries(&self, instants: &[NaiveDateTime]) -> Result<Vec<NaiveDateTime>> {
        match &self.calendar {
            Some(calendar) => bounded_boundaries(
                calendar.start(),
                calendar.end(),
                &self.interval,
                self.max_buckets,
            ),
            None => {
                let min = instants.iter().min().copied();
                let max = instants.iter().max().copied();
                match (min, max) {
                    (Some(start), Some(end)) => {
                        bounded_boundaries(start, end, &self.interval, self.max_buckets)
                    }
                    _ => Ok(Vec::new()),
                }
            }
        }
    }
}

/// Bucket index of `t` given boundaries `[b0, ..., bk]`
///
/// Buckets are half-open: `t` equal to a boundary belongs to the bucket
/// starting there. Returns `None` before `b0` and at or past `bk`.
fn bucket_of(boundaries: &[NaiveDateTime], t: NaiveDateTime) -> Option<usize> {
    let idx = boundaries.partition_point(|b| *b <= t);
    if idx == 0 || idx >= boundaries.len() {
        return None;
    }
    Some(idx - 1)
}
