//! Core data types used throughout the accumulation engine
//!
//! This module defines the fundamental data structures used across the system:
//!
//! # Key Types
//!
//! - **`Affinity`**: Semantic kind of a series (categorical, numerical, temporal)
//! - **`Value`**: A single observation of any affinity
//! - **`DataSeries`**: A homogeneous, affinity-checked series of observations
//! - **`StaticMap`**: A named lookup table carried through accumulation untouched
//!
//! # Example
//!
//! ```rust
//! use timegrain::types::{Affinity, DataSeries, Value};
//!
//! // Build a named numeric series
//! let mut revenue = DataSeries::numerical([10.0, 12.5, 9.0]).with_name("revenue");
//! assert_eq!(revenue.affinity(), Affinity::Numerical);
//! assert_eq!(revenue.len(), 3);
//!
//! // Mutation is affinity-checked
//! revenue.push(Value::Numerical(11.0)).unwrap();
//! assert!(revenue.push(Value::Categorical("oops".into())).is_err());
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};

/// Semantic kind of a series or value
///
/// Every [`DataSeries`] carries exactly one affinity, fixed at construction.
/// Operations that need a specific kind (the temporal axis, numeric
/// reductions) check it up front and fail with
/// [`Error::AffinityMismatch`](crate::Error::AffinityMismatch) instead of
/// coercing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Affinity {
    /// Discrete labels used for grouping
    Categorical,
    /// Floating-point quantities used for reduction
    Numerical,
    /// Instants on the timeline
    Temporal,
}

impl fmt::Display for Affinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Affinity::Categorical => write!(f, "categorical"),
            Affinity::Numerical => write!(f, "numerical"),
            Affinity::Temporal => write!(f, "temporal"),
        }
    }
}

/// A single observation
///
/// The `Display` form of a value is its canonical key string, used verbatim
/// when grouping rows by category combinations.
///
/// # Example
///
/// ```rust
/// use timegrain::types::{Affinity, Value};
///
/// let v = Value::Categorical("widget".to_string());
/// assert_eq!(v.affinity(), Affinity::Categorical);
/// assert_eq!(v.to_string(), "widget");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// A discrete label
    Categorical(String),
    /// A floating-point quantity
    Numerical(f64),
    /// A naive civil-time instant
    Temporal(NaiveDateTime),
}

impl Value {
    /// The affinity this value belongs to
    pub fn affinity(&self) -> Affinity {
        match self {
            Value::Categorical(_) => Affinity::Categorical,
            Value::Numerical(_) => Affinity::Numerical,
            Value::Temporal(_) => Affinity::Temporal,
        }
    }

    /// The numeric payload, if this is a numerical value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Numerical(v) => Some(*v),
            _ => None,
        }
    }

    /// The instant payload, if this is a temporal value
    pub fn as_instant(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Temporal(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Categorical(s) => write!(f, "{}", s),
            Value::Numerical(v) => write!(f, "{}", v),
            Value::Temporal(t) => write!(f, "{}", t),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Numerical(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Categorical(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Categorical(s)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(t: NaiveDateTime) -> Self {
        Value::Temporal(t)
    }
}

/// A homogeneous series of observations
///
/// Every value in a series shares the series affinity; the invariant is
/// enforced at construction and on every mutation. Series are position
/// aligned: row `i` of the temporal axis, row `i` of each category series and
/// row `i` of each quantity series together describe one observation.
///
/// # Example
///
/// ```rust
/// use timegrain::types::{DataSeries, Value};
///
/// let mut colors = DataSeries::categorical(["red", "red", "blue"]).with_name("color");
/// assert_eq!(colors.len(), 3);
/// assert!(colors.contains(&Value::from("blue")));
///
/// colors.push(Value::from("green")).unwrap();
/// assert_eq!(colors.pop(), Some(Value::from("green")));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SeriesPayload")]
pub struct DataSeries {
    values: Vec<Value>,
    affinity: Affinity,
    name: Option<String>,
}

impl DataSeries {
    /// Create a series from values, validating the affinity of each
    ///
    /// # Arguments
    ///
    /// * `values` - Observations, all of affinity `affinity`
    /// * `affinity` - The affinity the series is declared to hold
    ///
    /// # Returns
    ///
    /// - `Ok(DataSeries)` if every value matches the declared affinity
    /// - `Err(Error::AffinityMismatch)` on the first value that does not
    ///
    /// # Example
    ///
    /// ```rust
    /// use timegrain::types::{Affinity, DataSeries, Value};
    ///
    /// let ok = DataSeries::new(vec![Value::Numerical(1.0)], Affinity::Numerical);
    /// assert!(ok.is_ok());
    ///
    /// let bad = DataSeries::new(vec![Value::Categorical("x".into())], Affinity::Numerical);
    /// assert!(bad.is_err());
    /// ```
    pub fn new(values: Vec<Value>, affinity: Affinity) -> Result<Self> {
        for value in &values {
            if value.affinity() != affinity {
                return Err(Error::AffinityMismatch {
                    series: "<unnamed>".to_string(),
                    expected: affinity,
                    actual: value.affinity(),
                });
            }
        }
        Ok(Self {
            values,
            affinity,
            name: None,
        })
    }

    /// Create an empty series with the given affinity
    pub fn empty(affinity: Affinity) -> Self {
        Self {
            values: Vec::new(),
            affinity,
            name: None,
        }
    }

    /// Create a categorical series from anything string-like
    ///
    /// # Example
    ///
    /// ```rust
    /// use timegrain::types::{Affinity, DataSeries};
    ///
    /// let s = DataSeries::categorical(["a", "b"]);
    /// assert_eq!(s.affinity(), Affinity::Categorical);
    /// ```
    pub fn categorical<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|s| Value::Categorical(s.into()))
                .collect(),
            affinity: Affinity::Categorical,
            name: None,
        }
    }

    /// Create a numerical series from floats
    pub fn numerical<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        Self {
            values: values.into_iter().map(Value::Numerical).collect(),
            affinity: Affinity::Numerical,
            name: None,
        }
    }

    /// Create a temporal series from instants
    pub fn temporal<I>(values: I) -> Self
    where
        I: IntoIterator<Item = NaiveDateTime>,
    {
        Self {
            values: values.into_iter().map(Value::Temporal).collect(),
            affinity: Affinity::Temporal,
            name: None,
        }
    }

    /// Attach a name, consuming and returning the series (builder style)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The series affinity
    pub fn affinity(&self) -> Affinity {
        self.affinity
    }

    /// The series name, if one was attached
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series holds no observations
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The observation at `index`, if in bounds
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// All observations in row order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterate over observations in row order
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Append one observation
    ///
    /// # Returns
    ///
    /// `Err(Error::AffinityMismatch)` if the value's affinity differs from
    /// the series affinity; the series is unchanged in that case.
    pub fn push(&mut self, value: Value) -> Result<()> {
        self.check_affinity(&value)?;
        self.values.push(value);
        Ok(())
    }

    /// Append every observation from an iterator
    ///
    /// Validates all incoming values before any of them is appended, so a
    /// failed extend leaves the series unchanged.
    pub fn extend<I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = Value>,
    {
        let incoming: Vec<Value> = values.into_iter().collect();
        for value in &incoming {
            self.check_affinity(value)?;
        }
        self.values.extend(incoming);
        Ok(())
    }

    /// Insert one observation at `index`, shifting later rows right
    ///
    /// # Panics
    ///
    /// Panics if `index > len`, matching [`Vec::insert`].
    pub fn insert(&mut self, index: usize, value: Value) -> Result<()> {
        self.check_affinity(&value)?;
        self.values.insert(index, value);
        Ok(())
    }

    /// Remove and return the last observation
    pub fn pop(&mut self) -> Option<Value> {
        self.values.pop()
    }

    /// Remove and return the observation at `index`, shifting later rows left
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`, matching [`Vec::remove`].
    pub fn remove(&mut self, index: usize) -> Value {
        self.values.remove(index)
    }

    /// Drop all observations, keeping affinity and name
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Whether any observation equals `value`
    pub fn contains(&self, value: &Value) -> bool {
        self.values.contains(value)
    }

    /// Copy a sub-range into a new series with the same affinity and name
    ///
    /// Out-of-bounds ends are clamped to the series length, so slicing never
    /// panics; an inverted range yields an empty series.
    ///
    /// # Example
    ///
    /// ```rust
    /// use timegrain::types::DataSeries;
    ///
    /// let s = DataSeries::numerical([1.0, 2.0, 3.0, 4.0]).with_name("q");
    /// let mid = s.slice(1..3);
    /// assert_eq!(mid.len(), 2);
    /// assert_eq!(mid.name(), Some("q"));
    ///
    /// assert!(s.slice(10..20).is_empty());
    /// ```
    pub fn slice(&self, range: std::ops::Range<usize>) -> DataSeries {
        let end = range.end.min(self.values.len());
        let start = range.start.min(end);
        Self {
            values: self.values[start..end].to_vec(),
            affinity: self.affinity,
            name: self.name.clone(),
        }
    }

    /// Extract the instants of a temporal series, in row order
    ///
    /// Non-temporal values are impossible by the affinity invariant, so on a
    /// temporal series this returns one instant per row.
    pub fn instants(&self) -> Vec<NaiveDateTime> {
        self.values.iter().filter_map(Value::as_instant).collect()
    }

    /// Extract the floats of a numerical series, in row order
    pub fn numbers(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_f64).collect()
    }

    /// Label used in diagnostics: the name, or a caller-supplied fallback
    pub(crate) fn label_or(&self, fallback: &str) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }

    fn check_affinity(&self, value: &Value) -> Result<()> {
        if value.affinity() != self.affinity {
            return Err(Error::AffinityMismatch {
                series: self.label_or("<unnamed>"),
                expected: self.affinity,
                actual: value.affinity(),
            });
        }
        Ok(())
    }
}

/// Wire form of a series
///
/// `Deserialize` for [`DataSeries`] routes through this mirror and then
/// [`DataSeries::new`], so a hand-written payload cannot carry values that
/// disagree with its declared affinity.
#[derive(Deserialize)]
struct SeriesPayload {
    values: Vec<Value>,
    affinity: Affinity,
    name: Option<String>,
}

impl TryFrom<SeriesPayload> for DataSeries {
    type Error = Error;

    fn try_from(payload: SeriesPayload) -> Result<Self> {
        let series = DataSeries::new(payload.values, payload.affinity)?;
        Ok(match payload.name {
            Some(name) => series.with_name(name),
            None => series,
        })
    }
}

/// A named lookup table carried through accumulation untouched
///
/// Static maps hold out-of-band reference data (display labels, exchange
/// rates, thresholds) that downstream consumers want next to the accumulated
/// cells. The engine never reads the entries; it only passes the maps through
/// to the output.
///
/// # Example
///
/// ```rust
/// use timegrain::types::{StaticMap, Value};
///
/// let mut labels = StaticMap::new("display_names");
/// labels.insert("nyc", Value::from("New York"));
/// assert_eq!(labels.get("nyc"), Some(&Value::from("New York")));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticMap {
    name: String,
    entries: HashMap<String, Value>,
}

impl StaticMap {
    /// Create an empty map with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
        }
    }

    /// Create a map from existing entries
    pub fn from_entries(name: impl Into<String>, entries: HashMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// The map name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or replace an entry
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Look up an entry
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, in arbitrary order
    pub fn entries(&self) -> &HashMap<String, Value> {
        &self.entries
    }
}
