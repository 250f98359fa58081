use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

/// NumericValue is a single numeric sample, either integral or floating point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericValue {
    Integer(i64),
    Float(f64),
}

impl From<i64> for NumericValue {
    fn from(v: i64) -> Self {
        NumericValue::Integer(v)
    }
}

impl From<f64> for NumericValue {
    fn from(v: f64) -> Self {
        NumericValue::Float(v)
    }
}

/// TimeSeriesValue is a value of some kind at a point in time. A missing value
/// is a gap in the series, e.g. an empty bucket on a fixed time grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesValue<T> {
    pub timestamp: Timestamp,
    pub value: Option<T>,
}

impl<T> TimeSeriesValue<T> {
    pub fn new(timestamp: Timestamp, value: T) -> Self {
        Self {
            timestamp,
            value: Some(value),
        }
    }

    pub fn empty(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            value: None,
        }
    }
}

/// NumericSummaryValue carries several aggregations (sum, count, ...) for the same
/// timestamp, keyed by the rollup aggregation id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericSummaryValue {
    pub values: BTreeMap<i32, NumericValue>,
}

impl NumericSummaryValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, summary: i32, value: impl Into<NumericValue>) -> Self {
        self.values.insert(summary, value.into());
        self
    }

    /// summaries_available returns the aggregation ids present, ascending.
    pub fn summaries_available(&self) -> Vec<i32> {
        self.values.keys().copied().collect()
    }

    pub fn value(&self, summary: i32) -> Option<NumericValue> {
        self.values.get(&summary).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericArray {
    Integer(Vec<i64>),
    Float(Vec<f64>),
}

/// NumericArrayValue is a dense array of values aligned to a time specification.
/// Only the index range `[offset, end)` holds data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericArrayValue {
    pub offset: usize,
    pub end: usize,
    pub values: NumericArray,
}

impl NumericArrayValue {
    pub fn new(values: NumericArray) -> Self {
        let end = match &values {
            NumericArray::Integer(v) => v.len(),
            NumericArray::Float(v) => v.len(),
        };
        Self {
            offset: 0,
            end,
            values,
        }
    }

    /// get returns the value at `idx`, None when idx is past the backing array.
    pub fn get(&self, idx: usize) -> Option<NumericValue> {
        match &self.values {
            NumericArray::Integer(v) => v.get(idx).map(|v| NumericValue::Integer(*v)),
            NumericArray::Float(v) => v.get(idx).map(|v| NumericValue::Float(*v)),
        }
    }
}

/// StatusValue reports the health of an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusValue {
    pub status_code: i8,
    #[serde(default)]
    pub status_code_array: Option<Vec<i8>>,
    pub last_update_time: Timestamp,
    #[serde(default)]
    pub timestamp_array: Option<Vec<Timestamp>>,
    pub status_type: i8,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub application: String,
}

/// EventsValue is a discrete event such as a deployment or an alert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventsValue {
    pub namespace: String,
    pub source: String,
    pub title: String,
    pub message: String,
    pub priority: String,
    pub timestamp: Timestamp,
    pub end_timestamp: Timestamp,
    pub user_id: String,
    pub ongoing: bool,
    pub event_id: String,
    #[serde(default)]
    pub parent_id: Option<Vec<String>>,
    #[serde(default)]
    pub child_id: Option<Vec<String>>,
    #[serde(default)]
    pub additional_props: Option<BTreeMap<String, serde_json::Value>>,
}
