use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::id::{IdType, TimeSeriesId};
use crate::timestamp::{TemporalAmount, TimeUnit, Timestamp};
use crate::types::{
    EventsValue, NumericArrayValue, NumericSummaryValue, NumericValue, StatusValue,
    TimeSeriesValue,
};

pub type ValueIterator<T> = Box<dyn Iterator<Item = T> + Send>;

/// TypedIterator is a single pass iterator over one value kind of a series. The
/// variants are the closed set of value kinds a series may carry.
pub enum TypedIterator {
    Numeric(ValueIterator<TimeSeriesValue<NumericValue>>),
    NumericSummary(ValueIterator<TimeSeriesValue<NumericSummaryValue>>),
    NumericArray(ValueIterator<TimeSeriesValue<NumericArrayValue>>),
    Status {
        namespace: Option<String>,
        values: ValueIterator<StatusValue>,
    },
    Event(ValueIterator<EventsValue>),
}

/// TimeSeries is one logical series of a query result.
pub trait TimeSeries: Send + Sync {
    fn id(&self) -> &TimeSeriesId;

    /// iterators returns fresh iterators, one per value kind.
    fn iterators(&self) -> Vec<TypedIterator>;
}

/// SourceKind describes the query node that produced a result. Summarizers
/// aggregate on the client side and expose every aggregation of a summary value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Summarizer,
    #[default]
    Other,
}

/// RollupConfig maps numeric summary ids to aggregator names.
pub trait RollupConfig: Send + Sync {
    fn aggregator_for_id(&self, id: i32) -> Option<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultRollupConfig {
    pub aggregations: BTreeMap<i32, String>,
}

impl DefaultRollupConfig {
    pub fn new() -> Self {
        let mut aggregations = BTreeMap::new();
        for (id, name) in [(0, "sum"), (1, "count"), (2, "min"), (3, "max"), (5, "avg")] {
            aggregations.insert(id, name.to_string());
        }
        Self { aggregations }
    }
}

impl Default for DefaultRollupConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RollupConfig for DefaultRollupConfig {
    fn aggregator_for_id(&self, id: i32) -> Option<String> {
        self.aggregations.get(&id).cloned()
    }
}

/// TimeSpecification is a fixed time grid shared by every series of a result.
/// Values aligned to it may omit their individual timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSpecification {
    pub start: Timestamp,
    pub end: Timestamp,
    pub interval: Option<TemporalAmount>,
    pub string_interval: String,
    pub timezone: Option<String>,
    pub units: Option<TimeUnit>,
}

impl TimeSpecification {
    /// fixed builds a grid of `interval * units` buckets whose first bucket is
    /// the boundary at or before `start`.
    pub fn fixed(
        start: Timestamp,
        end: Timestamp,
        interval: i64,
        units: TimeUnit,
        timezone: Option<String>,
    ) -> anyhow::Result<Self> {
        let mut start = start;
        start.snap_to_previous_interval(interval, units)?;

        let amount = match units.fixed_nanos() {
            Some(nanos) => {
                let nanos = i64::try_from(nanos * interval as i128).map_err(|e| anyhow!(e))?;
                TemporalAmount::Duration(chrono::Duration::nanoseconds(nanos))
            }
            None => {
                let n = i32::try_from(interval).map_err(|e| anyhow!(e))?;
                match units {
                    TimeUnit::Weeks => TemporalAmount::weeks(n),
                    TimeUnit::Months => TemporalAmount::months(n),
                    _ => TemporalAmount::Period {
                        years: n,
                        months: 0,
                        days: 0,
                    },
                }
            }
        };

        Ok(Self {
            start,
            end,
            interval: Some(amount),
            string_interval: format!("{}{}", interval, units.suffix()),
            timezone,
            units: Some(units),
        })
    }
}

/// QueryResult is one result set emitted by a query node.
pub trait QueryResult: Send + Sync {
    fn time_series(&self) -> &[Box<dyn TimeSeries>];

    fn time_specification(&self) -> Option<&TimeSpecification>;

    /// source_id is the config id of the node that produced the result.
    fn source_id(&self) -> &str;

    fn data_source(&self) -> &str;

    fn source_kind(&self) -> SourceKind;

    fn rollup_config(&self) -> Option<&dyn RollupConfig>;

    fn id_type(&self) -> IdType;
}

#[cfg(test)]
mod tests {
    use crate::series::{DefaultRollupConfig, RollupConfig, TimeSpecification};
    use crate::timestamp::{TemporalAmount, TimeUnit, Timestamp};

    #[test]
    fn test_fixed_spec_snaps_start() {
        let spec = TimeSpecification::fixed(
            Timestamp::from_epoch(1_000_123),
            Timestamp::from_epoch(1_003_600),
            1,
            TimeUnit::Minutes,
            None,
        )
        .unwrap();
        assert_eq!(spec.start.epoch(), 1_000_080);
        assert_eq!(spec.string_interval, "1m");
        assert_eq!(spec.interval, Some(TemporalAmount::seconds(60)));
        assert_eq!(spec.interval.unwrap().iso8601(), "PT1M");
    }

    #[test]
    fn test_rollup_names() {
        let config = DefaultRollupConfig::new();
        assert_eq!(config.aggregator_for_id(0).as_deref(), Some("sum"));
        assert_eq!(config.aggregator_for_id(4), None);
    }
}
