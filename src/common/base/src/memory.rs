use serde::{Deserialize, Serialize};

use crate::id::{IdType, TimeSeriesId, TimeSeriesStringId};
use crate::series::{
    DefaultRollupConfig, QueryResult, RollupConfig, SourceKind, TimeSeries, TimeSpecification,
    TypedIterator,
};
use crate::types::{
    EventsValue, NumericArrayValue, NumericSummaryValue, NumericValue, StatusValue,
    TimeSeriesValue,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemStatus {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub values: Vec<StatusValue>,
}

/// MemTimeSeries is a series held entirely in memory. A kind that is `None` is
/// not carried at all, while `Some(vec![])` is carried but empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemTimeSeries {
    pub id: TimeSeriesId,
    #[serde(default)]
    pub numeric: Option<Vec<TimeSeriesValue<NumericValue>>>,
    #[serde(default)]
    pub summary: Option<Vec<TimeSeriesValue<NumericSummaryValue>>>,
    #[serde(default)]
    pub array: Option<Vec<TimeSeriesValue<NumericArrayValue>>>,
    #[serde(default)]
    pub status: Option<MemStatus>,
    #[serde(default)]
    pub events: Option<Vec<EventsValue>>,
}

impl MemTimeSeries {
    pub fn new(id: TimeSeriesId) -> Self {
        Self {
            id,
            numeric: None,
            summary: None,
            array: None,
            status: None,
            events: None,
        }
    }

    pub fn with_string_id(id: TimeSeriesStringId) -> Self {
        Self::new(TimeSeriesId::String(id))
    }

    pub fn numeric(mut self, values: Vec<TimeSeriesValue<NumericValue>>) -> Self {
        self.numeric = Some(values);
        self
    }

    pub fn summary(mut self, values: Vec<TimeSeriesValue<NumericSummaryValue>>) -> Self {
        self.summary = Some(values);
        self
    }

    pub fn array(mut self, values: Vec<TimeSeriesValue<NumericArrayValue>>) -> Self {
        self.array = Some(values);
        self
    }

    pub fn status(mut self, namespace: Option<String>, values: Vec<StatusValue>) -> Self {
        self.status = Some(MemStatus { namespace, values });
        self
    }

    pub fn events(mut self, values: Vec<EventsValue>) -> Self {
        self.events = Some(values);
        self
    }
}

impl TimeSeries for MemTimeSeries {
    fn id(&self) -> &TimeSeriesId {
        &self.id
    }

    fn iterators(&self) -> Vec<TypedIterator> {
        let mut itrs = Vec::new();
        if let Some(values) = &self.numeric {
            itrs.push(TypedIterator::Numeric(Box::new(values.clone().into_iter())));
        }
        if let Some(values) = &self.summary {
            itrs.push(TypedIterator::NumericSummary(Box::new(
                values.clone().into_iter(),
            )));
        }
        if let Some(values) = &self.array {
            itrs.push(TypedIterator::NumericArray(Box::new(
                values.clone().into_iter(),
            )));
        }
        if let Some(status) = &self.status {
            itrs.push(TypedIterator::Status {
                namespace: status.namespace.clone(),
                values: Box::new(status.values.clone().into_iter()),
            });
        }
        if let Some(values) = &self.events {
            itrs.push(TypedIterator::Event(Box::new(values.clone().into_iter())));
        }
        itrs
    }
}

/// MemQueryResult is a result set built from in-memory series.
pub struct MemQueryResult {
    pub series: Vec<Box<dyn TimeSeries>>,
    pub time_specification: Option<TimeSpecification>,
    pub node_id: String,
    pub data_source: String,
    pub source_kind: SourceKind,
    pub rollup_config: Option<DefaultRollupConfig>,
}

impl MemQueryResult {
    pub fn new(node_id: impl Into<String>, data_source: impl Into<String>) -> Self {
        Self {
            series: vec![],
            time_specification: None,
            node_id: node_id.into(),
            data_source: data_source.into(),
            source_kind: SourceKind::Other,
            rollup_config: None,
        }
    }

    pub fn add_series(mut self, series: impl TimeSeries + 'static) -> Self {
        self.series.push(Box::new(series));
        self
    }

    pub fn with_time_specification(mut self, spec: TimeSpecification) -> Self {
        self.time_specification = Some(spec);
        self
    }

    pub fn with_source_kind(mut self, kind: SourceKind) -> Self {
        self.source_kind = kind;
        self
    }

    pub fn with_rollup_config(mut self, config: DefaultRollupConfig) -> Self {
        self.rollup_config = Some(config);
        self
    }
}

impl QueryResult for MemQueryResult {
    fn time_series(&self) -> &[Box<dyn TimeSeries>] {
        self.series.as_slice()
    }

    fn time_specification(&self) -> Option<&TimeSpecification> {
        self.time_specification.as_ref()
    }

    fn source_id(&self) -> &str {
        self.node_id.as_str()
    }

    fn data_source(&self) -> &str {
        self.data_source.as_str()
    }

    fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    fn rollup_config(&self) -> Option<&dyn RollupConfig> {
        self.rollup_config
            .as_ref()
            .map(|c| c as &dyn RollupConfig)
    }

    fn id_type(&self) -> IdType {
        let byte = self
            .series
            .iter()
            .any(|s| s.id().id_type() == IdType::Byte);
        if byte {
            IdType::Byte
        } else {
            IdType::String
        }
    }
}
