use std::io::{self, Write};

use common_base::id::TimeSeriesStringId;
use common_base::series::{
    QueryResult, RollupConfig, SourceKind, TimeSeries, TimeSpecification, TypedIterator,
};
use common_base::timestamp::Timestamp;
use common_base::types::TimeSeriesValue;

use crate::json::JsonWriter;
use crate::options::SerdesOptions;

pub mod array;
pub mod event;
pub mod numeric;
pub mod status;
pub mod summary;

/// SummaryLayout decides how summary values are exposed, resolved once per
/// result from the kind of node that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryLayout {
    /// Summarizer exposes every aggregation with its name.
    Summarizer,
    /// Rollup exposes only the first available aggregation as plain numbers.
    Rollup,
}

impl From<SourceKind> for SummaryLayout {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Summarizer => SummaryLayout::Summarizer,
            SourceKind::Other => SummaryLayout::Rollup,
        }
    }
}

/// EncodeContext is everything an encoder needs besides the values themselves.
pub struct EncodeContext<'a> {
    pub start: Timestamp,
    pub end: Timestamp,
    pub time_spec: Option<&'a TimeSpecification>,
    pub options: &'a SerdesOptions,
    pub summary_layout: SummaryLayout,
    pub rollup: Option<&'a dyn RollupConfig>,
}

impl<'a> EncodeContext<'a> {
    pub fn for_result(
        result: &'a dyn QueryResult,
        start: Timestamp,
        end: Timestamp,
        options: &'a SerdesOptions,
    ) -> Self {
        Self {
            start,
            end,
            time_spec: result.time_specification(),
            options,
            summary_layout: result.source_kind().into(),
            rollup: result.rollup_config(),
        }
    }

    /// timestamp_key renders the map key of a value.
    pub fn timestamp_key(&self, ts: &Timestamp) -> String {
        if self.options.ms_resolution {
            ts.ms_epoch().to_string()
        } else {
            ts.epoch().to_string()
        }
    }

    /// window drops the values before the query start and stops at the first
    /// value past the query end. Both bounds are inclusive.
    pub fn window<T, I>(&self, values: I) -> impl Iterator<Item = TimeSeriesValue<T>>
    where
        I: Iterator<Item = TimeSeriesValue<T>>,
    {
        let start = self.start;
        let end = self.end;
        values
            .skip_while(move |v| v.timestamp < start)
            .take_while(move |v| v.timestamp <= end)
    }
}

/// SeriesFrame collects the value fields of one series. The series object is
/// only written once something landed in the frame.
pub struct SeriesFrame {
    body: JsonWriter<Vec<u8>>,
    open: bool,
    embedded: bool,
}

impl SeriesFrame {
    pub fn new() -> Self {
        Self {
            body: JsonWriter::object_fragment(Vec::new()),
            open: false,
            embedded: false,
        }
    }

    /// open marks the frame as holding values and returns its writer.
    pub fn open(&mut self) -> &mut JsonWriter<Vec<u8>> {
        self.open = true;
        &mut self.body
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn into_body(self) -> Vec<u8> {
        self.body.into_inner()
    }
}

impl Default for SeriesFrame {
    fn default() -> Self {
        Self::new()
    }
}

/// SeriesOutcome reports what encoding a series wrote.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeriesOutcome {
    pub wrote_values: bool,
    pub was_status: bool,
    pub namespace: Option<String>,
}

/// encode_series writes one `data` entry for the series, or nothing at all when
/// no value falls in the query window. Status and event values beyond the first
/// become entries of their own so field names never repeat.
pub fn encode_series<W: Write>(
    ctx: &EncodeContext<'_>,
    series: &dyn TimeSeries,
    id: &TimeSeriesStringId,
    json: &mut JsonWriter<W>,
) -> io::Result<SeriesOutcome> {
    let mut outcome = SeriesOutcome::default();
    let mut was_event = false;
    let mut extra: Vec<Vec<u8>> = Vec::new();

    let mut frame = SeriesFrame::new();
    for itr in series.iterators() {
        match itr {
            TypedIterator::Numeric(values) => {
                numeric::encode(ctx, values, &mut frame)?;
            }
            TypedIterator::NumericSummary(values) => {
                summary::encode(ctx, values, &mut frame)?;
            }
            TypedIterator::NumericArray(values) => {
                array::encode(ctx, values, &mut frame)?;
            }
            TypedIterator::Status { namespace, values } => {
                outcome.was_status = true;
                if outcome.namespace.is_none() {
                    outcome.namespace = namespace.filter(|ns| !ns.is_empty());
                }
                for v in values {
                    if !frame.embedded {
                        status::write(frame.open(), &v)?;
                        frame.embedded = true;
                    } else {
                        extra.push(standalone(|w| status::write(w, &v))?);
                    }
                }
            }
            TypedIterator::Event(values) => {
                was_event = true;
                for v in values {
                    if !frame.embedded {
                        event::write(frame.open(), &v)?;
                        frame.embedded = true;
                    } else {
                        extra.push(standalone(|w| event::write(w, &v))?);
                    }
                }
            }
        }
    }

    let with_metric = !outcome.was_status && !was_event;
    if frame.is_open() {
        outcome.wrote_values = true;
        write_entry(json, id, with_metric, frame.into_body().as_slice())?;
    }
    for body in extra {
        write_entry(json, id, with_metric, body.as_slice())?;
    }

    Ok(outcome)
}

/// write_entry writes a `data` entry: the identity block followed by the
/// already encoded value fields.
pub fn write_entry<W: Write>(
    json: &mut JsonWriter<W>,
    id: &TimeSeriesStringId,
    with_metric: bool,
    body: &[u8],
) -> io::Result<()> {
    json.start_object()?;
    write_identity(json, id, with_metric)?;
    json.write_raw_fields(body)?;
    json.end_object()
}

/// write_identity writes the `metric`, `tags` and `aggregateTags` fields.
pub fn write_identity<W: Write>(
    json: &mut JsonWriter<W>,
    id: &TimeSeriesStringId,
    with_metric: bool,
) -> io::Result<()> {
    if with_metric {
        json.string_field("metric", id.metric.as_str())?;
    }
    json.start_object_field("tags")?;
    for (k, v) in &id.tags {
        json.string_field(k, v)?;
    }
    json.end_object()?;
    json.start_array_field("aggregateTags")?;
    for tag in &id.aggregated_tags {
        json.write_string(tag)?;
    }
    json.end_array()
}

fn standalone<F>(f: F) -> io::Result<Vec<u8>>
where
    F: FnOnce(&mut JsonWriter<Vec<u8>>) -> io::Result<()>,
{
    let mut w = JsonWriter::object_fragment(Vec::new());
    f(&mut w)?;
    Ok(w.into_inner())
}
