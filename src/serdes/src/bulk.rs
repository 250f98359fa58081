use std::io::{self, Write};

use common_base::id::{IdType, TimeSeriesId, TimeSeriesStringId};
use common_base::series::{QueryResult, TimeSpecification};
use common_base::timestamp::Timestamp;
use futures::future::try_join_all;
use rayon::prelude::*;

use crate::context::IdResolver;
use crate::encoder::{encode_series, EncodeContext, SeriesOutcome};
use crate::error::{Result, SerdesError};
use crate::json::JsonWriter;
use crate::options::SerdesOptions;

/// RenderedResult is a complete `results` entry ready to be appended to the
/// document.
#[derive(Debug, Clone)]
pub struct RenderedResult {
    pub source_id: String,
    pub bytes: Vec<u8>,
    /// series counts the series that wrote at least one value.
    pub series: u64,
}

/// source_id of a result is `<node id>:<data source>`.
pub fn source_id(result: &dyn QueryResult) -> String {
    format!("{}:{}", result.source_id(), result.data_source())
}

/// resolve_ids returns the string identity of every series of the result, in
/// series order. Byte ids are decoded concurrently and the first failure fails
/// the whole batch.
pub async fn resolve_ids(
    result: &dyn QueryResult,
    resolver: Option<&dyn IdResolver>,
) -> Result<Vec<TimeSeriesStringId>> {
    let series = result.time_series();
    if result.id_type() == IdType::Byte && resolver.is_none() {
        return Err(SerdesError::InvalidArgument(format!(
            "result {} carries byte ids but the query has no id resolver",
            source_id(result)
        )));
    }

    let decodes = series.iter().map(|s| async move {
        match s.id() {
            TimeSeriesId::String(id) => Ok(id.clone()),
            TimeSeriesId::Byte(id) => match resolver {
                Some(resolver) => resolver.decode(id).await,
                None => Err(anyhow!("no resolver for {:?}", id)),
            },
        }
    });

    try_join_all(decodes).await.map_err(SerdesError::Resolution)
}

/// render_result renders the result entry: source, optional time
/// specification, the `data` array and the status namespace when one was seen.
pub fn render_result(
    result: &dyn QueryResult,
    ids: &[TimeSeriesStringId],
    start: Timestamp,
    end: Timestamp,
    options: &SerdesOptions,
) -> Result<RenderedResult> {
    let source_id = source_id(result);
    if ids.len() != result.time_series().len() {
        return Err(SerdesError::InvalidArgument(format!(
            "{} ids for {} series of {}",
            ids.len(),
            result.time_series().len(),
            source_id
        )));
    }

    let ctx = EncodeContext::for_result(result, start, end, options);
    let (bytes, series) = render(&ctx, result, ids, &source_id)
        .map_err(|e| SerdesError::serialization(source_id.as_str(), e))?;

    Ok(RenderedResult {
        source_id,
        bytes,
        series,
    })
}

fn render(
    ctx: &EncodeContext<'_>,
    result: &dyn QueryResult,
    ids: &[TimeSeriesStringId],
    source_id: &str,
) -> io::Result<(Vec<u8>, u64)> {
    let mut json = JsonWriter::new(Vec::new());
    json.start_object()?;
    json.string_field("source", source_id)?;
    if let Some(spec) = ctx.time_spec {
        write_time_specification(&mut json, spec)?;
    }

    json.start_array_field("data")?;
    let outcomes = if ctx.options.parallel_for(ids.len()) {
        debug!("rendering {} series of {} in parallel", ids.len(), source_id);
        render_parallel(ctx, result, ids, &mut json)?
    } else {
        let mut outcomes = Vec::with_capacity(ids.len());
        for (series, id) in result.time_series().iter().zip(ids) {
            outcomes.push(encode_series(ctx, series.as_ref(), id, &mut json)?);
        }
        outcomes
    };
    json.end_array()?;

    let mut namespace = None;
    let mut written = 0;
    for outcome in outcomes {
        if outcome.wrote_values {
            written += 1;
        }
        if namespace.is_none() {
            namespace = outcome.namespace;
        }
    }
    if let Some(namespace) = namespace {
        json.string_field("namespace", &namespace)?;
    }
    json.end_object()?;

    Ok((json.into_inner(), written))
}

/// render_parallel encodes every series into a private buffer on the rayon
/// pool and appends the buffers in series order.
fn render_parallel<W: Write>(
    ctx: &EncodeContext<'_>,
    result: &dyn QueryResult,
    ids: &[TimeSeriesStringId],
    json: &mut JsonWriter<W>,
) -> io::Result<Vec<SeriesOutcome>> {
    let rendered: Vec<io::Result<(Vec<u8>, SeriesOutcome)>> = result
        .time_series()
        .par_iter()
        .zip(ids.par_iter())
        .map(|(series, id)| -> io::Result<(Vec<u8>, SeriesOutcome)> {
            let mut buf = JsonWriter::array_fragment(Vec::new());
            let outcome = encode_series(ctx, series.as_ref(), id, &mut buf)?;
            Ok((buf.into_inner(), outcome))
        })
        .collect();

    let mut outcomes = Vec::with_capacity(rendered.len());
    for item in rendered {
        let (bytes, outcome) = item?;
        if !bytes.is_empty() {
            json.write_raw_value(bytes.as_slice())?;
        }
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

/// write_time_specification writes the `timeSpecification` block shared by the
/// series of a result.
pub fn write_time_specification<W: Write>(
    json: &mut JsonWriter<W>,
    spec: &TimeSpecification,
) -> io::Result<()> {
    json.start_object_field("timeSpecification")?;
    json.i64_field("start", spec.start.epoch())?;
    json.i64_field("end", spec.end.epoch())?;
    json.field_name("intervalISO")?;
    match &spec.interval {
        Some(interval) => json.write_string(&interval.iso8601())?,
        None => json.write_null()?,
    }
    json.string_field("interval", &spec.string_interval)?;
    if let Some(tz) = &spec.timezone {
        json.string_field("timeZone", tz)?;
    }
    json.field_name("units")?;
    match &spec.units {
        Some(units) => json.write_string(&units.to_string())?,
        None => json.write_null()?,
    }
    json.end_object()
}
