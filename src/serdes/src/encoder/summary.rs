use std::io::{self, Write};

use common_base::series::ValueIterator;
use common_base::types::{NumericSummaryValue, TimeSeriesValue};

use crate::encoder::{EncodeContext, SeriesFrame, SummaryLayout};
use crate::json::JsonWriter;

/// encode writes summary values in the layout chosen for the result.
///
/// The set of aggregation ids is taken from the first non null value in the
/// window; later values are expected to carry the same ids.
pub fn encode(
    ctx: &EncodeContext<'_>,
    values: ValueIterator<TimeSeriesValue<NumericSummaryValue>>,
    frame: &mut SeriesFrame,
) -> io::Result<bool> {
    let values: Vec<_> = ctx.window(values).collect();
    if values.is_empty() {
        return Ok(false);
    }

    let summaries = values
        .iter()
        .find_map(|v| v.value.as_ref())
        .map(|v| v.summaries_available())
        .unwrap_or_default();
    if summaries.is_empty() && ctx.summary_layout == SummaryLayout::Summarizer {
        return Ok(false);
    }

    let json = frame.open();
    match ctx.summary_layout {
        SummaryLayout::Rollup => write_rollup(ctx, json, &values, summaries.first().copied()),
        SummaryLayout::Summarizer => write_summarizer(ctx, json, &values, &summaries),
    }?;
    Ok(true)
}

fn write_rollup<W: Write>(
    ctx: &EncodeContext<'_>,
    json: &mut JsonWriter<W>,
    values: &[TimeSeriesValue<NumericSummaryValue>],
    summary: Option<i32>,
) -> io::Result<()> {
    let pick = |v: &TimeSeriesValue<NumericSummaryValue>| {
        summary.and_then(|id| v.value.as_ref().and_then(|s| s.value(id)))
    };

    if ctx.time_spec.is_some() {
        json.start_array_field("NumericType")?;
        for v in values {
            json.write_numeric(pick(v))?;
        }
        json.end_array()
    } else {
        json.start_object_field("NumericType")?;
        for v in values {
            json.numeric_field(&ctx.timestamp_key(&v.timestamp), pick(v))?;
        }
        json.end_object()
    }
}

fn write_summarizer<W: Write>(
    ctx: &EncodeContext<'_>,
    json: &mut JsonWriter<W>,
    values: &[TimeSeriesValue<NumericSummaryValue>],
    summaries: &[i32],
) -> io::Result<()> {
    json.start_object_field("NumericSummaryType")?;

    json.start_array_field("aggregations")?;
    for id in summaries {
        match ctx.rollup.and_then(|r| r.aggregator_for_id(*id)) {
            Some(name) => json.write_string(&name)?,
            None => json.write_null()?,
        }
    }
    json.end_array()?;

    json.start_array_field("data")?;
    for v in values {
        if ctx.time_spec.is_some() {
            write_summary_row(json, v.value.as_ref(), summaries)?;
        } else {
            json.start_object()?;
            json.field_name(&ctx.timestamp_key(&v.timestamp))?;
            write_summary_row(json, v.value.as_ref(), summaries)?;
            json.end_object()?;
        }
    }
    json.end_array()?;

    json.end_object()
}

fn write_summary_row<W: Write>(
    json: &mut JsonWriter<W>,
    value: Option<&NumericSummaryValue>,
    summaries: &[i32],
) -> io::Result<()> {
    match value {
        None => json.write_null(),
        Some(value) => {
            json.start_array()?;
            for id in summaries {
                json.write_numeric(value.value(*id))?;
            }
            json.end_array()
        }
    }
}
