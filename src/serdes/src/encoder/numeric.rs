use std::io;

use common_base::series::ValueIterator;
use common_base::types::{NumericValue, TimeSeriesValue};

use crate::encoder::{EncodeContext, SeriesFrame};

/// encode writes `"NumericType"` as a plain array when the result sits on a
/// time grid, otherwise as an object keyed by timestamp.
pub fn encode(
    ctx: &EncodeContext<'_>,
    values: ValueIterator<TimeSeriesValue<NumericValue>>,
    frame: &mut SeriesFrame,
) -> io::Result<bool> {
    let mut values = ctx.window(values).peekable();
    if values.peek().is_none() {
        return Ok(false);
    }

    let json = frame.open();
    if ctx.time_spec.is_some() {
        json.start_array_field("NumericType")?;
        for v in values {
            json.write_numeric(v.value)?;
        }
        json.end_array()?;
    } else {
        json.start_object_field("NumericType")?;
        for v in values {
            json.numeric_field(&ctx.timestamp_key(&v.timestamp), v.value)?;
        }
        json.end_object()?;
    }
    Ok(true)
}
