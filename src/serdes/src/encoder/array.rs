use std::io;

use common_base::series::ValueIterator;
use common_base::types::{NumericArrayValue, TimeSeriesValue};

use crate::encoder::{EncodeContext, SeriesFrame};

/// encode writes the `[offset, end)` range of each array value. Arrays with an
/// empty range write nothing. Array values carry no timestamps of their own,
/// so a result without a time specification writes nothing either.
pub fn encode(
    ctx: &EncodeContext<'_>,
    values: ValueIterator<TimeSeriesValue<NumericArrayValue>>,
    frame: &mut SeriesFrame,
) -> io::Result<bool> {
    if ctx.time_spec.is_none() {
        debug!("numeric array skipped, the result has no time specification");
        return Ok(false);
    }

    let mut wrote = false;
    for v in ctx.window(values) {
        let array = match v.value {
            Some(array) if array.offset < array.end => array,
            _ => continue,
        };

        let json = frame.open();
        json.start_array_field("NumericType")?;
        for idx in array.offset..array.end {
            json.write_numeric(array.get(idx))?;
        }
        json.end_array()?;
        wrote = true;
    }
    Ok(wrote)
}

#[cfg(test)]
mod tests {
    use common_base::id::TimeSeriesStringId;
    use common_base::memory::MemTimeSeries;
    use common_base::series::TimeSpecification;
    use common_base::timestamp::{TimeUnit, Timestamp};
    use common_base::types::{NumericArray, NumericArrayValue, TimeSeriesValue};

    use crate::encoder::tests::{ctx, render};
    use crate::options::SerdesOptions;

    fn grid() -> TimeSpecification {
        TimeSpecification::fixed(
            Timestamp::from_epoch(0),
            Timestamp::from_epoch(100),
            10,
            TimeUnit::Seconds,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_offset_range() {
        let options = SerdesOptions::default();
        let id = TimeSeriesStringId::new("m");
        let mut array = NumericArrayValue::new(NumericArray::Integer(vec![1, 2, 3, 4]));
        array.offset = 1;
        array.end = 3;
        let series = MemTimeSeries::with_string_id(id.clone())
            .array(vec![TimeSeriesValue::new(Timestamp::from_epoch(0), array)]);

        let spec = grid();
        let mut ctx = ctx(&options);
        ctx.time_spec = Some(&spec);
        let (s, _) = render(&ctx, &series, &id);
        assert!(s.ends_with(r#""aggregateTags":[],"NumericType":[2,3]}]"#));
    }

    #[test]
    fn test_empty_range_skipped() {
        let options = SerdesOptions::default();
        let id = TimeSeriesStringId::new("m");
        let mut array = NumericArrayValue::new(NumericArray::Float(vec![1.0]));
        array.offset = 1;
        let series = MemTimeSeries::with_string_id(id.clone())
            .array(vec![TimeSeriesValue::new(Timestamp::from_epoch(0), array)]);

        let spec = grid();
        let mut ctx = ctx(&options);
        ctx.time_spec = Some(&spec);
        let (s, outcome) = render(&ctx, &series, &id);
        assert_eq!(s, "[]");
        assert!(!outcome.wrote_values);
    }

    #[test]
    fn test_requires_time_grid() {
        let options = SerdesOptions::default();
        let id = TimeSeriesStringId::new("m");
        let array = NumericArrayValue::new(NumericArray::Integer(vec![1, 2]));
        let series = MemTimeSeries::with_string_id(id.clone())
            .array(vec![TimeSeriesValue::new(Timestamp::from_epoch(0), array)]);

        let (s, outcome) = render(&ctx(&options), &series, &id);
        assert_eq!(s, "[]");
        assert!(!outcome.wrote_values);
    }
}
