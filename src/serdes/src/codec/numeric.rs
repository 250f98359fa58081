use common_base::iterator::TryIterator;
use common_base::partial::{NumericLongArray, FLOAT_FLAG, MILLISECOND_FLAG, TIMESTAMP_MASK};
use common_base::types::NumericValue;

/// NumericLongArrayDecoder walks the two word records of a packed numeric shard,
/// yielding `(epoch seconds, value)` pairs.
pub struct NumericLongArrayDecoder<'a> {
    data: &'a [i64],
    idx: usize,
    end: usize,
}

impl<'a> NumericLongArrayDecoder<'a> {
    pub fn new(array: &'a NumericLongArray) -> anyhow::Result<Self> {
        if array.end > array.data.len() || array.offset > array.end {
            return Err(anyhow!(
                "invalid shard bounds: offset {}, end {}, len {}",
                array.offset,
                array.end,
                array.data.len()
            ));
        }

        Ok(Self {
            data: array.data.as_slice(),
            idx: array.offset,
            end: array.end,
        })
    }
}

impl<'a> TryIterator for NumericLongArrayDecoder<'a> {
    type Item = (i64, NumericValue);

    fn try_next(&mut self) -> anyhow::Result<Option<Self::Item>> {
        if self.idx >= self.end {
            return Ok(None);
        }
        if self.idx + 1 >= self.end {
            return Err(anyhow!("truncated record at word {}", self.idx));
        }

        let header = self.data[self.idx];
        let payload = self.data[self.idx + 1];
        self.idx += 2;

        let mut ts = header & TIMESTAMP_MASK;
        if header & MILLISECOND_FLAG != 0 {
            ts /= 1000;
        }

        let value = if header & FLOAT_FLAG != 0 {
            NumericValue::Float(f64::from_bits(payload as u64))
        } else {
            NumericValue::Integer(payload)
        };

        Ok(Some((ts, value)))
    }
}

/// WindowDecoder yields only the records within `[start, end]` epoch seconds.
/// Records are time ordered, so the first record past `end` stops decoding.
pub struct WindowDecoder<'a> {
    inner: NumericLongArrayDecoder<'a>,
    start: i64,
    end: i64,
    done: bool,
}

impl<'a> WindowDecoder<'a> {
    pub fn new(array: &'a NumericLongArray, start: i64, end: i64) -> anyhow::Result<Self> {
        Ok(Self {
            inner: NumericLongArrayDecoder::new(array)?,
            start,
            end,
            done: false,
        })
    }
}

impl<'a> TryIterator for WindowDecoder<'a> {
    type Item = (i64, NumericValue);

    fn try_next(&mut self) -> anyhow::Result<Option<Self::Item>> {
        while !self.done {
            match self.inner.try_next()? {
                None => self.done = true,
                Some((ts, _)) if ts < self.start => continue,
                Some((ts, _)) if ts > self.end => self.done = true,
                Some(record) => return Ok(Some(record)),
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use common_base::iterator::TryIterator;
    use common_base::partial::NumericLongArray;
    use common_base::types::NumericValue;

    use crate::codec::numeric::{NumericLongArrayDecoder, WindowDecoder};

    #[test]
    fn test_decode_flags() {
        let arr = NumericLongArray::builder()
            .integer(1000, 42)
            .float_ms(2_000_000, 3.5)
            .integer_ms(2_999, 7)
            .build();

        let values = NumericLongArrayDecoder::new(&arr).unwrap().try_collect().unwrap();
        assert_eq!(
            values,
            vec![
                (1000, NumericValue::Integer(42)),
                (2000, NumericValue::Float(3.5)),
                (2, NumericValue::Integer(7)),
            ]
        );
    }

    #[test]
    fn test_decode_offset() {
        let mut arr = NumericLongArray::builder()
            .integer(1, 1)
            .integer(2, 2)
            .integer(3, 3)
            .build();
        arr.offset = 2;
        arr.end = 4;

        let values = NumericLongArrayDecoder::new(&arr).unwrap().try_collect().unwrap();
        assert_eq!(values, vec![(2, NumericValue::Integer(2))]);
    }

    #[test]
    fn test_decode_corrupt() {
        let arr = NumericLongArray::new(vec![1000, 42, 1001]);
        let mut d = NumericLongArrayDecoder::new(&arr).unwrap();
        assert!(d.try_next().unwrap().is_some());
        assert!(d.try_next().is_err());

        let mut arr = NumericLongArray::new(vec![1000, 42]);
        arr.end = 4;
        assert!(NumericLongArrayDecoder::new(&arr).is_err());
    }

    #[test]
    fn test_window_inclusive() {
        let arr = NumericLongArray::builder()
            .integer(5, 0)
            .integer(10, 1)
            .float(15, 1.5)
            .integer(20, 2)
            .integer(25, 3)
            .integer(18, 9)
            .build();

        let values = WindowDecoder::new(&arr, 10, 20).unwrap().try_collect().unwrap();
        assert_eq!(
            values,
            vec![
                (10, NumericValue::Integer(1)),
                (15, NumericValue::Float(1.5)),
                (20, NumericValue::Integer(2)),
            ]
        );
    }

    #[test]
    fn test_window_empty() {
        let arr = NumericLongArray::builder().integer(5, 0).build();
        let values = WindowDecoder::new(&arr, 10, 20).unwrap().try_collect().unwrap();
        assert!(values.is_empty());
    }
}
