use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::id::IdType;
use crate::timestamp::Timestamp;

/// FLOAT_FLAG marks a record whose payload word is an IEEE-754 double.
pub const FLOAT_FLAG: i64 = 1 << 62;

/// MILLISECOND_FLAG marks a record whose timestamp is in milliseconds.
pub const MILLISECOND_FLAG: i64 = 1 << 61;

/// TIMESTAMP_MASK extracts the timestamp magnitude from the header word.
pub const TIMESTAMP_MASK: i64 = 0x0FFF_FFFF_FFFF_FFFF;

/// NumericLongArray is the packed form of a numeric shard. Each record is two
/// words: a header holding flags and timestamp, then the payload. Only
/// `data[offset..end]` belongs to the shard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericLongArray {
    pub data: Vec<i64>,
    pub offset: usize,
    pub end: usize,
}

impl NumericLongArray {
    pub fn new(data: Vec<i64>) -> Self {
        let end = data.len();
        Self {
            data,
            offset: 0,
            end,
        }
    }

    pub fn builder() -> NumericLongArrayBuilder {
        NumericLongArrayBuilder::default()
    }
}

#[derive(Default)]
pub struct NumericLongArrayBuilder {
    data: Vec<i64>,
}

impl NumericLongArrayBuilder {
    pub fn integer(mut self, epoch: i64, value: i64) -> Self {
        self.data.push(epoch & TIMESTAMP_MASK);
        self.data.push(value);
        self
    }

    pub fn float(mut self, epoch: i64, value: f64) -> Self {
        self.data.push((epoch & TIMESTAMP_MASK) | FLOAT_FLAG);
        self.data.push(value.to_bits() as i64);
        self
    }

    pub fn integer_ms(mut self, ms: i64, value: i64) -> Self {
        self.data.push((ms & TIMESTAMP_MASK) | MILLISECOND_FLAG);
        self.data.push(value);
        self
    }

    pub fn float_ms(mut self, ms: i64, value: f64) -> Self {
        self.data
            .push((ms & TIMESTAMP_MASK) | MILLISECOND_FLAG | FLOAT_FLAG);
        self.data.push(value.to_bits() as i64);
        self
    }

    pub fn build(self) -> NumericLongArray {
        NumericLongArray::new(self.data)
    }
}

/// PartialTimeSeriesSet is the sub-window of the query a group of shards covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialTimeSeriesSet {
    /// node_id is the config id of the node that produced the set.
    pub node_id: String,
    pub data_source: String,
    pub start: Timestamp,
    pub end: Timestamp,
    pub time_series_count: usize,
}

impl PartialTimeSeriesSet {
    /// source_id is `<node id>:<data source>`, the key results are grouped by.
    pub fn source_id(&self) -> String {
        format!("{}:{}", self.node_id, self.data_source)
    }
}

/// PartialTimeSeries is one shard: the data of a single logical series within
/// the window of its set.
#[derive(Debug, Clone)]
pub struct PartialTimeSeries {
    pub id_hash: u64,
    pub id_type: IdType,
    pub set: Arc<PartialTimeSeriesSet>,
    pub value: Option<NumericLongArray>,
}

#[cfg(test)]
mod tests {
    use crate::partial::{NumericLongArray, FLOAT_FLAG, MILLISECOND_FLAG, TIMESTAMP_MASK};

    #[test]
    fn test_builder_layout() {
        let arr = NumericLongArray::builder()
            .integer(1000, 42)
            .float_ms(2000, 3.5)
            .build();
        assert_eq!(arr.end, 4);
        assert_eq!(arr.data[0], 1000);
        assert_eq!(arr.data[1], 42);
        assert_ne!(arr.data[2] & FLOAT_FLAG, 0);
        assert_ne!(arr.data[2] & MILLISECOND_FLAG, 0);
        assert_eq!(arr.data[2] & TIMESTAMP_MASK, 2000);
        assert_eq!(f64::from_bits(arr.data[3] as u64), 3.5);
    }
}
