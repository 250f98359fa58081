use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};

use serde::{Deserialize, Serialize};
use tsquery_utils::hash::hash_parts;

/// IdType tags which identity representation a series carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdType {
    String,
    Byte,
}

/// TimeSeriesStringId is the resolved, human readable identity of a series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSeriesStringId {
    pub metric: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub aggregated_tags: Vec<String>,
}

impl TimeSeriesStringId {
    pub fn new(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
            tags: BTreeMap::new(),
            aggregated_tags: vec![],
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_aggregated_tag(mut self, tag: impl Into<String>) -> Self {
        self.aggregated_tags.push(tag.into());
        self
    }

    /// build_hash computes the 64 bit hash shards use to refer to this identity.
    pub fn build_hash(&self) -> u64 {
        let mut parts: Vec<&[u8]> = Vec::with_capacity(1 + self.tags.len() * 2);
        parts.push(self.metric.as_bytes());
        for (k, v) in &self.tags {
            parts.push(k.as_bytes());
            parts.push(v.as_bytes());
        }
        for t in &self.aggregated_tags {
            parts.push(t.as_bytes());
        }
        hash_parts(parts)
    }
}

impl Display for TimeSeriesStringId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{", self.metric)?;
        for (i, (k, v)) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        f.write_str("}")
    }
}

/// TimeSeriesByteId is an encoded identity that must be resolved through an
/// id resolver before it can be rendered.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSeriesByteId {
    pub bytes: Vec<u8>,
}

impl TimeSeriesByteId {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl Debug for TimeSeriesByteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("TimeSeriesByteId(")?;
        for b in &self.bytes {
            write!(f, "{:02x}", b)?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeSeriesId {
    String(TimeSeriesStringId),
    Byte(TimeSeriesByteId),
}

impl TimeSeriesId {
    pub fn id_type(&self) -> IdType {
        match self {
            TimeSeriesId::String(_) => IdType::String,
            TimeSeriesId::Byte(_) => IdType::Byte,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::id::{IdType, TimeSeriesByteId, TimeSeriesId, TimeSeriesStringId};

    #[test]
    fn test_hash_depends_on_tags() {
        let a = TimeSeriesStringId::new("sys.cpu").with_tag("host", "web01");
        let b = TimeSeriesStringId::new("sys.cpu").with_tag("host", "web02");
        assert_ne!(a.build_hash(), b.build_hash());
        assert_eq!(a.build_hash(), a.clone().build_hash());
    }

    #[test]
    fn test_display() {
        let id = TimeSeriesStringId::new("m")
            .with_tag("b", "2")
            .with_tag("a", "1");
        assert_eq!(id.to_string(), "m{a=1,b=2}");

        let raw = TimeSeriesId::Byte(TimeSeriesByteId::new(vec![0x0a, 0xff]));
        assert_eq!(raw.id_type(), IdType::Byte);
        assert_eq!(
            format!("{:?}", TimeSeriesByteId::new(vec![0x0a, 0xff])),
            "TimeSeriesByteId(0aff)"
        );
    }
}
