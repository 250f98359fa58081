use std::io::{self, Write};
use std::sync::Arc;

use common_base::id::IdType;
use common_base::iterator::TryIterator;
use common_base::partial::PartialTimeSeries;
use common_base::timestamp::Timestamp;
use dashmap::DashMap;

use crate::codec::WindowDecoder;
use crate::context::IdRegistry;
use crate::encoder::write_identity;
use crate::json::JsonWriter;

/// SeriesWrapper accumulates the rendered fragments of one logical series,
/// keyed by the start time of the shard that produced them.
pub struct SeriesWrapper {
    id_hash: u64,
    id_type: IdType,
    fragments: DashMap<Timestamp, String>,
}

impl SeriesWrapper {
    pub fn new(id_hash: u64, id_type: IdType) -> Self {
        Self {
            id_hash,
            id_type,
            fragments: DashMap::new(),
        }
    }

    pub fn id_hash(&self) -> u64 {
        self.id_hash
    }

    pub fn id_type(&self) -> IdType {
        self.id_type
    }

    pub fn add(&self, start: Timestamp, fragment: String) {
        self.fragments.insert(start, fragment);
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// merged joins the fragments in ascending shard start order.
    pub fn merged(&self) -> String {
        let mut fragments: Vec<(Timestamp, String)> = self
            .fragments
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        fragments.sort_by(|a, b| a.0.cmp(&b.0));

        fragments
            .into_iter()
            .map(|(_, f)| f)
            .collect::<Vec<_>>()
            .join(",")
    }
}

type SourceTable = DashMap<u64, Arc<SeriesWrapper>>;

/// IngestOutcome tells what happened to a shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Empty shards carry no series or no payload.
    Empty,
    /// Skipped shards had no value within the query window.
    Skipped,
    Accepted,
}

/// FlushOutcome counts the series written and the ones dropped for lack of an
/// identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushOutcome {
    pub series: u64,
    pub unresolved: u64,
}

/// PartialSeriesAggregator collects shards of numeric series delivered in any
/// order by many producers and merges them per series at flush.
///
/// The table lives as long as one query: it is built at query start and
/// drained by `flush`.
#[derive(Default)]
pub struct PartialSeriesAggregator {
    sources: DashMap<String, Arc<SourceTable>>,
}

impl PartialSeriesAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// ingest renders the in-window values of the shard as `"ts":value` pairs
    /// and files them under the shard's source and series hash.
    pub fn ingest(
        &self,
        shard: &PartialTimeSeries,
        start: &Timestamp,
        end: &Timestamp,
    ) -> anyhow::Result<IngestOutcome> {
        if shard.set.time_series_count < 1 {
            return Ok(IngestOutcome::Empty);
        }
        let array = match &shard.value {
            Some(array) => array,
            None => return Ok(IngestOutcome::Empty),
        };

        let mut decoder = WindowDecoder::new(array, start.epoch(), end.epoch())?;
        let mut json = JsonWriter::object_fragment(Vec::new());
        let mut count = 0;
        while let Some((ts, value)) = decoder.try_next()? {
            json.numeric_field(&ts.to_string(), Some(value))?;
            count += 1;
        }
        if count == 0 {
            return Ok(IngestOutcome::Skipped);
        }
        let fragment = String::from_utf8(json.into_inner())?;

        let table = self.source_table(shard.set.source_id());
        let wrapper = self.series_wrapper(&table, shard.id_hash, shard.id_type);
        wrapper.add(shard.set.start, fragment);

        Ok(IngestOutcome::Accepted)
    }

    fn source_table(&self, source_id: String) -> Arc<SourceTable> {
        if let Some(table) = self.sources.get(&source_id) {
            return table.value().clone();
        }

        self.sources
            .entry(source_id)
            .or_insert_with(|| Arc::new(DashMap::new()))
            .value()
            .clone()
    }

    fn series_wrapper(&self, table: &SourceTable, id_hash: u64, id_type: IdType) -> Arc<SeriesWrapper> {
        if let Some(wrapper) = table.get(&id_hash) {
            return wrapper.value().clone();
        }

        table
            .entry(id_hash)
            .or_insert_with(|| Arc::new(SeriesWrapper::new(id_hash, id_type)))
            .value()
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// series_count returns the number of series wrappers across all sources.
    pub fn series_count(&self) -> usize {
        self.sources.iter().map(|t| t.value().len()).sum()
    }

    /// flush drains the table, writing one result entry per source into the
    /// open `results` array. Sources are written in ascending id order and
    /// series in ascending hash order. A source whose series all lack an
    /// identity writes nothing.
    pub fn flush<W: Write>(
        &self,
        json: &mut JsonWriter<W>,
        registry: &dyn IdRegistry,
    ) -> io::Result<FlushOutcome> {
        let mut outcome = FlushOutcome::default();

        let mut source_ids: Vec<String> = self.sources.iter().map(|e| e.key().clone()).collect();
        source_ids.sort();

        for source_id in source_ids {
            let table = match self.sources.remove(&source_id) {
                Some((_, table)) => table,
                None => continue,
            };

            let mut wrappers: Vec<Arc<SeriesWrapper>> =
                table.iter().map(|e| e.value().clone()).collect();
            wrappers.sort_by_key(|w| w.id_hash());

            let mut entries = Vec::with_capacity(wrappers.len());
            for wrapper in wrappers {
                if wrapper.is_empty() {
                    continue;
                }
                match registry.get_id(wrapper.id_hash(), wrapper.id_type()) {
                    Some(id) => entries.push((id, wrapper)),
                    None => {
                        outcome.unresolved += 1;
                        warn!(
                            "no identity for partial series {} of {}",
                            wrapper.id_hash(),
                            source_id
                        );
                    }
                }
            }
            if entries.is_empty() {
                continue;
            }

            json.start_object()?;
            json.string_field("source", &source_id)?;
            json.start_array_field("data")?;
            for (id, wrapper) in entries {
                json.start_object()?;
                write_identity(json, &id, true)?;
                json.field_name("NumericType")?;
                json.write_raw_value(format!("{{{}}}", wrapper.merged()).as_bytes())?;
                json.end_object()?;
                outcome.series += 1;
            }
            json.end_array()?;
            json.end_object()?;
        }

        Ok(outcome)
    }
}
