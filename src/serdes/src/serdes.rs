use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use common_base::partial::PartialTimeSeries;
use common_base::series::QueryResult;
use tokio::sync::Mutex;

use crate::bulk;
use crate::context::{LogLevel, QueryContext};
use crate::document::{Document, DocumentState};
use crate::error::{Result, SerdesError};
use crate::options::SerdesOptions;
use crate::partial::{IngestOutcome, PartialSeriesAggregator};

/// SerdesStats counts what a serializer has processed so far.
#[derive(Debug, Default)]
pub struct SerdesStats {
    serialized_series: AtomicU64,
    ingested_shards: AtomicU64,
    skipped_shards: AtomicU64,
    unresolved_series: AtomicU64,
}

impl SerdesStats {
    /// serialized_series is the number of series written to the document.
    pub fn serialized_series(&self) -> u64 {
        self.serialized_series.load(Ordering::Relaxed)
    }

    pub fn ingested_shards(&self) -> u64 {
        self.ingested_shards.load(Ordering::Relaxed)
    }

    /// skipped_shards counts shards that were empty or had no in-window value.
    pub fn skipped_shards(&self) -> u64 {
        self.skipped_shards.load(Ordering::Relaxed)
    }

    pub fn unresolved_series(&self) -> u64 {
        self.unresolved_series.load(Ordering::Relaxed)
    }
}

/// QuerySerdes renders the results of one query as a JSON document.
///
/// Results arrive either whole, through `serialize`, or as shards of numeric
/// series through `serialize_partial`. A query uses one of the two modes.
/// `serialize_complete` closes the document once the query is done.
pub struct QuerySerdes<W: Write + Send> {
    context: Arc<dyn QueryContext>,
    options: SerdesOptions,
    document: Mutex<Document<W>>,
    partials: PartialSeriesAggregator,
    /// initialized is set once a whole result was written.
    initialized: AtomicBool,
    partial_used: AtomicBool,
    /// closed is set once `serialize_complete` started closing the document.
    closed: AtomicBool,
    stats: SerdesStats,
}

impl<W: Write + Send> QuerySerdes<W> {
    pub fn new(context: Arc<dyn QueryContext>, options: SerdesOptions, out: W) -> Result<Self> {
        if context.start() > context.end() {
            return Err(SerdesError::InvalidArgument(format!(
                "query start {} is after its end {}",
                context.start().epoch(),
                context.end().epoch()
            )));
        }

        Ok(Self {
            context,
            options,
            document: Mutex::new(Document::new(out)),
            partials: PartialSeriesAggregator::new(),
            initialized: AtomicBool::new(false),
            partial_used: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            stats: SerdesStats::default(),
        })
    }

    pub fn options(&self) -> &SerdesOptions {
        &self.options
    }

    pub fn stats(&self) -> &SerdesStats {
        &self.stats
    }

    /// serialize renders a whole result and appends it to the document.
    pub async fn serialize(&self, result: &dyn QueryResult) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SerdesError::Closed);
        }
        if self.partial_used.load(Ordering::Acquire) {
            return Err(SerdesError::InvalidArgument(
                "whole results can not be mixed with partial series".to_string(),
            ));
        }

        let ids = bulk::resolve_ids(result, self.context.id_resolver()).await?;
        let rendered = bulk::render_result(
            result,
            &ids,
            self.context.start(),
            self.context.end(),
            &self.options,
        )
        .map_err(|e| {
            error!("failed to render {}: {}", bulk::source_id(result), e);
            e
        })?;

        let mut document = self.document.lock().await;
        document.write_result(&rendered.source_id, &rendered.bytes)?;
        self.initialized.store(true, Ordering::Release);
        self.stats
            .serialized_series
            .fetch_add(rendered.series, Ordering::Relaxed);

        debug!(
            "serialized {} series of {}",
            rendered.series, rendered.source_id
        );
        Ok(())
    }

    /// serialize_partial files one shard. It may be called concurrently from
    /// many producers.
    pub fn serialize_partial(&self, shard: &PartialTimeSeries) -> Result<IngestOutcome> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SerdesError::Closed);
        }
        if self.initialized.load(Ordering::Acquire) {
            return Err(SerdesError::InvalidArgument(
                "partial series can not be mixed with whole results".to_string(),
            ));
        }

        let outcome = self
            .partials
            .ingest(shard, &self.context.start(), &self.context.end())
            .map_err(|e| SerdesError::Decode {
                source_id: shard.set.source_id(),
                source: e,
            })?;

        match outcome {
            IngestOutcome::Accepted => {
                self.partial_used.store(true, Ordering::Release);
                self.stats.ingested_shards.fetch_add(1, Ordering::Relaxed);
            }
            IngestOutcome::Empty | IngestOutcome::Skipped => {
                debug!(
                    "shard {} of {} skipped: {:?}",
                    shard.id_hash,
                    shard.set.source_id(),
                    outcome
                );
                self.stats.skipped_shards.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(outcome)
    }

    /// serialize_complete flushes the partial series when no whole result was
    /// written, closes the document and flushes the stream.
    ///
    /// With `strict_partial_ids` set, partial series without an identity fail
    /// the call after the document has been closed.
    pub async fn serialize_complete(&self) -> Result<()> {
        let mut document = self.document.lock().await;
        if document.state() == DocumentState::Closed {
            return Err(SerdesError::Closed);
        }
        self.closed.store(true, Ordering::Release);

        let mut unresolved = 0;
        if !self.initialized.load(Ordering::Acquire) && !self.partials.is_empty() {
            let json = document.results()?;
            let outcome = self
                .partials
                .flush(json, self.context.id_registry())
                .map_err(|e| SerdesError::serialization("partial series", e))?;

            self.stats
                .serialized_series
                .fetch_add(outcome.series, Ordering::Relaxed);
            self.stats
                .unresolved_series
                .fetch_add(outcome.unresolved, Ordering::Relaxed);
            unresolved = outcome.unresolved;
            if unresolved > 0 {
                warn!("{} partial series dropped without an identity", unresolved);
            }
        } else if !self.partials.is_empty() {
            warn!("partial series discarded, the query already wrote whole results");
        }

        let logs = match self.context.log_level() {
            LogLevel::Off => None,
            _ => Some(self.context.logs()),
        };
        document.close(logs.as_deref())?;

        if unresolved > 0 && self.options.strict_partial_ids {
            return Err(SerdesError::UnresolvedSeries { count: unresolved });
        }
        Ok(())
    }

    /// deserialize reading a document back is not supported.
    pub fn deserialize(&self, _input: &[u8]) -> Result<()> {
        Err(SerdesError::NotSupported("deserializing query results"))
    }

    pub fn into_inner(self) -> W {
        self.document.into_inner().into_inner()
    }
}
