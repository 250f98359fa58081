use std::io;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use common_base::id::{IdType, TimeSeriesStringId};
use common_base::memory::{MemQueryResult, MemTimeSeries};
use common_base::partial::{NumericLongArray, PartialTimeSeries, PartialTimeSeriesSet};
use common_base::series::{DefaultRollupConfig, SourceKind, TimeSpecification};
use common_base::timestamp::{TimeUnit, Timestamp};
use common_base::types::NumericValue;
use serde::Deserialize;
use tracing::info;
use tsquery_serdes::context::{LogLevel, MemIdRegistry, MemIdResolver, StaticQueryContext};
use tsquery_serdes::{QuerySerdes, SerdesOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Bulk,
    Partial,
}

#[derive(Clone, Debug, Parser)]
#[clap(about, version, author)]
struct Config {
    /// fixture file describing the query and its results
    #[clap(long)]
    pub input: String,

    /// delivery mode, defaults to partial when the fixture carries shards
    #[clap(long, value_enum)]
    pub mode: Option<Mode>,

    /// render timestamp keys in milliseconds
    #[clap(long)]
    pub ms: bool,

    #[clap(long)]
    pub parallel_threshold: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    start: i64,
    end: i64,
    #[serde(default)]
    log_level: LogLevel,
    #[serde(default)]
    logs: Vec<String>,
    #[serde(default)]
    options: SerdesOptions,
    #[serde(default)]
    byte_ids: Vec<ByteIdFixture>,
    #[serde(default)]
    results: Vec<ResultFixture>,
    #[serde(default)]
    shards: Vec<ShardFixture>,
}

#[derive(Debug, Deserialize)]
struct ByteIdFixture {
    bytes: Vec<u8>,
    id: TimeSeriesStringId,
}

#[derive(Debug, Deserialize)]
struct TimeSpecFixture {
    start: i64,
    end: i64,
    interval: i64,
    units: TimeUnit,
    #[serde(default)]
    timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResultFixture {
    node_id: String,
    data_source: String,
    #[serde(default)]
    source_kind: SourceKind,
    #[serde(default)]
    time_specification: Option<TimeSpecFixture>,
    #[serde(default)]
    series: Vec<MemTimeSeries>,
}

impl ResultFixture {
    fn build(self) -> anyhow::Result<MemQueryResult> {
        let mut result = MemQueryResult::new(self.node_id, self.data_source)
            .with_source_kind(self.source_kind)
            .with_rollup_config(DefaultRollupConfig::new());
        if let Some(spec) = self.time_specification {
            result = result.with_time_specification(TimeSpecification::fixed(
                Timestamp::from_epoch(spec.start),
                Timestamp::from_epoch(spec.end),
                spec.interval,
                spec.units,
                spec.timezone,
            )?);
        }
        for series in self.series {
            result = result.add_series(series);
        }
        Ok(result)
    }
}

#[derive(Debug, Deserialize)]
struct ShardFixture {
    id: TimeSeriesStringId,
    node_id: String,
    data_source: String,
    start: i64,
    end: i64,
    points: Vec<(i64, NumericValue)>,
}

impl ShardFixture {
    fn build(self, registry: &MemIdRegistry) -> PartialTimeSeries {
        let mut builder = NumericLongArray::builder();
        for (ts, value) in self.points {
            builder = match value {
                NumericValue::Integer(v) => builder.integer(ts, v),
                NumericValue::Float(v) => builder.float(ts, v),
            };
        }

        PartialTimeSeries {
            id_hash: registry.register(self.id),
            id_type: IdType::String,
            set: Arc::new(PartialTimeSeriesSet {
                node_id: self.node_id,
                data_source: self.data_source,
                start: Timestamp::from_epoch(self.start),
                end: Timestamp::from_epoch(self.end),
                time_series_count: 1,
            }),
            value: Some(builder.build()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = Config::parse();
    if config.input.is_empty() {
        return Err(anyhow::anyhow!("input MUST not be empty"));
    }

    let raw = tokio::fs::read_to_string(config.input.as_str()).await?;
    let fixture: Fixture = serde_json::from_str(raw.as_str())?;

    let mut options = fixture.options.clone();
    if config.ms {
        options.ms_resolution = true;
    }
    if let Some(threshold) = config.parallel_threshold {
        options.parallel_threshold = threshold;
    }
    let mode = config.mode.unwrap_or(if fixture.shards.is_empty() {
        Mode::Bulk
    } else {
        Mode::Partial
    });

    let registry = Arc::new(MemIdRegistry::new());
    let mut resolver = MemIdResolver::new();
    for b in fixture.byte_ids {
        resolver.insert(b.bytes, b.id);
    }
    let context = StaticQueryContext::new(
        Timestamp::from_epoch(fixture.start),
        Timestamp::from_epoch(fixture.end),
    )
    .with_logs(fixture.log_level, fixture.logs)
    .with_registry(registry.clone())
    .with_resolver(Arc::new(resolver));

    let serdes = QuerySerdes::new(Arc::new(context), options, io::stdout())?;
    match mode {
        Mode::Bulk => {
            for result in fixture.results {
                let result = result.build()?;
                serdes.serialize(&result).await?;
            }
        }
        Mode::Partial => {
            for shard in fixture.shards {
                let shard = shard.build(registry.as_ref());
                serdes.serialize_partial(&shard)?;
            }
        }
    }
    serdes.serialize_complete().await?;
    println!();

    let stats = serdes.stats();
    info!(
        "rendered {} series, {} shards ingested, {} skipped, {} unresolved",
        stats.serialized_series(),
        stats.ingested_shards(),
        stats.skipped_shards(),
        stats.unresolved_series()
    );
    Ok(())
}
