use std::collections::HashMap;
use std::sync::Arc;

use common_base::id::{IdType, TimeSeriesByteId, TimeSeriesStringId};
use common_base::timestamp::Timestamp;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// LogLevel of the query. Anything but `Off` appends the query log to the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// IdResolver decodes byte encoded series ids, usually against a remote store.
#[async_trait]
pub trait IdResolver: Send + Sync {
    async fn decode(&self, id: &TimeSeriesByteId) -> anyhow::Result<TimeSeriesStringId>;
}

/// IdRegistry maps the id hash carried by shards back to the series identity.
pub trait IdRegistry: Send + Sync {
    fn get_id(&self, hash: u64, id_type: IdType) -> Option<TimeSeriesStringId>;
}

/// QueryContext is the query the serializer renders results for.
pub trait QueryContext: Send + Sync {
    fn start(&self) -> Timestamp;

    fn end(&self) -> Timestamp;

    fn log_level(&self) -> LogLevel;

    fn logs(&self) -> Vec<String>;

    fn id_registry(&self) -> &dyn IdRegistry;

    fn id_resolver(&self) -> Option<&dyn IdResolver>;
}

#[derive(Default)]
pub struct MemIdRegistry {
    ids: DashMap<(u64, IdType), TimeSeriesStringId>,
}

impl MemIdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// register stores the identity under its hash and returns the hash.
    pub fn register(&self, id: TimeSeriesStringId) -> u64 {
        let hash = id.build_hash();
        self.register_with_hash(hash, IdType::String, id);
        hash
    }

    pub fn register_with_hash(&self, hash: u64, id_type: IdType, id: TimeSeriesStringId) {
        self.ids.insert((hash, id_type), id);
    }
}

impl IdRegistry for MemIdRegistry {
    fn get_id(&self, hash: u64, id_type: IdType) -> Option<TimeSeriesStringId> {
        self.ids.get(&(hash, id_type)).map(|e| e.value().clone())
    }
}

/// MemIdResolver resolves byte ids from a fixed table.
#[derive(Default)]
pub struct MemIdResolver {
    ids: HashMap<Vec<u8>, TimeSeriesStringId>,
}

impl MemIdResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bytes: Vec<u8>, id: TimeSeriesStringId) {
        self.ids.insert(bytes, id);
    }
}

#[async_trait]
impl IdResolver for MemIdResolver {
    async fn decode(&self, id: &TimeSeriesByteId) -> anyhow::Result<TimeSeriesStringId> {
        self.ids
            .get(&id.bytes)
            .cloned()
            .ok_or(anyhow!("no identity for {:?}", id))
    }
}

/// StaticQueryContext is a query context with a fixed window.
pub struct StaticQueryContext {
    start: Timestamp,
    end: Timestamp,
    log_level: LogLevel,
    logs: Vec<String>,
    registry: Arc<MemIdRegistry>,
    resolver: Option<Arc<dyn IdResolver>>,
}

impl StaticQueryContext {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start,
            end,
            log_level: LogLevel::Off,
            logs: vec![],
            registry: Arc::new(MemIdRegistry::new()),
            resolver: None,
        }
    }

    pub fn with_logs(mut self, log_level: LogLevel, logs: Vec<String>) -> Self {
        self.log_level = log_level;
        self.logs = logs;
        self
    }

    pub fn with_registry(mut self, registry: Arc<MemIdRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn IdResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

impl QueryContext for StaticQueryContext {
    fn start(&self) -> Timestamp {
        self.start
    }

    fn end(&self) -> Timestamp {
        self.end
    }

    fn log_level(&self) -> LogLevel {
        self.log_level
    }

    fn logs(&self) -> Vec<String> {
        self.logs.clone()
    }

    fn id_registry(&self) -> &dyn IdRegistry {
        self.registry.as_ref()
    }

    fn id_resolver(&self) -> Option<&dyn IdResolver> {
        self.resolver.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use common_base::id::{IdType, TimeSeriesByteId, TimeSeriesStringId};

    use crate::context::{IdRegistry, IdResolver, MemIdRegistry, MemIdResolver};

    #[test]
    fn test_registry_lookup() {
        let registry = MemIdRegistry::new();
        let id = TimeSeriesStringId::new("sys.cpu").with_tag("host", "a");
        let hash = registry.register(id.clone());

        assert_eq!(registry.get_id(hash, IdType::String), Some(id));
        assert_eq!(registry.get_id(hash, IdType::Byte), None);
        assert_eq!(registry.get_id(hash ^ 1, IdType::String), None);
    }

    #[tokio::test]
    async fn test_resolver() -> anyhow::Result<()> {
        let mut resolver = MemIdResolver::new();
        resolver.insert(vec![1, 2], TimeSeriesStringId::new("m"));

        let id = resolver.decode(&TimeSeriesByteId::new(vec![1, 2])).await?;
        assert_eq!(id.metric, "m");
        assert!(resolver
            .decode(&TimeSeriesByteId::new(vec![3]))
            .await
            .is_err());
        Ok(())
    }
}
