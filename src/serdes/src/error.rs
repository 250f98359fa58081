use std::io;

/// SerdesError is the failure surface of the query serializer.
#[derive(Debug, thiserror::Error)]
pub enum SerdesError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("serialization failed for {result}: {source}")]
    Serialization {
        result: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode shard of {source_id}: {source}")]
    Decode {
        source_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to resolve series ids: {0}")]
    Resolution(#[source] anyhow::Error),

    #[error("{count} partial series could not be resolved to an identity")]
    UnresolvedSeries { count: u64 },

    #[error("the document has already been closed")]
    Closed,

    #[error("not supported: {0}")]
    NotSupported(&'static str),
}

impl SerdesError {
    pub fn serialization(result: impl Into<String>, source: io::Error) -> Self {
        SerdesError::Serialization {
            result: result.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SerdesError>;
