use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown compound: {0}")]
    UnknownCompound(String),
    #[error("sample {sample_id} references batch {batch_code}, which is not part of the run")]
    UnknownBatch {
        sample_id: String,
        batch_code: String,
    },
    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
