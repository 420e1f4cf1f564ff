//! Errors returned by the snapshot store.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("save name is empty after sanitization")]
    EmptyName,

    #[error("save {0} not found")]
    NotFound(String),

    #[error("saves directory {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("save {id} is corrupt: {source}")]
    Corrupt {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}
