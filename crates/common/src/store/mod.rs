use std::path::PathBuf;

mod identifier_cache;
mod json_file;
mod key_store;

pub use identifier_cache::IdentifierCache;
pub(crate) use json_file::JsonFile;
pub use key_store::{KeyStore, KeyStoreEntry};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
