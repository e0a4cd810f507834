use std::path::PathBuf;

use clap::Args;
use common::prelude::*;

use crate::state::{AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct View {
    /// Encrypted identifier (as listed by `ls`) or raw CID
    pub identifier: String,

    /// Decryption key for the file; stored keys are never used implicitly
    #[arg(long)]
    pub key: Option<String>,

    /// Write the decrypted file here instead of printing it
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("invalid key: {0}")]
    Key(#[from] KeyError),
    #[error(
        "{0}; pass the file's key with --key (`ipvault key list --show-keys` shows keys stored on this device)"
    )]
    KeyRequired(#[source] RetrievalError),
    #[error("failed to retrieve file: {0}")]
    Retrieval(#[source] RetrievalError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<RetrievalError> for ViewError {
    fn from(err: RetrievalError) -> Self {
        if err.needs_key_prompt() {
            ViewError::KeyRequired(err)
        } else {
            ViewError::Retrieval(err)
        }
    }
}

#[async_trait::async_trait]
impl crate::op::Op for View {
    type Error = ViewError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let session = state.connect(ctx.account.as_deref())?;

        let key = self
            .key
            .as_deref()
            .map(EncryptionKey::custom)
            .transpose()?;

        let file = session.retrieve(&self.identifier, key.as_ref()).await?;
        let mime = file.mime.as_deref().unwrap_or("unknown type");

        if let Some(path) = &self.output {
            tokio::fs::write(path, &file.bytes)
                .await
                .map_err(|source| ViewError::Write {
                    path: path.clone(),
                    source,
                })?;
            return Ok(format!(
                "Wrote {} bytes ({}, {}) to {}",
                file.bytes.len(),
                mime,
                file.category,
                path.display()
            ));
        }

        match file.pretty_text() {
            Some(text) => Ok(text),
            None => Ok(format!(
                "{} file, {} bytes ({}); pass --output to save it",
                file.category,
                file.bytes.len(),
                mime
            )),
        }
    }
}
