use std::path::PathBuf;

use clap::Args;
use common::prelude::*;

use crate::state::{AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Upload {
    /// File to encrypt and upload
    pub path: PathBuf,

    /// Encryption key to use
    #[arg(long, group = "key_source")]
    pub key: Option<String>,

    /// Generate a fresh random key for this file
    #[arg(long, group = "key_source")]
    pub generate_key: bool,

    /// MIME type of the file (guessed from the extension otherwise)
    #[arg(long)]
    pub mime: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadOpError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no pinning service JWT; set ${0}")]
    MissingJwt(String),
    #[error("invalid key: {0}")]
    Key(#[from] KeyError),
    #[error("upload failed at stage '{}': {source}", .source.stage())]
    Upload {
        #[from]
        source: UploadError,
    },
}

#[async_trait::async_trait]
impl crate::op::Op for Upload {
    type Error = UploadOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        if state.pinning_jwt().is_none() {
            return Err(UploadOpError::MissingJwt(
                state.config.pinning_jwt_env.clone(),
            ));
        }
        let mut session = state.connect(ctx.account.as_deref())?;

        let generated = if let Some(key) = &self.key {
            session.set_custom_key(key)?;
            false
        } else if self.generate_key {
            session.generate_key()?;
            true
        } else {
            false
        };

        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| UploadOpError::Read {
                path: self.path.clone(),
                source,
            })?;
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unnamed".to_string());
        let mime = match &self.mime {
            Some(mime) => mime.clone(),
            None => mime_guess::from_path(&self.path)
                .first_raw()
                .unwrap_or_default()
                .to_string(),
        };

        let uploaded = session
            .upload_with_progress(FileUpload::new(name.clone(), mime, bytes), |stage| {
                tracing::info!(%stage, "upload progress");
            })
            .await?;

        let mut output = format!(
            "Uploaded {}\n\
             - CID: {}\n\
             - Identifier: {}\n\
             - Transaction: {} (block {})",
            name,
            uploaded.cid,
            uploaded.encrypted_identifier,
            uploaded.receipt.tx_hash,
            uploaded.receipt.block
        );
        if generated {
            if let Some(key) = session.active_key() {
                output.push_str(&format!(
                    "\n- Key: {} (share it out of band with anyone who should read the file)",
                    key.as_str()
                ));
            }
        }
        session.disconnect();
        Ok(output)
    }
}
