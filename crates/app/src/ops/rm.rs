use clap::Args;
use common::prelude::*;

use crate::state::{AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Rm {
    /// Your file's identifier, as listed by `ls`
    pub identifier: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RmError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("failed to delete: {0}")]
    Delete(#[from] DeleteError),
}

#[async_trait::async_trait]
impl crate::op::Op for Rm {
    type Error = RmError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let session = state.connect(ctx.account.as_deref())?;

        let receipt = session.delete(&self.identifier).await?;

        Ok(format!(
            "Deleted {} (tx {}, block {})\n\
             The pinned ciphertext stays on the storage network.",
            self.identifier.trim(),
            receipt.tx_hash,
            receipt.block
        ))
    }
}
