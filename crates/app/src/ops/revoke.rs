use clap::Args;
use common::prelude::*;

use crate::state::{AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Revoke {
    /// Your file's identifier, as listed by `ls`
    pub identifier: String,

    /// Account to withdraw access from
    pub recipient: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RevokeError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("failed to revoke: {0}")]
    Sharing(#[from] SharingError),
}

#[async_trait::async_trait]
impl crate::op::Op for Revoke {
    type Error = RevokeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let session = state.connect(ctx.account.as_deref())?;

        let receipt = session.revoke(&self.identifier, &self.recipient).await?;

        Ok(format!(
            "Revoked access for {} (tx {}, block {})\n\
             Copies the recipient already retrieved are not affected.",
            self.recipient.trim(),
            receipt.tx_hash,
            receipt.block
        ))
    }
}
