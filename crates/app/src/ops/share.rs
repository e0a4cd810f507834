use clap::Args;
use common::prelude::*;

use crate::state::{AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Share {
    /// Your file's identifier, as listed by `ls`
    pub identifier: String,

    /// Account to grant access to
    pub recipient: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("failed to share: {0}")]
    Sharing(#[from] SharingError),
}

#[async_trait::async_trait]
impl crate::op::Op for Share {
    type Error = ShareError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let session = state.connect(ctx.account.as_deref())?;

        let shared = session.share(&self.identifier, &self.recipient).await?;

        Ok(format!(
            "Shared with {}\n\
             - Recipient identifier: {}\n\
             - Transaction: {} (block {})\n\
             The recipient still needs the file's key, sent out of band.",
            shared.recipient,
            shared.recipient_identifier,
            shared.receipt.tx_hash,
            shared.receipt.block
        ))
    }
}
