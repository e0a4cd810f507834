use clap::Args;
use common::prelude::*;

#[derive(Args, Debug, Clone)]
pub struct Generate;

#[async_trait::async_trait]
impl crate::op::Op for Generate {
    type Error = KeyError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let key = EncryptionKey::generate()?;
        Ok(format!(
            "{}\n\nPass it to `ipvault upload --key`. Anyone who should read \
             files encrypted with it needs it too; it is never stored on the ledger.",
            key.as_str()
        ))
    }
}
