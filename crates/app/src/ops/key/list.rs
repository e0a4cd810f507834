use clap::Args;

use crate::state::{AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct List {
    /// Print the keys themselves, not just which files have one
    #[arg(long)]
    pub show_keys: bool,
}

#[async_trait::async_trait]
impl crate::op::Op for List {
    type Error = StateError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let session = state.connect(ctx.account.as_deref())?;

        let entries = session.key_store().entries();
        if entries.is_empty() {
            return Ok("No keys stored on this device".to_string());
        }

        let output = entries
            .iter()
            .map(|(cid, entry)| {
                let key = if self.show_keys {
                    entry.key.as_str()
                } else {
                    "<hidden>"
                };
                format!(
                    "{} {} ({}) key: {}",
                    cid, entry.original_name, entry.original_type, key
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        Ok(output)
    }
}
