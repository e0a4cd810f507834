use chrono::{DateTime, Utc};
use clap::Args;
use common::identifier::Resolution;
use common::prelude::*;

use crate::state::{AppSession, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Ls {
    /// Only list files this account owns
    #[arg(long, conflicts_with = "shared")]
    pub owned: bool,

    /// Only list files shared with this account
    #[arg(long)]
    pub shared: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum LsError {
    #[error("state error: {0}")]
    State(#[from] StateError),
    #[error("failed to list files: {0}")]
    Ledger(#[from] LedgerError),
}

fn format_timestamp(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|time| time.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn describe_cid(session: &AppSession, identifier: &str) -> String {
    match session.resolve_identifier(identifier) {
        Ok(Resolution::Decrypted(cid)) | Ok(Resolution::Cached(cid)) => cid.to_string(),
        _ => "<sealed>".to_string(),
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Ls {
    type Error = LsError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let session = state.connect(ctx.account.as_deref())?;
        let listing = session.list_files().await?;

        let mut lines = Vec::new();
        if !self.shared {
            lines.push(format!("Owned by {} ({}):", session.account(), listing.owned.len()));
            for file in &listing.owned {
                lines.push(format!(
                    "  {}  {}  cid: {}",
                    format_timestamp(file.timestamp),
                    file.name,
                    describe_cid(&session, &file.cid)
                ));
                lines.push(format!("    identifier: {}", file.cid));
                if !file.people_with_access.is_empty() {
                    let people = file
                        .people_with_access
                        .iter()
                        .map(AccountAddress::as_str)
                        .collect::<Vec<_>>()
                        .join(", ");
                    lines.push(format!("    shared with: {}", people));
                }
            }
        }
        if !self.owned {
            lines.push(format!("Shared with me ({}):", listing.shared.len()));
            for file in &listing.shared {
                lines.push(format!(
                    "  {}  {}  cid: {}",
                    format_timestamp(file.timestamp),
                    file.name,
                    describe_cid(&session, &file.cid)
                ));
                lines.push(format!("    identifier: {}", file.cid));
                lines.push(format!("    owner: {}", file.owner));
            }
        }

        Ok(lines.join("\n"))
    }
}
