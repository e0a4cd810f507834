use clap::Args;
use common::prelude::*;
use url::Url;

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Pinning service base URL
    #[arg(long)]
    pub pinning_api_url: Option<Url>,

    /// Environment variable to read the pinning service JWT from
    #[arg(long)]
    pub pinning_jwt_env: Option<String>,

    /// Retrieval gateway base URL, tried in the order given (repeatable)
    #[arg(long = "gateway")]
    pub gateways: Vec<Url>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init needs the account to act as; pass --account")]
    MissingAccount,
    #[error("invalid account: {0}")]
    Address(#[from] AddressError),
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let account = ctx.account.as_deref().ok_or(InitError::MissingAccount)?;
        let mut config = AppConfig::new(AccountAddress::parse(account)?);
        if let Some(url) = &self.pinning_api_url {
            config.pinning_api_url = url.clone();
        }
        if let Some(var) = &self.pinning_jwt_env {
            config.pinning_jwt_env = var.clone();
        }
        if !self.gateways.is_empty() {
            config.gateways = self.gateways.clone();
        }

        let state = AppState::init(ctx.config_path.clone(), config)?;

        let gateways = state
            .config
            .gateways
            .iter()
            .map(Url::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        let output = format!(
            "Initialized ipvault directory at: {}\n\
             - Config: {}\n\
             - Account: {}\n\
             - Pinning API: {} (JWT from ${})\n\
             - Gateways: {}",
            state.ipvault_dir.display(),
            state.config_path.display(),
            state.config.account,
            state.config.pinning_api_url,
            state.config.pinning_jwt_env,
            gateways
        );

        Ok(output)
    }
}
