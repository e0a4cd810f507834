use std::{env, fs, path::PathBuf};

use common::gateway::DEFAULT_GATEWAYS;
use common::pinning::DEFAULT_PINNING_API;
use common::prelude::*;
use serde::{Deserialize, Serialize};
use url::Url;

pub const APP_NAME: &str = "ipvault";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEYS_FILE_NAME: &str = "keys.json";
pub const IDENTIFIERS_FILE_NAME: &str = "identifiers.json";
pub const LEDGER_FILE_NAME: &str = "ledger.json";

pub type AppSession = Session<MemoryLedger, PinataClient>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Account the client acts as
    pub account: AccountAddress,
    /// Base URL of the pinning service
    #[serde(default = "default_pinning_api_url")]
    pub pinning_api_url: Url,
    /// Environment variable holding the pinning service JWT
    #[serde(default = "default_pinning_jwt_env")]
    pub pinning_jwt_env: String,
    /// Retrieval gateways, tried in order
    #[serde(default = "default_gateways")]
    pub gateways: Vec<Url>,
    /// Default log level, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_pinning_api_url() -> Url {
    Url::parse(DEFAULT_PINNING_API).expect("default pinning url must parse")
}

fn default_pinning_jwt_env() -> String {
    "PINATA_JWT".to_string()
}

fn default_gateways() -> Vec<Url> {
    DEFAULT_GATEWAYS
        .iter()
        .map(|g| Url::parse(g).expect("default gateway urls must parse"))
        .collect()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    pub fn new(account: AccountAddress) -> Self {
        Self {
            account,
            pinning_api_url: default_pinning_api_url(),
            pinning_jwt_env: default_pinning_jwt_env(),
            gateways: default_gateways(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the ipvault directory (~/.ipvault)
    pub ipvault_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Path to the device key store
    pub keys_path: PathBuf,
    /// Path to the encrypted identifier cache
    pub identifiers_path: PathBuf,
    /// Path to the local development ledger
    pub ledger_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the ipvault directory path (custom or default ~/.ipvault)
    pub fn ipvault_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    fn from_parts(ipvault_dir: PathBuf, config: AppConfig) -> Self {
        Self {
            config_path: ipvault_dir.join(CONFIG_FILE_NAME),
            keys_path: ipvault_dir.join(KEYS_FILE_NAME),
            identifiers_path: ipvault_dir.join(IDENTIFIERS_FILE_NAME),
            ledger_path: ipvault_dir.join(LEDGER_FILE_NAME),
            ipvault_dir,
            config,
        }
    }

    /// Initialize a new ipvault state directory
    pub fn init(custom_path: Option<PathBuf>, config: AppConfig) -> Result<Self, StateError> {
        let ipvault_dir = Self::ipvault_dir(custom_path)?;

        if ipvault_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&ipvault_dir)?;

        let state = Self::from_parts(ipvault_dir, config);
        let config_toml = toml::to_string_pretty(&state.config)?;
        fs::write(&state.config_path, config_toml)?;

        Ok(state)
    }

    /// Load existing state from the ipvault directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let ipvault_dir = Self::ipvault_dir(custom_path)?;

        if !ipvault_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = ipvault_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self::from_parts(ipvault_dir, config))
    }

    /// The pinning service JWT, if its environment variable is set
    pub fn pinning_jwt(&self) -> Option<String> {
        env::var(&self.config.pinning_jwt_env)
            .ok()
            .filter(|jwt| !jwt.trim().is_empty())
    }

    /// Connect a session, as `account` if given or the configured account otherwise
    ///
    /// Device state (keys, identifier cache, local ledger) comes from the
    /// ipvault directory and is shared by every account using it.
    pub fn connect(&self, account: Option<&str>) -> Result<AppSession, StateError> {
        let account = match account {
            Some(account) => AccountAddress::parse(account)?,
            None => self.config.account.clone(),
        };

        let ledger = MemoryLedger::open(&self.ledger_path, account)?;
        let pinner = PinataClient::new(
            self.config.pinning_api_url.clone(),
            self.pinning_jwt().unwrap_or_default(),
        )?;
        let gateways = GatewayFetcher::new(self.config.gateways.clone())?;
        let key_store = KeyStore::open(&self.keys_path)?;
        let identifiers = IdentifierCache::open(&self.identifiers_path)?;

        Ok(Session::connect(
            ledger,
            pinner,
            gateways,
            key_store,
            identifiers,
        ))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("ipvault directory not initialized. Run 'ipvault init' first")]
    NotInitialized,

    #[error("ipvault directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid account: {0}")]
    Address(#[from] AddressError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("pinning client error: {0}")]
    Pinning(#[from] PinningError),

    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
