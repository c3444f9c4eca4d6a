//! Client configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tessera_keyring::KeyProvider;
use tessera_log::LogConfig;
use tessera_math::Coins;
use tessera_types::{BroadcastMode, Network};
use thiserror::Error;
use url::Url;

use crate::context::TxContext;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },

    #[error("unknown configuration key: {0}")]
    UnknownKey(String),
}

fn invalid(key: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

/// SDK configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    /// Node RPC endpoint
    pub node_uri: String,
    /// WebSocket path, joined onto `node_uri`
    pub ws_path: String,
    pub chain_id: String,
    /// Selects the address prefix
    pub network: Network,
    /// Default broadcast mode
    pub mode: BroadcastMode,
    /// Refresh account number and sequence from the node before signing
    pub online: bool,
    /// Default gas limit
    pub gas: u64,
    /// Default fee, e.g. `600000000000000000stake`
    pub fee: String,
    /// Multiplier applied to simulated gas
    pub gas_adjustment: f64,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Subscriber id used for event subscriptions
    pub subscriber_id: Option<String>,
    pub log: LogConfig,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            node_uri: "http://localhost:26657".to_string(),
            ws_path: "/websocket".to_string(),
            chain_id: "irishub".to_string(),
            network: Network::Mainnet,
            mode: BroadcastMode::Sync,
            online: true,
            gas: 200_000,
            fee: String::new(),
            gas_adjustment: 1.5,
            timeout_secs: 30,
            subscriber_id: None,
            log: LogConfig::default(),
        }
    }
}

impl SdkConfig {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: SdkConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id.trim().is_empty() {
            return Err(invalid("chain_id", "must not be empty"));
        }
        Url::parse(&self.node_uri).map_err(|e| invalid("node_uri", e))?;
        if self.gas_adjustment.is_nan() || self.gas_adjustment < 1.0 {
            return Err(invalid("gas_adjustment", "must be at least 1.0"));
        }
        self.fee_coins()?;
        Ok(())
    }

    pub fn fee_coins(&self) -> Result<Coins, ConfigError> {
        Coins::from_str(&self.fee).map_err(|e| invalid("fee", e))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Subscriber id, falling back to one derived from the chain id
    pub fn subscriber(&self) -> String {
        self.subscriber_id
            .clone()
            .unwrap_or_else(|| format!("tessera-{}", self.chain_id))
    }

    /// Base transaction context described by this configuration
    pub fn tx_context(&self, key_provider: Arc<dyn KeyProvider>) -> Result<TxContext, ConfigError> {
        Ok(TxContext::new(&self.chain_id, key_provider)
            .with_network(self.network)
            .with_mode(self.mode)
            .with_online(self.online)
            .with_gas(self.gas)
            .with_fee(self.fee_coins()?))
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "node_uri" => self.node_uri = value.to_string(),
            "ws_path" => self.ws_path = value.to_string(),
            "chain_id" => self.chain_id = value.to_string(),
            "network" => {
                self.network = match value {
                    "mainnet" => Network::Mainnet,
                    "testnet" => Network::Testnet,
                    other => return Err(invalid(key, format!("unknown network {other}"))),
                }
            }
            "mode" => self.mode = value.parse().map_err(|e| invalid(key, e))?,
            "online" => self.online = value.parse().map_err(|e| invalid(key, e))?,
            "gas" => self.gas = value.parse().map_err(|e| invalid(key, e))?,
            "fee" => {
                Coins::from_str(value).map_err(|e| invalid(key, e))?;
                self.fee = value.to_string();
            }
            "gas_adjustment" => {
                self.gas_adjustment = value.parse().map_err(|e| invalid(key, e))?
            }
            "timeout_secs" => self.timeout_secs = value.parse().map_err(|e| invalid(key, e))?,
            "subscriber_id" => self.subscriber_id = Some(value.to_string()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}
