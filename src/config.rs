use std::path::Path;

use alloy::primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{
    broker_for_network, DEFAULT_CONFIRM_TIMEOUT_SECS, DEFAULT_QUOTE_TTL_SECS,
    DEFAULT_RECEIPT_POLL_MS, DEFAULT_SLIPPAGE_BPS,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    /// Override the built-in aggregator address for this chain.
    #[serde(default)]
    pub broker: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapSettings {
    #[serde(default = "default_slippage_bps")]
    pub default_slippage_bps: u32,
    #[serde(default = "default_confirm_timeout_secs")]
    pub confirm_timeout_secs: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_quote_ttl_secs")]
    pub quote_ttl_secs: u64,
}

impl Default for SwapSettings {
    fn default() -> Self {
        Self {
            default_slippage_bps: DEFAULT_SLIPPAGE_BPS,
            confirm_timeout_secs: DEFAULT_CONFIRM_TIMEOUT_SECS,
            receipt_poll_ms: DEFAULT_RECEIPT_POLL_MS,
            quote_ttl_secs: DEFAULT_QUOTE_TTL_SECS,
        }
    }
}

fn default_slippage_bps() -> u32 {
    DEFAULT_SLIPPAGE_BPS
}

fn default_confirm_timeout_secs() -> u64 {
    DEFAULT_CONFIRM_TIMEOUT_SECS
}

fn default_receipt_poll_ms() -> u64 {
    DEFAULT_RECEIPT_POLL_MS
}

fn default_quote_ttl_secs() -> u64 {
    DEFAULT_QUOTE_TTL_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    #[serde(default)]
    pub swap: SwapSettings,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Config for a known chain with only an RPC url, no file needed.
    pub fn for_chain(chain_id: u64, rpc_url: String) -> Result<Self> {
        anyhow::ensure!(
            broker_for_network(chain_id).is_some(),
            "unsupported chain id: {chain_id}"
        );
        Ok(Config {
            network: NetworkConfig {
                chain_id,
                name: format!("chain-{chain_id}"),
                rpc_url,
                broker: None,
            },
            swap: SwapSettings::default(),
        })
    }

    /// The aggregator address to use: explicit override or built-in per chain.
    pub fn broker_address(&self) -> Result<Address> {
        if let Some(address) = self.network.broker {
            return Ok(address);
        }
        broker_for_network(self.network.chain_id).with_context(|| {
            format!(
                "no built-in broker for chain {}; set network.broker",
                self.network.chain_id
            )
        })
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.network.rpc_url.is_empty(),
            "network.rpc_url must not be empty"
        );
        anyhow::ensure!(
            self.swap.default_slippage_bps <= crate::constants::MAX_SLIPPAGE_BPS,
            "swap.default_slippage_bps exceeds the maximum of {} bps",
            crate::constants::MAX_SLIPPAGE_BPS
        );
        Ok(())
    }
}
