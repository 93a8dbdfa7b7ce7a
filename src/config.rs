use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WalletError;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct WalletConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub wallet: SessionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
    Localnet,
}

impl Cluster {
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
        }
    }

    /// Block explorer page for an address or transaction signature
    pub fn explorer_url(&self, kind: &str, id: &str) -> String {
        let base = format!("https://explorer.solana.com/{}/{}", kind, id);
        match self {
            Cluster::Devnet => format!("{}?cluster=devnet", base),
            Cluster::Testnet => format!("{}?cluster=testnet", base),
            Cluster::MainnetBeta => base,
            Cluster::Localnet => format!("{}?cluster=custom", base),
        }
    }
}

/// How final a transaction must be before a submit counts as confirmed
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Processed => "processed",
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }

    /// Parse a `confirmationStatus` value reported by the ledger
    pub fn from_status(status: &str) -> Option<Self> {
        match status {
            "processed" => Some(Commitment::Processed),
            "confirmed" => Some(Commitment::Confirmed),
            "finalized" => Some(Commitment::Finalized),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LedgerConfig {
    #[serde(default)]
    pub cluster: Cluster,
    /// Overrides the cluster's public endpoint
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default)]
    pub commitment: Commitment,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_confirm_timeout_ms")]
    pub confirm_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_confirm_timeout_ms() -> u64 {
    60_000
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            cluster: Cluster::default(),
            rpc_url: None,
            commitment: Commitment::default(),
            request_timeout_ms: default_request_timeout_ms(),
            confirm_timeout_ms: default_confirm_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl LedgerConfig {
    pub fn endpoint(&self) -> &str {
        self.rpc_url.as_deref().unwrap_or_else(|| self.cluster.rpc_url())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_millis(self.confirm_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Used by commands run without `--phrase`
    #[serde(default)]
    pub default_phrase: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_phrase: None,
            log_level: default_log_level(),
        }
    }
}

impl WalletConfig {
    /// Read `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Config(format!("reading {}: {}", path.display(), e)))?;
        toml::from_str(&text)
            .map_err(|e| WalletError::Config(format!("parsing {}: {}", path.display(), e)))
    }

    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        let text = toml::to_string_pretty(self).map_err(|e| WalletError::Config(e.to_string()))?;
        std::fs::write(path, text)
            .map_err(|e| WalletError::Config(format!("writing {}: {}", path.display(), e)))
    }
}
