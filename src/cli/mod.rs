pub mod tx;
pub mod wallet;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::account::RecoveryPhrase;
use crate::config::WalletConfig;
use crate::error::WalletError;

#[derive(Parser)]
#[command(name = "rust_solwallet")]
#[command(about = "HD wallet for the Solana ledger", long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "solwallet.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a fresh recovery phrase
    New,
    /// List derived addresses (offline)
    Derive {
        #[arg(long)]
        phrase: Option<String>,
        /// Number of accounts, at most 100
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Show an account's balance
    Balance {
        #[arg(long)]
        phrase: Option<String>,
        #[arg(long, default_value_t = 0)]
        index: u32,
    },
    /// Transfer SOL to another address
    Send {
        #[arg(long)]
        phrase: Option<String>,
        #[arg(long, default_value_t = 0)]
        index: u32,
        #[arg(long)]
        to: String,
        /// Amount in SOL
        #[arg(long)]
        amount: Decimal,
    },
    /// Print an account's private key (base58, 64 bytes)
    Export {
        #[arg(long)]
        phrase: Option<String>,
        #[arg(long, default_value_t = 0)]
        index: u32,
    },
    /// Request SOL from the cluster faucet (devnet/testnet)
    Airdrop {
        #[arg(long)]
        phrase: Option<String>,
        #[arg(long, default_value_t = 0)]
        index: u32,
        #[arg(long, default_value = "1")]
        amount: Decimal,
    },
    /// Write the default configuration file
    InitConfig,
}

pub async fn run(command: Commands, config_path: &Path, config: WalletConfig) -> Result<(), WalletError> {
    match command {
        Commands::New => wallet::handle_new(),
        Commands::Derive { phrase, count } => {
            wallet::handle_derive(&resolve_phrase(phrase, &config)?, count)
        }
        Commands::Export { phrase, index } => {
            wallet::handle_export(&resolve_phrase(phrase, &config)?, index)
        }
        Commands::InitConfig => wallet::handle_init_config(config_path, &config),
        Commands::Balance { phrase, index } => {
            tx::handle_balance(&config, &resolve_phrase(phrase, &config)?, index).await
        }
        Commands::Send {
            phrase,
            index,
            to,
            amount,
        } => tx::handle_send(&config, &resolve_phrase(phrase, &config)?, index, &to, amount).await,
        Commands::Airdrop {
            phrase,
            index,
            amount,
        } => tx::handle_airdrop(&config, &resolve_phrase(phrase, &config)?, index, amount).await,
    }
}

/// `--phrase` wins, then `wallet.default_phrase` from the config file
fn resolve_phrase(arg: Option<String>, config: &WalletConfig) -> Result<RecoveryPhrase, WalletError> {
    match arg.or_else(|| config.wallet.default_phrase.clone()) {
        Some(phrase) => RecoveryPhrase::parse(&phrase),
        None => Err(WalletError::Config(
            "no recovery phrase: pass --phrase or set wallet.default_phrase".to_string(),
        )),
    }
}
