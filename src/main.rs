use std::process;

use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use rust_solwallet::cli::{self, Cli};
use rust_solwallet::config::WalletConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging level comes from the config, so load it before the subscriber
    // exists and report problems afterwards.
    let (config, config_error) = match WalletConfig::load(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (WalletConfig::default(), Some(e)),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.wallet.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = config_error {
        warn!("{}; falling back to defaults", e);
    }

    if let Err(e) = cli::run(cli.command, &cli.config, config).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
