//! Commands that talk to the ledger

use rust_decimal::Decimal;
use tracing::info;

use super::wallet::derive_account;
use crate::account::balance::{estimated_fee_sol, sol_to_lamports, Balance};
use crate::account::RecoveryPhrase;
use crate::client::{LedgerClient, RpcClient};
use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::wallet::{send_from_keypair, TransactionOutcome};

pub async fn handle_balance(config: &WalletConfig, phrase: &RecoveryPhrase, index: u32) -> Result<(), WalletError> {
    let account = derive_account(phrase, index)?;
    let client = RpcClient::from_config(&config.ledger)?;

    let sol = client.get_balance(&account.address).await?;
    println!("{} ({})", account.display_name, account.address);
    println!("Balance: {}", Balance::Known(sol));
    println!(
        "Explorer: {}",
        config.ledger.cluster.explorer_url("address", &account.address.to_string())
    );
    Ok(())
}

pub async fn handle_send(
    config: &WalletConfig,
    phrase: &RecoveryPhrase,
    index: u32,
    to: &str,
    amount: Decimal,
) -> Result<(), WalletError> {
    let account = derive_account(phrase, index)?;
    let client = RpcClient::from_config(&config.ledger)?;
    info!(rpc = client.url(), "Using ledger endpoint");

    println!("From: {} ({})", account.display_name, account.address);
    println!("To: {}", to);
    println!("Amount: {} SOL (estimated fee {} SOL)", amount, estimated_fee_sol());

    match send_from_keypair(&client, account.keypair(), to, amount).await {
        TransactionOutcome::Success { signature } => {
            println!("Confirmed: {}", signature);
            println!("Explorer: {}", config.ledger.cluster.explorer_url("tx", &signature));
            Ok(())
        }
        TransactionOutcome::Failure(err) => Err(err),
    }
}

pub async fn handle_airdrop(
    config: &WalletConfig,
    phrase: &RecoveryPhrase,
    index: u32,
    amount: Decimal,
) -> Result<(), WalletError> {
    let lamports = sol_to_lamports(amount)?;
    let account = derive_account(phrase, index)?;
    let client = RpcClient::from_config(&config.ledger)?;

    println!("Requesting {} SOL for {}...", amount, account.address);
    let signature = client.request_airdrop(&account.address, lamports).await?;
    println!("Airdrop confirmed: {}", signature);

    let sol = client.get_balance(&account.address).await?;
    println!("Balance: {}", Balance::Known(sol));
    Ok(())
}
