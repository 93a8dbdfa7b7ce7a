//! Offline commands: nothing here talks to the ledger

use std::path::Path;

use zeroize::Zeroizing;

use crate::account::derivation::HARDENED;
use crate::account::{Account, RecoveryPhrase};
use crate::config::WalletConfig;
use crate::error::WalletError;

/// Most accounts `derive` will list in one go
pub const MAX_DERIVE_COUNT: u32 = 100;

/// The single account at `index`, derived locally
pub fn derive_account(phrase: &RecoveryPhrase, index: u32) -> Result<Account, WalletError> {
    if index >= HARDENED {
        return Err(WalletError::OutOfRange {
            index: index as usize,
            len: HARDENED as usize,
        });
    }
    Ok(Account::derive(&phrase.to_seed(), index))
}

pub fn handle_new() -> Result<(), WalletError> {
    let phrase = RecoveryPhrase::generate();
    let account = derive_account(&phrase, 0)?;
    println!("Recovery phrase:");
    for (position, word) in phrase.words().enumerate() {
        println!("  {:>2}. {}", position + 1, word);
    }
    println!("{} ({}): {}", account.display_name, account.path(), account.address);
    println!("KEEP THIS SAFE! Anyone with these words controls the funds.");
    Ok(())
}

pub fn handle_derive(phrase: &RecoveryPhrase, count: u32) -> Result<(), WalletError> {
    if count > MAX_DERIVE_COUNT {
        return Err(WalletError::OutOfRange {
            index: count as usize,
            len: MAX_DERIVE_COUNT as usize,
        });
    }
    if !phrase.is_standard() {
        println!("Warning: phrase is not a standard BIP39 mnemonic; deriving anyway.");
    }
    let seed = phrase.to_seed();
    for index in 0..count {
        let account = Account::derive(&seed, index);
        println!("{}\t{}\t{}", account.display_name, account.path(), account.address);
    }
    Ok(())
}

pub fn handle_export(phrase: &RecoveryPhrase, index: u32) -> Result<(), WalletError> {
    let account = derive_account(phrase, index)?;
    println!("Address: {}", account.address);
    let secret = Zeroizing::new(account.export_secret());
    println!("Private key: {}", *secret);
    Ok(())
}

pub fn handle_init_config(path: &Path, config: &WalletConfig) -> Result<(), WalletError> {
    if path.exists() {
        println!("{} already exists, leaving it untouched.", path.display());
        return Ok(());
    }
    config.save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}
