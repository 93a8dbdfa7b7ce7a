//! Derived account record

use std::fmt;

use super::balance::Balance;
use super::derivation::{derive_account_key, DerivationPath};
use super::recovery::Seed;
use crate::crypto::{Address, KeyPair};

/// One derived account. Only the registry creates these, always from
/// (seed, index).
#[derive(Clone)]
pub struct Account {
    pub index: u32,
    pub address: Address,
    pub display_name: String,
    pub balance: Balance,
    keypair: KeyPair,
}

impl Account {
    pub(crate) fn derive(seed: &Seed, index: u32) -> Self {
        let keypair = KeyPair::from_private_key(&derive_account_key(seed, index));
        Account {
            index,
            address: keypair.address(),
            display_name: format!("Account {}", index + 1),
            balance: Balance::Unknown,
            keypair,
        }
    }

    pub fn path(&self) -> DerivationPath {
        DerivationPath::for_account(self.index)
    }

    pub(crate) fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    /// Base58 private key, exactly the bytes used for signing
    pub fn export_secret(&self) -> String {
        self.keypair.export_secret()
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("index", &self.index)
            .field("address", &self.address)
            .field("display_name", &self.display_name)
            .field("balance", &self.balance)
            .finish_non_exhaustive()
    }
}
