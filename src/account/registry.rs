//! Ordered registry of derived accounts with a single active pointer

use super::balance::Balance;
use super::derivation::HARDENED;
use super::recovery::Seed;
use super::types::Account;
use crate::crypto::Address;
use crate::error::WalletError;

/// Accounts in creation order. `accounts[k].index == k` always holds, and
/// `active` points at a valid position whenever the registry is non-empty.
#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
    active: Option<usize>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derivation index the next account will get
    pub fn next_index(&self) -> usize {
        self.accounts.len()
    }

    /// Derive (but do not insert) the next account
    pub fn derive_next(&self, seed: &Seed) -> Result<Account, WalletError> {
        let index = self.next_index();
        if index >= HARDENED as usize {
            return Err(WalletError::OutOfRange {
                index,
                len: self.accounts.len(),
            });
        }
        Ok(Account::derive(seed, index as u32))
    }

    /// Append an account produced by `derive_next` and make it active
    pub fn push(&mut self, account: Account) -> &Account {
        debug_assert_eq!(account.index as usize, self.accounts.len());
        self.accounts.push(account);
        let position = self.accounts.len() - 1;
        self.active = Some(position);
        &self.accounts[position]
    }

    /// Make `position` active. An invalid position leaves the pointer alone.
    pub fn select(&mut self, position: usize) -> Result<&Account, WalletError> {
        if position >= self.accounts.len() {
            return Err(WalletError::OutOfRange {
                index: position,
                len: self.accounts.len(),
            });
        }
        self.active = Some(position);
        Ok(&self.accounts[position])
    }

    pub fn get(&self, position: usize) -> Result<&Account, WalletError> {
        self.accounts.get(position).ok_or(WalletError::OutOfRange {
            index: position,
            len: self.accounts.len(),
        })
    }

    pub fn active(&self) -> Option<&Account> {
        self.active.map(|position| &self.accounts[position])
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Store a fetched balance, but only if `position` still holds the
    /// account the fetch was issued for.
    pub fn set_balance(&mut self, position: usize, address: &Address, balance: Balance) -> bool {
        match self.accounts.get_mut(position) {
            Some(account) if account.address == *address => {
                account.balance = balance;
                true
            }
            _ => false,
        }
    }
}
