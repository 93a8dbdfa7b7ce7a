//! Scriptable in-memory ledger for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::ledger::{LedgerClient, LedgerError};
use crate::crypto::Address;
use crate::transaction::{Blockhash, SignedTransaction};

#[derive(Default)]
pub struct MockLedger {
    balances: Mutex<HashMap<Address, Decimal>>,
    balance_offline: AtomicBool,
    balance_delay: Mutex<Option<Duration>>,
    blockhash_delay: Mutex<Option<Duration>>,
    submit_error: Mutex<Option<LedgerError>>,
    submitted: Mutex<Vec<SignedTransaction>>,
    balance_calls: AtomicUsize,
    blockhash_calls: AtomicUsize,
    submit_calls: AtomicUsize,
}

impl MockLedger {
    pub const BLOCKHASH: Blockhash = Blockhash::new([7u8; 32]);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, address: Address, sol: Decimal) {
        self.balances.lock().unwrap().insert(address, sol);
    }

    /// Make every balance read fail with a network error
    pub fn set_offline(&self, offline: bool) {
        self.balance_offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_balance_delay(&self, delay: Duration) {
        *self.balance_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_blockhash_delay(&self, delay: Duration) {
        *self.blockhash_delay.lock().unwrap() = Some(delay);
    }

    /// Next submissions fail with this error until cleared
    pub fn fail_submissions(&self, error: LedgerError) {
        *self.submit_error.lock().unwrap() = Some(error);
    }

    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    /// Every ledger interaction of any kind
    pub fn calls(&self) -> usize {
        self.balance_calls()
            + self.blockhash_calls.load(Ordering::SeqCst)
            + self.submit_calls()
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn get_balance(&self, address: &Address) -> Result<Decimal, LedgerError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.balance_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.balance_offline.load(Ordering::SeqCst) {
            return Err(LedgerError::Network("ledger unreachable".to_string()));
        }
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(address)
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn latest_blockhash(&self) -> Result<Blockhash, LedgerError> {
        self.blockhash_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.blockhash_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(Self::BLOCKHASH)
    }

    async fn submit_transfer(&self, transaction: &SignedTransaction) -> Result<String, LedgerError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.submit_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.submitted.lock().unwrap().push(transaction.clone());
        Ok(transaction.id())
    }
}
