//! The remote-ledger boundary the wallet depends on

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::crypto::Address;
use crate::error::WalletError;
use crate::transaction::{Blockhash, SignedTransaction};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("{0}")]
    Submission(String),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<LedgerError> for WalletError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Submission(cause) => WalletError::Submission(cause),
            LedgerError::Network(cause) => WalletError::Network(cause),
            other => WalletError::Network(other.to_string()),
        }
    }
}

/// One attempt per call; retry policy belongs to the caller.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Balance in major units
    async fn get_balance(&self, address: &Address) -> Result<Decimal, LedgerError>;

    /// Blockhash to anchor a new message to
    async fn latest_blockhash(&self) -> Result<Blockhash, LedgerError>;

    /// Submit and wait for confirmation. Returns the transaction id. Every
    /// failure comes back as `LedgerError::Submission` with a readable cause.
    async fn submit_transfer(&self, transaction: &SignedTransaction) -> Result<String, LedgerError>;
}
