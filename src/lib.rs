pub mod account;
pub mod cli;
pub mod client;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod error;
pub mod transaction;
pub mod wallet;

pub use error::WalletError;
pub use wallet::{TransactionOutcome, WalletSession};
