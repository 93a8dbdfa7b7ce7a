// Client module
pub mod ledger;
pub mod rpc_client;

#[cfg(test)]
pub mod mock;

pub use ledger::{LedgerClient, LedgerError};
pub use rpc_client::RpcClient;
