// JSON-RPC client for the ledger's public endpoints
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::ledger::{LedgerClient, LedgerError};
use crate::account::balance::lamports_to_sol;
use crate::config::{Commitment, LedgerConfig};
use crate::crypto::Address;
use crate::encoding::WireEncode;
use crate::error::WalletError;
use crate::transaction::{Blockhash, SignedTransaction};

/// `{ "context": ..., "value": T }` wrapper used by most read methods
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestBlockhash {
    blockhash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    confirmation_status: Option<String>,
}

/// Where a submitted transaction stands after one status poll
#[derive(Debug, Clone, PartialEq, Eq)]
enum Progress {
    Pending,
    Reached,
    Failed(String),
}

fn progress_of(status: Option<&SignatureStatus>, commitment: Commitment) -> Progress {
    let Some(status) = status else {
        return Progress::Pending;
    };
    if let Some(err) = status.err.as_ref().filter(|e| !e.is_null()) {
        return Progress::Failed(format!("transaction failed: {}", err));
    }
    match status
        .confirmation_status
        .as_deref()
        .and_then(Commitment::from_status)
    {
        Some(level) if level >= commitment => Progress::Reached,
        _ => Progress::Pending,
    }
}

pub struct RpcClient {
    url: String,
    client: Client,
    request_id: AtomicU64,
    commitment: Commitment,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl RpcClient {
    pub fn from_config(config: &LedgerConfig) -> Result<Self, WalletError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| WalletError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self {
            url: config.endpoint().to_string(),
            client,
            request_id: AtomicU64::new(1),
            commitment: config.commitment,
            confirm_timeout: config.confirm_timeout(),
            poll_interval: config.poll_interval(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    // Helper for sending requests
    async fn send_request(&self, method: &str, params: Value) -> Result<Value, LedgerError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let request = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });
        debug!(method, id, "RPC request");

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Network(format!("RPC request failed: {}", e)))?;

        let json: Value = response
            .json()
            .await
            .map_err(|e| LedgerError::Decode(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = json.get("error") {
            return Err(LedgerError::Rpc {
                code: error["code"].as_i64().unwrap_or(0),
                message: error["message"]
                    .as_str()
                    .unwrap_or("Unknown error")
                    .to_string(),
            });
        }

        Ok(json["result"].clone())
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        let result = self.send_request(method, params).await?;
        serde_json::from_value(result)
            .map_err(|e| LedgerError::Decode(format!("{} result: {}", method, e)))
    }

    pub async fn get_balance_lamports(&self, address: &Address) -> Result<u64, LedgerError> {
        let balance: WithContext<u64> = self
            .call(
                "getBalance",
                json!([address.to_string(), { "commitment": self.commitment.as_str() }]),
            )
            .await?;
        Ok(balance.value)
    }

    /// Send raw transaction bytes and return the signature the node reports
    pub async fn send_transaction(&self, transaction: &SignedTransaction) -> Result<String, LedgerError> {
        let encoded = STANDARD.encode(transaction.to_wire_bytes());
        self.call(
            "sendTransaction",
            json!([encoded, {
                "encoding": "base64",
                "preflightCommitment": self.commitment.as_str(),
            }]),
        )
        .await
    }

    /// Poll signature status until the configured commitment is reached,
    /// the transaction fails, or the confirmation window closes.
    pub async fn confirm_signature(&self, signature: &str) -> Result<(), LedgerError> {
        let deadline = tokio::time::Instant::now() + self.confirm_timeout;
        loop {
            let statuses: WithContext<Vec<Option<SignatureStatus>>> = self
                .call("getSignatureStatuses", json!([[signature]]))
                .await?;

            match progress_of(statuses.value.first().and_then(Option::as_ref), self.commitment) {
                Progress::Reached => return Ok(()),
                Progress::Failed(cause) => return Err(LedgerError::Submission(cause)),
                Progress::Pending => {}
            }

            if tokio::time::Instant::now() + self.poll_interval > deadline {
                return Err(LedgerError::Submission(format!(
                    "transaction {} was not confirmed within {}ms",
                    signature,
                    self.confirm_timeout.as_millis()
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Devnet/testnet faucet. Waits for the airdrop to confirm.
    pub async fn request_airdrop(&self, address: &Address, lamports: u64) -> Result<String, LedgerError> {
        let signature: String = self
            .call("requestAirdrop", json!([address.to_string(), lamports]))
            .await
            .map_err(submission_cause)?;
        self.confirm_signature(&signature).await?;
        Ok(signature)
    }
}

/// Anything that goes wrong on the submit path is a submission failure,
/// keeping the node's own wording where there is one.
fn submission_cause(err: LedgerError) -> LedgerError {
    match err {
        LedgerError::Rpc { message, .. } => LedgerError::Submission(message),
        LedgerError::Network(cause) => LedgerError::Submission(format!("network failure: {}", cause)),
        LedgerError::Decode(cause) => LedgerError::Submission(cause),
        submission @ LedgerError::Submission(_) => submission,
    }
}

#[async_trait]
impl LedgerClient for RpcClient {
    async fn get_balance(&self, address: &Address) -> Result<Decimal, LedgerError> {
        let lamports = self.get_balance_lamports(address).await?;
        Ok(lamports_to_sol(lamports))
    }

    async fn latest_blockhash(&self) -> Result<Blockhash, LedgerError> {
        let latest: WithContext<LatestBlockhash> = self
            .call(
                "getLatestBlockhash",
                json!([{ "commitment": self.commitment.as_str() }]),
            )
            .await?;
        latest.value.blockhash.parse().map_err(LedgerError::Decode)
    }

    async fn submit_transfer(&self, transaction: &SignedTransaction) -> Result<String, LedgerError> {
        let signature = self
            .send_transaction(transaction)
            .await
            .map_err(submission_cause)?;
        if signature != transaction.id() {
            warn!(reported = %signature, expected = %transaction.id(), "node reported a different signature");
        }
        self.confirm_signature(&signature)
            .await
            .map_err(submission_cause)?;
        Ok(signature)
    }
}
