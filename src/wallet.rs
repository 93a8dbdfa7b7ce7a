//! Wallet session: one recovery phrase, the accounts derived from it, and
//! the transfer path from an account to the ledger.
//!
//! Lock order is always per-account lock first, then session state.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use tokio::sync::{Mutex as AccountLock, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::account::balance::{sol_to_lamports, Balance};
use crate::account::{Account, AccountRegistry, RecoveryPhrase, Seed};
use crate::client::LedgerClient;
use crate::crypto::{Address, KeyPair};
use crate::error::WalletError;
use crate::transaction::{build_transfer, SignedTransaction};

struct SessionState {
    phrase: RecoveryPhrase,
    seed: Seed,
    registry: AccountRegistry,
}

impl SessionState {
    fn new(phrase: RecoveryPhrase) -> Self {
        let seed = phrase.to_seed();
        SessionState {
            phrase,
            seed,
            registry: AccountRegistry::new(),
        }
    }
}

struct SessionInner {
    ledger: Arc<dyn LedgerClient>,
    state: RwLock<SessionState>,
    account_locks: Mutex<HashMap<usize, Arc<AccountLock<()>>>>,
}

/// Result of `build_and_send`. Failures never escape as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    Success { signature: String },
    Failure(WalletError),
}

impl TransactionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransactionOutcome::Success { .. })
    }

    pub fn signature(&self) -> Option<&str> {
        match self {
            TransactionOutcome::Success { signature } => Some(signature),
            TransactionOutcome::Failure(_) => None,
        }
    }

    /// Short human-readable failure reason
    pub fn reason(&self) -> Option<String> {
        match self {
            TransactionOutcome::Success { .. } => None,
            TransactionOutcome::Failure(err) => Some(err.to_string()),
        }
    }
}

impl fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionOutcome::Success { signature } => write!(f, "Success({})", signature),
            TransactionOutcome::Failure(err) => write!(f, "Failure({})", err),
        }
    }
}

/// Handle to the balance refresh scheduled by `select_account`
pub struct BalanceRefresh {
    handle: JoinHandle<Result<Balance, WalletError>>,
}

impl BalanceRefresh {
    pub async fn wait(self) -> Result<Balance, WalletError> {
        self.handle
            .await
            .unwrap_or_else(|e| Err(WalletError::Network(format!("balance refresh aborted: {}", e))))
    }
}

/// Recipient and amount in lamports, checked before any ledger call
fn parse_transfer(recipient: &str, amount: Decimal) -> Result<(Address, u64), WalletError> {
    let to: Address = recipient.parse()?;
    let lamports = sol_to_lamports(amount)?;
    Ok((to, lamports))
}

async fn sign_transfer(
    ledger: &dyn LedgerClient,
    keypair: &KeyPair,
    to: &Address,
    lamports: u64,
) -> Result<SignedTransaction, WalletError> {
    let blockhash = ledger.latest_blockhash().await?;
    build_transfer(keypair, to, lamports, blockhash)
}

async fn submit(ledger: &dyn LedgerClient, transaction: &SignedTransaction) -> Result<String, WalletError> {
    let message = transaction.message();
    info!(
        from = %message.account_keys[0],
        signature = %transaction.id(),
        "Submitting transfer"
    );
    Ok(ledger.submit_transfer(transaction).await?)
}

async fn transfer_from(
    ledger: &dyn LedgerClient,
    keypair: &KeyPair,
    recipient: &str,
    amount: Decimal,
) -> Result<String, WalletError> {
    let (to, lamports) = parse_transfer(recipient, amount)?;
    let transaction = sign_transfer(ledger, keypair, &to, lamports).await?;
    submit(ledger, &transaction).await
}

/// Transfer from a keypair that lives outside any session, with the same
/// checks and outcome as `WalletSession::build_and_send`.
pub async fn send_from_keypair(
    ledger: &dyn LedgerClient,
    keypair: &KeyPair,
    recipient: &str,
    amount: Decimal,
) -> TransactionOutcome {
    match transfer_from(ledger, keypair, recipient, amount).await {
        Ok(signature) => TransactionOutcome::Success { signature },
        Err(e) => {
            warn!(from = %keypair.address(), "Transfer failed: {}", e);
            TransactionOutcome::Failure(e)
        }
    }
}

/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct WalletSession {
    inner: Arc<SessionInner>,
}

impl WalletSession {
    pub fn new(ledger: Arc<dyn LedgerClient>, phrase: RecoveryPhrase) -> Self {
        WalletSession {
            inner: Arc::new(SessionInner {
                ledger,
                state: RwLock::new(SessionState::new(phrase)),
                account_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    fn account_lock(&self, position: usize) -> Arc<AccountLock<()>> {
        let mut locks = self
            .inner
            .account_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(position).or_default().clone()
    }

    /// Positions mean different accounts after a phrase change
    fn clear_account_locks(&self) {
        self.inner
            .account_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Derive the next account, make it active, and read its balance once.
    /// A failed read leaves the balance unknown.
    pub async fn create_account(&self) -> Result<Account, WalletError> {
        let account = {
            let mut state = self.inner.state.write().await;
            let account = state.registry.derive_next(&state.seed)?;
            state.registry.push(account).clone()
        };
        info!(index = account.index, address = %account.address, "Account created");
        Ok(self.load_initial_balance(account).await)
    }

    async fn load_initial_balance(&self, mut account: Account) -> Account {
        let position = account.index as usize;
        let lock = self.account_lock(position);
        let _guard = lock.lock().await;

        match self.inner.ledger.get_balance(&account.address).await {
            Ok(sol) => {
                account.balance = Balance::Known(sol);
                self.inner
                    .state
                    .write()
                    .await
                    .registry
                    .set_balance(position, &account.address, account.balance);
            }
            Err(e) => {
                warn!(index = account.index, address = %account.address, "Balance fetch failed: {}", e);
            }
        }
        account
    }

    /// Make `position` active and schedule one balance refresh for it.
    /// The refresh runs in the background; await the handle to observe it.
    pub async fn select_account(&self, position: usize) -> Result<BalanceRefresh, WalletError> {
        let address = {
            let mut state = self.inner.state.write().await;
            state.registry.select(position)?.address
        };
        debug!(position, %address, "Account selected");

        let session = self.clone();
        let handle = tokio::spawn(async move { session.refresh_balance(position).await });
        Ok(BalanceRefresh { handle })
    }

    /// Fetch and store the balance of `position`. On failure the previous
    /// balance is kept. A result for an account that was replaced by an
    /// import or reset in the meantime is dropped.
    pub async fn refresh_balance(&self, position: usize) -> Result<Balance, WalletError> {
        let lock = self.account_lock(position);
        let _guard = lock.lock().await;

        let address = self.inner.state.read().await.registry.get(position)?.address;
        let sol = self
            .inner
            .ledger
            .get_balance(&address)
            .await
            .map_err(|e| {
                warn!(position, %address, "Balance fetch failed: {}", e);
                WalletError::from(e)
            })?;

        let balance = Balance::Known(sol);
        let applied = self
            .inner
            .state
            .write()
            .await
            .registry
            .set_balance(position, &address, balance);
        if !applied {
            debug!(position, %address, "Discarding balance for a replaced account");
        }
        Ok(balance)
    }

    /// Replace the phrase with 12 user-supplied words. Prior accounts are
    /// discarded and account 0 of the new phrase becomes active. Invalid
    /// input changes nothing.
    pub async fn import_from_words<S: AsRef<str>>(&self, words: &[S]) -> Result<Account, WalletError> {
        let phrase = RecoveryPhrase::from_words(words)?;
        let account = {
            let mut state = self.inner.state.write().await;
            let discarded = state.registry.len();
            *state = SessionState::new(phrase);
            self.clear_account_locks();
            let account = state.registry.derive_next(&state.seed)?;
            info!(discarded, "Recovery phrase imported");
            state.registry.push(account).clone()
        };
        info!(index = account.index, address = %account.address, "Account created");
        Ok(self.load_initial_balance(account).await)
    }

    /// Back to a clean session on `phrase`. No accounts, nothing active,
    /// no ledger calls.
    pub async fn reset(&self, phrase: RecoveryPhrase) {
        let mut state = self.inner.state.write().await;
        *state = SessionState::new(phrase);
        self.clear_account_locks();
        info!("Session reset");
    }

    /// Transfer `amount` SOL from the account at `position` to `recipient`.
    /// Recipient and amount are checked before anything touches the ledger.
    pub async fn build_and_send(&self, position: usize, recipient: &str, amount: Decimal) -> TransactionOutcome {
        match self.send(position, recipient, amount).await {
            Ok(signature) => {
                info!(position, %signature, "Transfer confirmed");
                TransactionOutcome::Success { signature }
            }
            Err(e) => {
                warn!(position, "Transfer failed: {}", e);
                TransactionOutcome::Failure(e)
            }
        }
    }

    /// `build_and_send` from whichever account is active
    pub async fn build_and_send_active(&self, recipient: &str, amount: Decimal) -> TransactionOutcome {
        match self.active_index().await {
            Some(position) => self.build_and_send(position, recipient, amount).await,
            None => TransactionOutcome::Failure(WalletError::OutOfRange { index: 0, len: 0 }),
        }
    }

    async fn send(&self, position: usize, recipient: &str, amount: Decimal) -> Result<String, WalletError> {
        let (to, lamports) = parse_transfer(recipient, amount)?;

        let lock = self.account_lock(position);
        let _guard = lock.lock().await;

        // Import and reset wait until the transfer is signed
        let transaction = {
            let state = self.inner.state.read().await;
            let keypair = state.registry.get(position)?.keypair();
            sign_transfer(self.inner.ledger.as_ref(), keypair, &to, lamports).await?
        };
        submit(self.inner.ledger.as_ref(), &transaction).await
    }

    pub async fn active_account(&self) -> Option<Account> {
        self.inner.state.read().await.registry.active().cloned()
    }

    pub async fn active_index(&self) -> Option<usize> {
        self.inner.state.read().await.registry.active_index()
    }

    pub async fn account(&self, position: usize) -> Result<Account, WalletError> {
        self.inner.state.read().await.registry.get(position).cloned()
    }

    pub async fn accounts(&self) -> Vec<Account> {
        self.inner.state.read().await.registry.accounts().to_vec()
    }

    /// Base58 64-byte secret of the account at `position`
    pub async fn export_secret(&self, position: usize) -> Result<Zeroizing<String>, WalletError> {
        let state = self.inner.state.read().await;
        let account = state.registry.get(position)?;
        warn!(position, address = %account.address, "Exporting private key");
        Ok(Zeroizing::new(account.export_secret()))
    }

    pub async fn reveal_phrase(&self) -> Zeroizing<String> {
        Zeroizing::new(self.inner.state.read().await.phrase.reveal().to_string())
    }
}
