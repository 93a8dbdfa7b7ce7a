use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Network error: {0}")]
    Network(String),
    /// Carries the ledger's cause verbatim so it can be shown as-is.
    #[error("{0}")]
    Submission(String),
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Recovery phrase needs 12 non-empty words")]
    IncompleteImport,
    #[error("Account index {index} out of range (have {len})")]
    OutOfRange { index: usize, len: usize },
    #[error("Invalid secret key bytes")]
    InvalidSecretKey,
    #[error("Configuration error: {0}")]
    Config(String),
}
