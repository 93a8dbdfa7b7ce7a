//! Account derivation and bookkeeping
//!
//! - BIP39 recovery phrase and seed
//! - SLIP-0010 ed25519 derivation along the coin's hardened path
//! - Ordered registry of derived accounts with one active pointer
//! - Balance tracking in major units

pub mod balance;
pub mod derivation;
pub mod recovery;
pub mod registry;
pub mod types;

pub use balance::{Balance, LAMPORTS_PER_SOL};
pub use derivation::{derive_account_key, DerivationPath, PrivateKeyMaterial};
pub use recovery::{seed_from_phrase, RecoveryPhrase, Seed};
pub use registry::AccountRegistry;
pub use types::Account;
