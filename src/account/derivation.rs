//! SLIP-0010 ed25519 key derivation along `m/44'/501'/{account}'/0'`
//!
//! ed25519 has no public-parent child derivation, so every segment is
//! hardened. The same (seed, account) pair yields the same key in every
//! compliant wallet.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::recovery::Seed;

/// BIP44 purpose
pub const PURPOSE: u32 = 44;

/// Registered coin type for this ledger
pub const COIN_TYPE: u32 = 501;

/// Final fixed sub-index under each account
pub const CHANGE: u32 = 0;

/// Hardened derivation flag
pub const HARDENED: u32 = 0x8000_0000;

/// Path for one account index. All four segments are hardened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivationPath {
    account: u32,
}

impl DerivationPath {
    /// Panics if `account` already carries the hardened bit; registry indices
    /// never get that far.
    pub fn for_account(account: u32) -> Self {
        assert!(
            account < HARDENED,
            "account index {} exceeds the hardened range",
            account
        );
        Self { account }
    }

    pub fn segments(&self) -> [u32; 4] {
        [PURPOSE, COIN_TYPE, self.account, CHANGE].map(|segment| segment | HARDENED)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m/{}'/{}'/{}'/{}'", PURPOSE, COIN_TYPE, self.account, CHANGE)
    }
}

/// 32-byte ed25519 private key produced by derivation
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKeyMaterial([u8; 32]);

impl PrivateKeyMaterial {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for PrivateKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKeyMaterial(<redacted>)")
    }
}

/// Walk `segments` from the master key of `seed`. Every segment is
/// hardened whether or not the caller set the flag.
pub fn derive_path(seed: &[u8], segments: &[u32]) -> PrivateKeyMaterial {
    PrivateKeyMaterial(slip10_ed25519::derive_ed25519_private_key(seed, segments))
}

/// Private key for `account` under the fixed coin path
pub fn derive_account_key(seed: &Seed, account: u32) -> PrivateKeyMaterial {
    let path = DerivationPath::for_account(account);
    derive_path(seed.as_bytes(), &path.segments())
}
