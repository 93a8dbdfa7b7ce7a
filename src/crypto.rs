use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, KEYPAIR_LENGTH};
use zeroize::Zeroizing;

use crate::account::derivation::PrivateKeyMaterial;
use crate::error::WalletError;

/// Length of a public address in bytes
pub const ADDRESS_LENGTH: usize = 32;

/// `secret || public`, the layout signers consume and the only form exported
pub type SecretKeyBytes = Zeroizing<[u8; KEYPAIR_LENGTH]>;

/// Raw ed25519 public key, shown as base58
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

/// Structural check only: base58 that decodes to exactly 32 bytes
impl FromStr for Address {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| WalletError::InvalidRecipient(format!("'{}' is not base58: {}", s, e)))?;
        let bytes: [u8; ADDRESS_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            WalletError::InvalidRecipient(format!(
                "'{}' decodes to {} bytes, expected {}",
                s,
                b.len(),
                ADDRESS_LENGTH
            ))
        })?;
        Ok(Address(bytes))
    }
}

#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Keypair for a derived private key
    pub fn from_private_key(key: &PrivateKeyMaterial) -> Self {
        KeyPair {
            signing_key: SigningKey::from_bytes(key.as_bytes()),
        }
    }

    /// Restore from exported `secret || public` bytes. Fails if the public
    /// half does not belong to the secret half.
    pub fn from_secret_key_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        let bytes: &[u8; KEYPAIR_LENGTH] = bytes
            .try_into()
            .map_err(|_| WalletError::InvalidSecretKey)?;
        let signing_key =
            SigningKey::from_keypair_bytes(bytes).map_err(|_| WalletError::InvalidSecretKey)?;
        Ok(KeyPair { signing_key })
    }

    /// Restore from the base58 export string
    pub fn from_base58_secret(encoded: &str) -> Result<Self, WalletError> {
        let bytes = Zeroizing::new(
            bs58::decode(encoded.trim())
                .into_vec()
                .map_err(|_| WalletError::InvalidSecretKey)?,
        );
        Self::from_secret_key_bytes(&bytes)
    }

    /// Fresh random keypair, not reproducible from any phrase
    #[cfg(test)]
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        KeyPair {
            signing_key: SigningKey::generate(&mut csprng),
        }
    }

    pub fn address(&self) -> Address {
        Address(self.signing_key.verifying_key().to_bytes())
    }

    pub fn secret_key_bytes(&self) -> SecretKeyBytes {
        Zeroizing::new(self.signing_key.to_keypair_bytes())
    }

    /// Base58 of the 64 signing-ready bytes
    pub fn export_secret(&self) -> String {
        let bytes = self.secret_key_bytes();
        bs58::encode(&bytes[..]).into_string()
    }

    /// Sign a message with the private key
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Verify a signature against a message using this keypair's public key
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.signing_key.verify(message, signature).is_ok()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Verify a signature against a message with a public address
pub fn verify_with_address(address: &Address, message: &[u8], signature: &Signature) -> bool {
    match VerifyingKey::from_bytes(address.as_bytes()) {
        Ok(key) => key.verify(message, signature).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::derivation::derive_account_key;
    use crate::account::recovery::RecoveryPhrase;

    const REFERENCE_PHRASE: &str =
        "champion capital butter volume protect cave mail behind because divert have chronic";

    fn reference_keypair(index: u32) -> KeyPair {
        let seed = RecoveryPhrase::parse(REFERENCE_PHRASE).unwrap().to_seed();
        KeyPair::from_private_key(&derive_account_key(&seed, index))
    }

    #[test]
    fn test_reference_addresses() {
        assert_eq!(
            reference_keypair(0).address().to_string(),
            "3mtQ3CfmzX3pZMVKpuSPnuA35ViFkBxTTsKVy6S4QMvb"
        );
        assert_eq!(
            reference_keypair(1).address().to_string(),
            "91aFzsj4RC8X7xg7RtAHKWUbbWQLLCYz19atRrW8sqYJ"
        );
    }

    #[test]
    fn test_reference_secret_export() {
        assert_eq!(
            reference_keypair(0).export_secret(),
            "4Tv1b6RbwyHqRgs2YH4n6ZW3mb4WPEAMEYziBBBKpcP5JnKXeaDeYignRJWQYF6CdQZtK6YL7gyUNxTyFdgRHcwM"
        );
    }

    #[test]
    fn test_export_round_trips_to_same_signer() {
        let keypair = reference_keypair(2);
        let exported = keypair.export_secret();
        let restored = KeyPair::from_base58_secret(&exported).unwrap();

        assert_eq!(*keypair.secret_key_bytes(), *restored.secret_key_bytes());
        // ed25519 signatures are deterministic
        let message = b"transfer";
        assert_eq!(keypair.sign(message), restored.sign(message));
    }

    #[test]
    fn test_secret_layout_is_secret_then_public() {
        let keypair = reference_keypair(0);
        let bytes = keypair.secret_key_bytes();
        assert_eq!(&bytes[32..], keypair.address().as_bytes());
        assert_eq!(
            hex::encode(&bytes[..32]),
            "ad42b554c327710f1249a29efa4a219cd0f1be6a9a3a6aed8225945f60afc4e8"
        );
    }

    #[test]
    fn test_mismatched_secret_rejected() {
        let mut bytes = *reference_keypair(0).secret_key_bytes();
        bytes[32..].copy_from_slice(reference_keypair(1).address().as_bytes());
        assert_eq!(
            KeyPair::from_secret_key_bytes(&bytes).unwrap_err(),
            WalletError::InvalidSecretKey
        );
        assert!(KeyPair::from_secret_key_bytes(&bytes[..40]).is_err());
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = KeyPair::generate();
        let message = b"hello";
        let signature = keypair.sign(message);
        assert!(keypair.verify(message, &signature));
        assert!(verify_with_address(&keypair.address(), message, &signature));
        assert!(!verify_with_address(&keypair.address(), b"other", &signature));
        assert!(!verify_with_address(
            &reference_keypair(0).address(),
            message,
            &signature
        ));
    }

    #[test]
    fn test_address_parsing() {
        let address: Address = "3mtQ3CfmzX3pZMVKpuSPnuA35ViFkBxTTsKVy6S4QMvb".parse().unwrap();
        assert_eq!(address, reference_keypair(0).address());

        let system: Address = "11111111111111111111111111111111".parse().unwrap();
        assert_eq!(system.as_bytes(), &[0u8; 32]);

        for bad in ["", "not-an-address", "0OIl", "3mtQ3CfmzX3pZMVK"] {
            assert!(matches!(
                bad.parse::<Address>(),
                Err(WalletError::InvalidRecipient(_))
            ));
        }
    }
}
