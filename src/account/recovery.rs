//! Recovery phrases and the BIP39 seed they stretch into

use std::fmt;

use bip39::{Language, Mnemonic};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use sha2::Sha512;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::WalletError;

/// Number of words in a recovery phrase
pub const PHRASE_WORDS: usize = 12;

/// BIP39 seed length in bytes
pub const SEED_LENGTH: usize = 64;

const SEED_ROUNDS: u32 = 2048;
const SEED_SALT_PREFIX: &str = "mnemonic";

/// The root secret of a wallet session: twelve words joined by single spaces.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct RecoveryPhrase {
    phrase: String,
}

impl RecoveryPhrase {
    /// Build a phrase from exactly twelve words. Surrounding whitespace is
    /// trimmed; an empty slot fails the whole import.
    pub fn from_words<S: AsRef<str>>(words: &[S]) -> Result<Self, WalletError> {
        if words.len() != PHRASE_WORDS {
            return Err(WalletError::IncompleteImport);
        }

        let words: Vec<&str> = words.iter().map(|w| w.as_ref().trim()).collect();
        if words
            .iter()
            .any(|w| w.is_empty() || w.chars().any(char::is_whitespace))
        {
            return Err(WalletError::IncompleteImport);
        }

        Ok(Self {
            phrase: words.join(" "),
        })
    }

    /// Parse a whitespace separated phrase
    pub fn parse(phrase: &str) -> Result<Self, WalletError> {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        Self::from_words(&words)
    }

    /// Generate a new 12-word phrase from 128 bits of OS entropy
    pub fn generate() -> Self {
        use rand::rngs::OsRng;
        use rand::RngCore;

        let mut entropy = [0u8; 16];
        OsRng.fill_bytes(&mut entropy);
        let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
            .expect("16 bytes is a valid BIP39 entropy length");
        entropy.zeroize();

        Self {
            phrase: mnemonic.to_string(),
        }
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.phrase.split(' ')
    }

    /// The exact words, for an explicit reveal
    pub fn reveal(&self) -> &str {
        &self.phrase
    }

    /// Whether the words come from the English list with a valid checksum.
    /// Seeds are derived either way.
    pub fn is_standard(&self) -> bool {
        Mnemonic::parse_in_normalized(Language::English, &self.phrase).is_ok()
    }

    pub fn to_seed(&self) -> Seed {
        seed_from_phrase(self)
    }
}

impl fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RecoveryPhrase(<redacted>)")
    }
}

impl std::str::FromStr for RecoveryPhrase {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// 64-byte BIP39 seed
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Seed([u8; SEED_LENGTH]);

impl Seed {
    pub fn as_bytes(&self) -> &[u8; SEED_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Seed(<redacted>)")
    }
}

/// BIP39 mnemonic-to-seed with an empty passphrase:
/// PBKDF2-HMAC-SHA512(phrase, "mnemonic", 2048 rounds).
pub fn seed_from_phrase(phrase: &RecoveryPhrase) -> Seed {
    seed_with_passphrase(phrase, "")
}

fn seed_with_passphrase(phrase: &RecoveryPhrase, passphrase: &str) -> Seed {
    // Both inputs are NFKD-normalized so equivalent spellings share a seed
    let password: Zeroizing<String> = Zeroizing::new(phrase.phrase.nfkd().collect());
    let salt: String = SEED_SALT_PREFIX.chars().chain(passphrase.chars()).nfkd().collect();

    let mut seed = [0u8; SEED_LENGTH];
    pbkdf2::<Hmac<Sha512>>(password.as_bytes(), salt.as_bytes(), SEED_ROUNDS, &mut seed);
    Seed(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE_PHRASE: &str =
        "champion capital butter volume protect cave mail behind because divert have chronic";

    #[test]
    fn test_reference_seed() {
        let phrase = RecoveryPhrase::parse(REFERENCE_PHRASE).unwrap();
        let seed = seed_from_phrase(&phrase);
        assert_eq!(
            hex::encode(seed.as_bytes()),
            "3f1d5de81375feafa8c797e957762bddc58cd8c1ff071b0cd2536fce327c414f\
             a6f398dfae3c0dbafd71df397aa3f65ed189a3cc97b6f4bc7725af694938f958"
        );
    }

    #[test]
    fn test_seed_is_deterministic() {
        let phrase = RecoveryPhrase::parse(REFERENCE_PHRASE).unwrap();
        assert_eq!(phrase.to_seed().as_bytes(), phrase.to_seed().as_bytes());
    }

    #[test]
    fn test_generated_phrase_is_standard() {
        let phrase = RecoveryPhrase::generate();
        assert_eq!(phrase.words().count(), PHRASE_WORDS);
        assert!(phrase.is_standard());

        let reparsed = RecoveryPhrase::parse(phrase.reveal()).unwrap();
        assert_eq!(phrase, reparsed);
    }

    #[test]
    fn test_different_phrases_different_seeds() {
        let a = RecoveryPhrase::generate();
        let b = RecoveryPhrase::generate();
        assert_ne!(a.to_seed().as_bytes(), b.to_seed().as_bytes());
    }

    #[test]
    fn test_incomplete_phrases_rejected() {
        let mut words: Vec<String> = REFERENCE_PHRASE.split(' ').map(String::from).collect();
        words[5] = "  ".to_string();
        assert_eq!(
            RecoveryPhrase::from_words(&words),
            Err(WalletError::IncompleteImport)
        );

        assert_eq!(
            RecoveryPhrase::parse("champion capital butter"),
            Err(WalletError::IncompleteImport)
        );
        assert_eq!(RecoveryPhrase::parse(""), Err(WalletError::IncompleteImport));
    }

    #[test]
    fn test_words_are_trimmed() {
        let words: Vec<String> = REFERENCE_PHRASE
            .split(' ')
            .map(|w| format!(" {}\n", w))
            .collect();
        let phrase = RecoveryPhrase::from_words(&words).unwrap();
        assert_eq!(phrase.reveal(), REFERENCE_PHRASE);
    }

    #[test]
    fn test_debug_hides_words() {
        let phrase = RecoveryPhrase::parse(REFERENCE_PHRASE).unwrap();
        let rendered = format!("{:?} {:?}", phrase, phrase.to_seed());
        assert!(!rendered.contains("champion"));
        assert!(!rendered.contains("3f1d5d"));
    }

    #[test]
    fn test_equivalent_spellings_share_a_seed() {
        let base = "champion capital butter volume protect cave mail behind because divert have";
        let composed = RecoveryPhrase::parse(&format!("{} caf\u{e9}", base)).unwrap();
        let decomposed = RecoveryPhrase::parse(&format!("{} cafe\u{301}", base)).unwrap();
        assert_ne!(composed.reveal(), decomposed.reveal());
        assert_eq!(composed.to_seed().as_bytes(), decomposed.to_seed().as_bytes());

        // ASCII phrases are unchanged by normalization
        assert_eq!(
            hex::encode(RecoveryPhrase::parse(REFERENCE_PHRASE).unwrap().to_seed().as_bytes()),
            "3f1d5de81375feafa8c797e957762bddc58cd8c1ff071b0cd2536fce327c414fa6f398dfae3c0dbafd71df397aa3f65ed189a3cc97b6f4bc7725af694938f958"
        );
    }
}
