//! Legacy ledger transactions: a System Program transfer, compiled into a
//! message, signed by the sender and serialized for submission.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use ed25519_dalek::Signature;

use crate::crypto::{Address, KeyPair};
use crate::encoding::{write_short_len, WireEncode};
use crate::error::WalletError;

/// System Program id (all zero bytes, base58 "1111...1111")
pub const SYSTEM_PROGRAM_ID: Address = Address::new([0u8; 32]);

/// System Program instruction discriminant for `Transfer`
const SYSTEM_TRANSFER: u32 = 2;

/// Recent blockhash a message is anchored to
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Blockhash([u8; 32]);

impl Blockhash {
    pub const fn new(bytes: [u8; 32]) -> Self {
        Blockhash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Blockhash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blockhash({})", self)
    }
}

impl FromStr for Blockhash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| format!("blockhash '{}' is not base58: {}", s, e))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| format!("blockhash '{}' is not 32 bytes", s))?;
        Ok(Blockhash(bytes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn signer(pubkey: Address) -> Self {
        AccountMeta {
            pubkey,
            is_signer: true,
            is_writable: true,
        }
    }

    pub fn writable(pubkey: Address) -> Self {
        AccountMeta {
            pubkey,
            is_signer: false,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: Address) -> Self {
        AccountMeta {
            pubkey,
            is_signer: false,
            is_writable: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Address,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// Move `lamports` from `from` to `to`
pub fn system_transfer(from: &Address, to: &Address, lamports: u64) -> Instruction {
    let mut data = SYSTEM_TRANSFER.to_wire_bytes();
    data.extend_from_slice(&lamports.to_wire_bytes());
    Instruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![AccountMeta::signer(*from), AccountMeta::writable(*to)],
        data,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<Address>,
    pub recent_blockhash: Blockhash,
    pub instructions: Vec<CompiledInstruction>,
}

impl Message {
    /// Deduplicate every referenced key and order them signer-writable,
    /// signer-readonly, writable, readonly. The payer is always key 0.
    pub fn compile(payer: &Address, instructions: &[Instruction], blockhash: Blockhash) -> Self {
        let mut metas = vec![AccountMeta::signer(*payer)];
        for instruction in instructions {
            for meta in &instruction.accounts {
                merge_meta(&mut metas, meta.clone());
            }
            merge_meta(&mut metas, AccountMeta::readonly(instruction.program_id));
        }
        // Stable, so first appearance decides order inside each group
        metas.sort_by_key(|m| (!m.is_signer, !m.is_writable));

        let count = |f: fn(&AccountMeta) -> bool| metas.iter().filter(|m| f(m)).count() as u8;
        let header = MessageHeader {
            num_required_signatures: count(|m| m.is_signer),
            num_readonly_signed_accounts: count(|m| m.is_signer && !m.is_writable),
            num_readonly_unsigned_accounts: count(|m| !m.is_signer && !m.is_writable),
        };

        let account_keys: Vec<Address> = metas.iter().map(|m| m.pubkey).collect();
        let position = |key: &Address| -> u8 {
            account_keys
                .iter()
                .position(|k| k == key)
                .expect("every instruction key was merged") as u8
        };

        let instructions = instructions
            .iter()
            .map(|ix| CompiledInstruction {
                program_id_index: position(&ix.program_id),
                accounts: ix.accounts.iter().map(|m| position(&m.pubkey)).collect(),
                data: ix.data.clone(),
            })
            .collect();

        Message {
            header,
            account_keys,
            recent_blockhash: blockhash,
            instructions,
        }
    }

    pub fn signer_keys(&self) -> &[Address] {
        &self.account_keys[..self.header.num_required_signatures as usize]
    }
}

fn merge_meta(metas: &mut Vec<AccountMeta>, meta: AccountMeta) {
    match metas.iter_mut().find(|m| m.pubkey == meta.pubkey) {
        Some(existing) => {
            existing.is_signer |= meta.is_signer;
            existing.is_writable |= meta.is_writable;
        }
        None => metas.push(meta),
    }
}

impl WireEncode for MessageHeader {
    fn wire_encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&[
            self.num_required_signatures,
            self.num_readonly_signed_accounts,
            self.num_readonly_unsigned_accounts,
        ])
    }
}

impl WireEncode for CompiledInstruction {
    fn wire_encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.program_id_index.wire_encode(writer)?;
        self.accounts.wire_encode(writer)?;
        self.data.wire_encode(writer)
    }
}

impl WireEncode for Message {
    fn wire_encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.header.wire_encode(writer)?;
        self.account_keys.wire_encode(writer)?;
        self.recent_blockhash.0.wire_encode(writer)?;
        self.instructions.wire_encode(writer)
    }
}

/// A message with its signatures, ready for submission
#[derive(Debug, Clone, PartialEq)]
pub struct SignedTransaction {
    signatures: Vec<Signature>,
    message: Message,
}

impl SignedTransaction {
    /// Sign `message` with `signer`. The signer must be the message's only
    /// required signer.
    pub fn sign(message: Message, signer: &KeyPair) -> Result<Self, WalletError> {
        if message.signer_keys() != [signer.address()] {
            return Err(WalletError::InvalidSecretKey);
        }
        let signature = signer.sign(&message.to_wire_bytes());
        Ok(SignedTransaction {
            signatures: vec![signature],
            message,
        })
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// The fee payer's signature in base58, which the ledger uses as the
    /// transaction id
    pub fn id(&self) -> String {
        bs58::encode(self.signatures[0].to_bytes()).into_string()
    }
}

impl WireEncode for SignedTransaction {
    fn wire_encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_short_len(writer, self.signatures.len())?;
        for signature in &self.signatures {
            signature.wire_encode(writer)?;
        }
        self.message.wire_encode(writer)
    }
}

/// Build and sign a single transfer from `sender` to `recipient`
pub fn build_transfer(
    sender: &KeyPair,
    recipient: &Address,
    lamports: u64,
    blockhash: Blockhash,
) -> Result<SignedTransaction, WalletError> {
    let payer = sender.address();
    let instruction = system_transfer(&payer, recipient, lamports);
    let message = Message::compile(&payer, &[instruction], blockhash);
    SignedTransaction::sign(message, sender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::verify_with_address;
    use crate::encoding::read_short_len;

    const BLOCKHASH: Blockhash = Blockhash::new([7u8; 32]);

    #[test]
    fn test_transfer_instruction_data() {
        let from = KeyPair::generate().address();
        let to = KeyPair::generate().address();
        let ix = system_transfer(&from, &to, 1_500_000_000);

        assert_eq!(ix.program_id, SYSTEM_PROGRAM_ID);
        assert_eq!(
            ix.data,
            vec![2, 0, 0, 0, 0x00, 0x2f, 0x68, 0x59, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(ix.accounts[0], AccountMeta::signer(from));
        assert_eq!(ix.accounts[1], AccountMeta::writable(to));
    }

    #[test]
    fn test_compiled_transfer_layout() {
        let sender = KeyPair::generate();
        let to = KeyPair::generate().address();
        let tx = build_transfer(&sender, &to, 42, BLOCKHASH).unwrap();
        let message = tx.message();

        assert_eq!(
            message.header,
            MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            }
        );
        assert_eq!(
            message.account_keys,
            vec![sender.address(), to, SYSTEM_PROGRAM_ID]
        );
        assert_eq!(
            message.instructions,
            vec![CompiledInstruction {
                program_id_index: 2,
                accounts: vec![0, 1],
                data: system_transfer(&sender.address(), &to, 42).data,
            }]
        );
    }

    #[test]
    fn test_wire_bytes_and_signature() {
        let sender = KeyPair::generate();
        let to = KeyPair::generate().address();
        let tx = build_transfer(&sender, &to, 42, BLOCKHASH).unwrap();
        let bytes = tx.to_wire_bytes();

        // 1 signature, then the message
        assert_eq!(read_short_len(&bytes), Some((1, 1)));
        let signature = Signature::from_bytes(bytes[1..65].try_into().unwrap());
        let message = &bytes[65..];
        assert_eq!(message, tx.message().to_wire_bytes().as_slice());
        assert!(verify_with_address(&sender.address(), message, &signature));
        assert_eq!(tx.id(), bs58::encode(signature.to_bytes()).into_string());

        // header, 3 keys, blockhash, 1 instruction
        assert_eq!(&message[..4], &[1, 0, 1, 3]);
        assert_eq!(&message[4..36], sender.address().as_bytes());
        assert_eq!(&message[36..68], to.as_bytes());
        assert_eq!(&message[68..100], &[0u8; 32]);
        assert_eq!(&message[100..132], &[7u8; 32]);
        assert_eq!(
            &message[132..],
            &[1, 2, 2, 0, 1, 12, 2, 0, 0, 0, 42, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(bytes.len(), 65 + 150);
    }

    #[test]
    fn test_transfer_to_self_dedupes_keys() {
        let sender = KeyPair::generate();
        let tx = build_transfer(&sender, &sender.address(), 1, BLOCKHASH).unwrap();
        let message = tx.message();

        assert_eq!(message.account_keys, vec![sender.address(), SYSTEM_PROGRAM_ID]);
        assert_eq!(message.header.num_required_signatures, 1);
        assert_eq!(message.header.num_readonly_unsigned_accounts, 1);
        assert_eq!(message.instructions[0].program_id_index, 1);
        assert_eq!(message.instructions[0].accounts, vec![0, 0]);
    }

    #[test]
    fn test_sign_rejects_foreign_signer() {
        let payer = KeyPair::generate();
        let stranger = KeyPair::generate();
        let ix = system_transfer(&payer.address(), &stranger.address(), 5);
        let message = Message::compile(&payer.address(), &[ix], BLOCKHASH);

        assert_eq!(
            SignedTransaction::sign(message, &stranger).unwrap_err(),
            WalletError::InvalidSecretKey
        );
    }

    #[test]
    fn test_blockhash_parsing() {
        let text = BLOCKHASH.to_string();
        assert_eq!(text.parse::<Blockhash>().unwrap(), BLOCKHASH);
        assert!("abc".parse::<Blockhash>().is_err());
        assert!("0OIl".parse::<Blockhash>().is_err());
    }
}
