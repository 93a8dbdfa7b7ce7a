use std::io::{self, Write};

use ed25519_dalek::Signature;

use crate::crypto::Address;

/// Types with a fixed binary layout on the ledger wire. Signatures cover
/// these bytes, so the layout must be deterministic.
pub trait WireEncode {
    fn wire_encode<W: Write>(&self, writer: &mut W) -> io::Result<()>;

    fn to_wire_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.wire_encode(&mut buf).expect("memory write failed");
        buf
    }
}

/// Compact-u16 length prefix: 7 bits per byte, high bit set on all but the
/// last byte, at most three bytes.
pub fn write_short_len<W: Write>(writer: &mut W, len: usize) -> io::Result<()> {
    let mut rem = u16::try_from(len).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("length {} exceeds compact-u16", len),
        )
    })?;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            return writer.write_all(&[byte]);
        }
        byte |= 0x80;
        writer.write_all(&[byte])?;
    }
}

/// Decode a compact-u16 prefix, returning (value, bytes consumed)
#[cfg(test)]
pub(crate) fn read_short_len(bytes: &[u8]) -> Option<(usize, usize)> {
    let mut value: usize = 0;
    for (i, byte) in bytes.iter().take(3).enumerate() {
        value |= ((byte & 0x7f) as usize) << (7 * i);
        if byte & 0x80 == 0 {
            return u16::try_from(value).ok().map(|v| (v as usize, i + 1));
        }
    }
    None
}

// --- Primitives ---

impl WireEncode for u8 {
    fn wire_encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&[*self])
    }
}

impl WireEncode for u32 {
    fn wire_encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_le_bytes())
    }
}

impl WireEncode for u64 {
    fn wire_encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_le_bytes())
    }
}

impl WireEncode for [u8; 32] {
    fn wire_encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self)
    }
}

impl WireEncode for Address {
    fn wire_encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.as_bytes())
    }
}

impl WireEncode for Signature {
    fn wire_encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }
}

/// Sequences carry a compact-u16 element count
impl<T: WireEncode> WireEncode for Vec<T> {
    fn wire_encode<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_short_len(writer, self.len())?;
        for item in self {
            item.wire_encode(writer)?;
        }
        Ok(())
    }
}
