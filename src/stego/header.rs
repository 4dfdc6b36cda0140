//! # Container Header
//!
//! The header sits at logical offset 0 of every container and is written through the same
//! cursor addressing as the payload:
//!
//! | Field    | Size | Encoding            |
//! |----------|------|---------------------|
//! | magic    | 2    | `b"=)"`             |
//! | length   | 4    | big-endian `u32`    |
//! | checksum | 4    | SHA-256 prefix      |
//! | reserved | 4    | zero                |

use sha2::{Digest, Sha256};

use super::cursor::{Cursor, Operation};
use crate::error::Result;

pub const MAGIC: [u8; 2] = *b"=)";

/// Encoded size of the header in logical bytes.
pub const HEADER_SIZE: usize = 14;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 2],
    /// Declared payload length in bytes
    pub length: u32,
    pub checksum: [u8; 4],
    pub reserved: [u8; 4],
}

impl Header {
    /// Header of a freshly initialized, empty container.
    pub fn initialized() -> Self {
        Self {
            magic: MAGIC,
            length: 0,
            checksum: checksum(&[]),
            reserved: [0; 4],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    /// Decode the header from the start of `samples`, returning it together with the logical
    /// offset where the payload region begins.
    pub fn read(lsb: u8, samples: &[u8]) -> Result<(Self, usize)> {
        let mut cursor = Cursor::new(lsb)?;
        let header = Self {
            magic: take(&mut cursor, samples)?,
            length: u32::from_be_bytes(take(&mut cursor, samples)?),
            checksum: take(&mut cursor, samples)?,
            reserved: take(&mut cursor, samples)?,
        };
        Ok((header, cursor.position().offset))
    }

    /// Encode the header at the start of `samples`, returning the recorded operations.
    pub fn write(&self, lsb: u8, samples: &mut [u8]) -> Result<Vec<Operation>> {
        let mut cursor = Cursor::new(lsb)?;
        cursor.write(samples, &self.magic)?;
        cursor.write(samples, &self.length.to_be_bytes())?;
        cursor.write(samples, &self.checksum)?;
        cursor.write(samples, &self.reserved)?;
        Ok(cursor.operations().to_vec())
    }
}

/// First four bytes of the SHA-256 digest of `data`.
pub fn checksum(data: &[u8]) -> [u8; 4] {
    let digest = Sha256::digest(data);
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

fn take<const N: usize>(cursor: &mut Cursor, samples: &[u8]) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(&cursor.read(samples, N)?);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_checksum() {
        // sha256("") = e3b0c442...
        assert_eq!(checksum(b""), [0xe3, 0xb0, 0xc4, 0x42]);
        assert_eq!(Header::initialized().checksum, [0xe3, 0xb0, 0xc4, 0x42]);
    }

    #[test]
    fn test_header_layout() {
        for lsb in 1..=8u8 {
            let mut samples = vec![0u8; 128];
            let header = Header {
                magic: MAGIC,
                length: 0x0102_0304,
                checksum: [9, 8, 7, 6],
                reserved: [0; 4],
            };

            let ops = header.write(lsb, &mut samples).unwrap();
            assert_eq!(ops.len(), 4);

            let (decoded, end) = Header::read(lsb, &samples).unwrap();
            assert_eq!(decoded, header);
            assert!(decoded.is_valid());
            assert_eq!(end, HEADER_SIZE);
        }
    }

    #[test]
    fn test_blank_samples_are_not_a_container() {
        let (header, _) = Header::read(2, &[0u8; 64]).unwrap();
        assert!(!header.is_valid());
        assert!(!Header::default().is_valid());
    }

    #[test]
    fn test_too_few_samples() {
        assert!(Header::read(1, &[0u8; 100]).is_err());
    }
}
