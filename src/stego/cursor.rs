//! # Bit Cursor
//!
//! Maps logical byte offsets onto the flattened channel-sample array and reads or writes
//! whole bytes through the low `lsb` bits of consecutive samples.
//!
//! ```text
//! Data (lsb = 3)  : [1 0 1 0 1 0 1 0|1 0 1 0 1 0 1 0]
//! Samples         : [1 0 1|0 1 0|1 0 1|0 1 0|1 0 1|0 . .]
//! seek(1)         :              ^ index 2, 1 bit remaining
//! ```
//!
//! Every read and write is appended to an operation log, which the container consults to
//! decide whether anything needs to be persisted.

use serde::Serialize;
use std::fmt;

use crate::binary::{mask, split};
use crate::error::{Result, StegoError};

/// Smallest supported number of payload bits per sample.
pub const MIN_LSB: u8 = 1;
/// Largest supported number of payload bits per sample.
pub const MAX_LSB: u8 = 8;

/// A resolved cursor location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BitPosition {
    /// Logical byte offset into the bitstream
    pub offset: usize,
    /// Index of the sample holding the next unread bit
    pub index: usize,
    /// Payload bits still available in that sample, in `[1, lsb]`
    pub bits: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Read,
    Write,
}

/// One entry of the cursor's append-only operation log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub start: BitPosition,
    pub end: BitPosition,
    pub count: usize,
    pub kind: OpKind,
}

#[derive(Debug, Clone)]
pub struct Cursor {
    lsb: u8,
    offset: usize,
    index: usize,
    low_mask: u8,
    high_mask: u8,
    operations: Vec<Operation>,
}

impl Cursor {
    /// Create a cursor at offset 0 using `lsb` bits of every sample.
    ///
    /// # Errors
    /// - [`StegoError::InvalidWidth`] if `lsb` is outside `[1, 8]`
    pub fn new(lsb: u8) -> Result<Self> {
        if !(MIN_LSB..=MAX_LSB).contains(&lsb) {
            return Err(StegoError::InvalidWidth(lsb));
        }

        Ok(Self {
            lsb,
            offset: 0,
            index: 0,
            low_mask: mask(lsb as u32) as u8,
            high_mask: (mask(8 - lsb as u32) << lsb) as u8,
            operations: Vec::new(),
        })
    }

    pub fn lsb(&self) -> u8 {
        self.lsb
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn has_writes(&self) -> bool {
        self.operations.iter().any(|op| op.kind == OpKind::Write)
    }

    /// Append operations recorded by another cursor (e.g. a header write).
    pub fn extend_operations(&mut self, operations: impl IntoIterator<Item = Operation>) {
        self.operations.extend(operations);
    }

    fn bits(&self) -> u8 {
        self.locate(self.offset).bits
    }

    /// Resolve `offset` without moving the cursor.
    ///
    /// Offsets whose bit address does not fit a `usize` saturate to the last addressable bit,
    /// which lies past the end of any real sample array.
    pub fn locate(&self, offset: usize) -> BitPosition {
        let bit_offset = offset.saturating_mul(8);
        let lsb = self.lsb as usize;
        BitPosition {
            offset,
            index: bit_offset / lsb,
            bits: (lsb - bit_offset % lsb) as u8,
        }
    }

    /// The current position; equivalent to seeking nowhere.
    pub fn position(&self) -> BitPosition {
        BitPosition {
            offset: self.offset,
            index: self.index,
            bits: self.bits(),
        }
    }

    /// Move the cursor to `offset`, or report the current position when `None`.
    pub fn seek(&mut self, offset: Option<usize>) -> BitPosition {
        match offset {
            None => self.position(),
            Some(offset) => {
                let pos = self.locate(offset);
                self.offset = pos.offset;
                self.index = pos.index;
                pos
            }
        }
    }

    /// Decompose `data` into `lsb`-wide chunks, the first of which starts `shift` bits into
    /// its sample slot.
    pub fn iter_bits<'a>(&self, data: &'a [u8], shift: i32) -> BitChunks<'a> {
        BitChunks {
            data: data.iter(),
            lsb: self.lsb as i32,
            queue: 0,
            shift,
            first_shift: shift,
            fed: false,
            done: false,
        }
    }

    /// Read `count` bytes starting at the current position.
    ///
    /// # Errors
    /// - [`StegoError::OutOfBounds`] if the bytes extend past the end of `samples`; the
    ///   cursor does not move in that case
    pub fn read(&mut self, samples: &[u8], count: usize) -> Result<Vec<u8>> {
        let start = self.position();
        let mut out = Vec::with_capacity(count);

        if count > 0 {
            let lsb = self.lsb as u32;
            let mut index = self.index;
            let mut bits = self.bits() as u32;
            // At most 7 + lsb bits are ever pending, so 16 bits cannot overflow.
            let mut acc = (sample_at(samples, index)? as u32 & mask(bits)) as u16;

            while out.len() < count {
                if bits >= 8 {
                    bits -= 8;
                    out.push((acc >> bits) as u8);
                    acc &= mask(bits) as u16;
                } else {
                    index += 1;
                    acc = (acc << lsb) | (sample_at(samples, index)? & self.low_mask) as u16;
                    bits += lsb;
                }
            }
        }

        self.seek(Some(self.offset.saturating_add(count)));
        self.record(start, count, OpKind::Read);
        Ok(out)
    }

    /// Write `data` at the current position, touching only payload bits.
    ///
    /// # Errors
    /// - [`StegoError::OutOfBounds`] if the data does not fit before the end of `samples`;
    ///   nothing is modified in that case
    pub fn write(&mut self, samples: &mut [u8], data: &[u8]) -> Result<()> {
        let start = self.position();
        self.write_untracked(samples, data)?;
        self.record(start, data.len(), OpKind::Write);
        Ok(())
    }

    /// [`write`](Self::write) without an operation record, for bulk writers that log a
    /// single summary entry through [`record`](Self::record).
    pub(crate) fn write_untracked(&mut self, samples: &mut [u8], data: &[u8]) -> Result<()> {
        if !data.is_empty() {
            let shift = (self.lsb - self.bits()) as i32;
            let chunks: Vec<(u8, u8)> = self.iter_bits(data, shift).collect();
            let end = self.index.saturating_add(chunks.len());
            if end > samples.len() {
                return Err(StegoError::OutOfBounds {
                    index: end - 1,
                    len: samples.len(),
                });
            }

            for (sample, (value, keep)) in samples[self.index..end].iter_mut().zip(chunks) {
                *sample = (*sample & (self.high_mask | keep)) | value;
            }
        }

        self.seek(Some(self.offset.saturating_add(data.len())));
        Ok(())
    }

    pub(crate) fn record(&mut self, start: BitPosition, count: usize, kind: OpKind) {
        let end = self.position();
        self.operations.push(Operation {
            start,
            end,
            count,
            kind,
        });
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Cursor: lsb={} idx={} pos={} bits={} />",
            self.lsb,
            self.index,
            self.offset,
            self.bits()
        )
    }
}

fn sample_at(samples: &[u8], index: usize) -> Result<u8> {
    samples.get(index).copied().ok_or(StegoError::OutOfBounds {
        index,
        len: samples.len(),
    })
}

/// Iterator over `(value, keep_mask)` pairs produced by [`Cursor::iter_bits`].
///
/// `value` holds the chunk's bits aligned to the `lsb`-wide slot. `keep_mask` marks the bits
/// of the slot that belong to neighbouring data and must survive the write: the leading bits
/// of the first chunk when writing starts mid-sample, and the zero padding of a trailing
/// partial chunk.
#[derive(Debug, Clone)]
pub struct BitChunks<'a> {
    data: std::slice::Iter<'a, u8>,
    lsb: i32,
    queue: u32,
    shift: i32,
    first_shift: i32,
    fed: bool,
    done: bool,
}

impl BitChunks<'_> {
    fn leading_mask(&self, n_bits: i32) -> u8 {
        let n_bits = n_bits.clamp(0, self.lsb) as u32;
        (mask(n_bits) << (self.lsb as u32 - n_bits)) as u8
    }
}

impl Iterator for BitChunks<'_> {
    type Item = (u8, u8);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.fed && self.shift >= self.lsb {
                self.shift -= self.lsb;
                let (value, rest) = split(self.queue, self.shift);
                self.queue = rest;
                let keep = self.leading_mask(self.first_shift);
                self.first_shift = self.first_shift.saturating_sub(self.lsb);
                return Some((value as u8, keep));
            }

            match self.data.next() {
                Some(&byte) => {
                    self.fed = true;
                    self.shift += 8;
                    self.queue = (self.queue << 8) | byte as u32;
                }
                None => {
                    if self.done || !self.fed || self.shift <= 0 {
                        return None;
                    }
                    self.done = true;
                    let offset = (self.lsb - self.shift) as u32;
                    return Some(((self.queue << offset) as u8, mask(offset) as u8));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERN: [u8; 2] = [0b1010_1010, 0b1010_1010];

    #[test]
    fn test_rejects_invalid_width() {
        assert!(matches!(Cursor::new(0), Err(StegoError::InvalidWidth(0))));
        assert!(matches!(Cursor::new(9), Err(StegoError::InvalidWidth(9))));
        for lsb in MIN_LSB..=MAX_LSB {
            assert!(Cursor::new(lsb).is_ok());
        }
    }

    #[test]
    fn test_seek() {
        let mut cursor = Cursor::new(3).unwrap();
        let at = |offset, index, bits| BitPosition { offset, index, bits };

        assert_eq!(cursor.seek(Some(0)), at(0, 0, 3));
        assert_eq!(cursor.seek(Some(1)), at(1, 2, 1));
        assert_eq!(cursor.seek(Some(2)), at(2, 5, 2));
        assert_eq!(cursor.seek(None), at(2, 5, 2));
    }

    #[test]
    fn test_seek_formula_all_widths() {
        for lsb in MIN_LSB..=MAX_LSB {
            let mut cursor = Cursor::new(lsb).unwrap();
            let mut last_index = None;
            for offset in 0..64 {
                let pos = cursor.seek(Some(offset));
                let w = lsb as usize;
                assert_eq!(pos.index, offset * 8 / w);
                assert_eq!(pos.bits as usize, w - (offset * 8) % w);
                assert!(pos.bits >= 1 && pos.bits <= lsb);
                if let Some(last) = last_index {
                    assert!(pos.index > last);
                }
                last_index = Some(pos.index);
            }
        }
    }

    #[test]
    fn test_iter_bits() {
        let cursor = Cursor::new(3).unwrap();

        let chunks: Vec<_> = cursor.iter_bits(&PATTERN, 0).collect();
        assert_eq!(
            chunks,
            vec![
                (0b101, 0),
                (0b010, 0),
                (0b101, 0),
                (0b010, 0),
                (0b101, 0),
                (0b000, 0b011),
            ]
        );

        let chunks: Vec<_> = cursor.iter_bits(&PATTERN, 8).collect();
        assert_eq!(
            chunks,
            vec![
                (0b000, 0b111),
                (0b000, 0b111),
                (0b001, 0b110),
                (0b010, 0),
                (0b101, 0),
                (0b010, 0),
                (0b101, 0),
                (0b010, 0),
            ]
        );
    }

    #[test]
    fn test_iter_bits_empty() {
        let cursor = Cursor::new(3).unwrap();
        assert_eq!(cursor.iter_bits(&[], 1).count(), 0);
    }

    #[test]
    fn test_write_preserves_high_bits() {
        let mut cursor = Cursor::new(2).unwrap();
        let mut samples = vec![0xFF; 8];

        cursor.write(&mut samples, &[0x00]).unwrap();

        assert_eq!(&samples[..4], &[0xFC; 4]);
        assert_eq!(&samples[4..], &[0xFF; 4]);
    }

    #[test]
    fn test_write_mid_sample_keeps_neighbours() {
        let mut cursor = Cursor::new(3).unwrap();
        let mut samples = vec![0u8; 16];

        cursor.write(&mut samples, &[0xFF]).unwrap();
        cursor.write(&mut samples, &[0x00]).unwrap();
        cursor.write(&mut samples, &[0xFF]).unwrap();

        cursor.seek(Some(0));
        assert_eq!(cursor.read(&samples, 3).unwrap(), vec![0xFF, 0x00, 0xFF]);
        // Sample 2 carries the last two bits of byte 0 and the first bit of byte 1.
        assert_eq!(samples[2], 0b110);
    }

    #[test]
    fn test_round_trip_all_widths() {
        let payload: Vec<u8> = (0..=255u8).rev().chain(0..=255u8).collect();
        for lsb in MIN_LSB..=MAX_LSB {
            let mut samples: Vec<u8> = (0..payload.len() * 8 + 64)
                .map(|i| (i * 37 % 256) as u8)
                .collect();
            let original = samples.clone();
            let mut cursor = Cursor::new(lsb).unwrap();

            cursor.seek(Some(3));
            cursor.write(&mut samples, &payload).unwrap();
            cursor.seek(Some(3));
            assert_eq!(cursor.read(&samples, payload.len()).unwrap(), payload);

            let high = !(mask(lsb as u32) as u8);
            for (after, before) in samples.iter().zip(&original) {
                assert_eq!(after & high, before & high);
            }
        }
    }

    #[test]
    fn test_read_to_last_sample() {
        for lsb in MIN_LSB..=MAX_LSB {
            let mut samples = vec![0u8; 8];
            let mut cursor = Cursor::new(lsb).unwrap();
            let count = lsb as usize;

            cursor.write(&mut samples, &vec![0x5A; count]).unwrap();
            cursor.seek(Some(0));
            assert_eq!(cursor.read(&samples, count).unwrap(), vec![0x5A; count]);
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let mut cursor = Cursor::new(1).unwrap();
        let mut samples = vec![0u8; 12];

        assert!(matches!(
            cursor.write(&mut samples, &[1, 2]),
            Err(StegoError::OutOfBounds { .. })
        ));
        assert_eq!(samples, vec![0u8; 12]);
        assert!(cursor.read(&samples, 2).is_err());
        assert_eq!(cursor.position().offset, 0);
        assert!(cursor.read(&samples, 0).unwrap().is_empty());
    }

    #[test]
    fn test_huge_offsets_saturate() {
        let mut cursor = Cursor::new(3).unwrap();
        let samples = vec![0u8; 16];

        let pos = cursor.seek(Some(usize::MAX));
        assert_eq!(pos.offset, usize::MAX);
        assert_eq!(pos.index, usize::MAX / 3);
        assert!(pos.bits >= 1 && pos.bits <= 3);
        assert_eq!(cursor.locate(usize::MAX / 4).index, usize::MAX / 3);

        assert!(matches!(
            cursor.read(&samples, 1),
            Err(StegoError::OutOfBounds { .. })
        ));
        let mut samples = samples;
        assert!(cursor.write(&mut samples, b"x").is_err());
        assert!(cursor.read(&samples, 0).unwrap().is_empty());
    }

    #[test]
    fn test_operation_log() {
        let mut cursor = Cursor::new(4).unwrap();
        let mut samples = vec![0u8; 8];

        cursor.write(&mut samples, b"ab").unwrap();
        assert!(cursor.has_writes());
        cursor.read(&samples, 1).unwrap();

        let ops = cursor.operations();
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].kind, OpKind::Write);
        assert_eq!(ops[0].count, 2);
        assert_eq!(ops[0].start.offset, 0);
        assert_eq!(ops[0].end.offset, 2);
        assert_eq!(ops[1].kind, OpKind::Read);
        assert_eq!(ops[1].start.index, 4);
    }
}
