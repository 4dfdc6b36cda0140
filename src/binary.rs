//! # Bit Mask Utilities
//!
//! Small integer helpers shared by the cursor and the header codec.

/// Get a mask of `n_bits` set low bits (`mask(3) == 0b111`, `mask(0) == 0`).
pub fn mask(n_bits: u32) -> u32 {
    1u32.checked_shl(n_bits).map_or(u32::MAX, |bit| bit - 1)
}

/// Split an integer at `shift` bits, returning the (most, least) significant parts.
///
/// The shift is clamped to `[0, 8]`, so a negative shift keeps everything in the high part
/// and anything past 8 splits at a full byte.
pub fn split(n: u32, shift: i32) -> (u32, u32) {
    let shift = shift.clamp(0, 8) as u32;
    (n >> shift, n & mask(shift))
}
