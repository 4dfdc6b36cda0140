//! # Format Strategies
//!
//! Infinite byte sources used by [`Container::format`](super::Container::format) to
//! overwrite every payload byte of a container.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Produces the next byte to write; never runs dry.
pub trait ByteSource {
    fn next_byte(&mut self) -> u8;

    fn name(&self) -> &str {
        "custom"
    }
}

/// Uniformly random bytes.
#[derive(Debug, Clone)]
pub struct RandomBytes {
    rng: StdRng,
}

impl RandomBytes {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic source, handy for reproducible formatting.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomBytes {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteSource for RandomBytes {
    fn next_byte(&mut self) -> u8 {
        let mut byte = [0u8; 1];
        self.rng.fill_bytes(&mut byte);
        byte[0]
    }

    fn name(&self) -> &str {
        "random"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Zeros;

impl ByteSource for Zeros {
    fn next_byte(&mut self) -> u8 {
        0x00
    }

    fn name(&self) -> &str {
        "zeros"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Ones;

impl ByteSource for Ones {
    fn next_byte(&mut self) -> u8 {
        0xFF
    }

    fn name(&self) -> &str {
        "ones"
    }
}

/// Adapts a closure into a [`ByteSource`].
#[derive(Debug, Clone)]
pub struct FromFn<F>(F);

pub fn from_fn<F: FnMut() -> u8>(f: F) -> FromFn<F> {
    FromFn(f)
}

impl<F: FnMut() -> u8> ByteSource for FromFn<F> {
    fn next_byte(&mut self) -> u8 {
        (self.0)()
    }
}

/// Built-in strategies selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Random,
    Zeros,
    Ones,
}

impl Strategy {
    pub fn source(self) -> Box<dyn ByteSource> {
        match self {
            Strategy::Random => Box::new(RandomBytes::new()),
            Strategy::Zeros => Box::new(Zeros),
            Strategy::Ones => Box::new(Ones),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_sources() {
        let mut zeros = Strategy::Zeros.source();
        let mut ones = Strategy::Ones.source();
        assert!((0..16).all(|_| zeros.next_byte() == 0));
        assert!((0..16).all(|_| ones.next_byte() == 0xFF));
        assert_eq!(zeros.name(), "zeros");
        assert_eq!(ones.name(), "ones");
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let mut a = RandomBytes::seeded(7);
        let mut b = RandomBytes::seeded(7);
        let left: Vec<u8> = (0..32).map(|_| a.next_byte()).collect();
        let right: Vec<u8> = (0..32).map(|_| b.next_byte()).collect();
        assert_eq!(left, right);
        assert!(left.iter().any(|&byte| byte != left[0]));
    }

    #[test]
    fn test_custom_source() {
        let mut counter = 0u8;
        let mut source = from_fn(move || {
            counter = counter.wrapping_add(1);
            counter
        });
        assert_eq!(source.next_byte(), 1);
        assert_eq!(source.next_byte(), 2);
        assert_eq!(source.name(), "custom");
    }
}
