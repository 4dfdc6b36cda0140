//! # LSB Steganography
//!
//! Hides an arbitrary byte payload in the low bits of an RGB image's channel samples.
//!
//! ## Modules
//!
//! - [`cursor`]: byte-offset to sample/bit addressing and bit-level IO
//! - [`header`]: fixed 14-byte header (magic, length, checksum, reserved)
//! - [`container`]: an image opened as a payload store
//! - [`strategy`]: byte sources used to format a container
//!
//! ## Capacity
//! An image of `N` channel samples holds `N * lsb / 8 - 14` payload bytes. With the default
//! of 2 bits per sample, an 800x600 image stores roughly 360 KB.

pub mod container;
pub mod cursor;
pub mod header;
pub mod strategy;

pub use container::{Container, ContainerInfo, OpenOptions, Validation, DEFAULT_LSB};
pub use cursor::{BitPosition, Cursor, OpKind, Operation};
pub use header::{Header, HEADER_SIZE, MAGIC};
pub use strategy::{ByteSource, Ones, RandomBytes, Strategy, Zeros};
