//! # Image Processing
//!
//! Image file I/O for containers, backed by the `image` crate.

pub mod raster;

pub use raster::{decode, encode, Raster};
