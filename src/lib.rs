//! # lsb-vault
//!
//! Store arbitrary bytes in the least significant bits of an RGB image.
//!
//! ```ignore
//! use lsb_vault::stego::{Container, OpenOptions};
//!
//! let options = OpenOptions { initialize: true, ..OpenOptions::default() };
//! Container::scoped("cover.png", &options, |c| c.write(b"hello"))?;
//! ```

pub mod binary;
pub mod commands;
pub mod common;
pub mod error;
pub mod processing;
pub mod stego;

pub use error::{Result, StegoError};
pub use stego::{Container, OpenOptions};
