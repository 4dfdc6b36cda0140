//! # Common Components
//!
//! Ambient utilities used by the library's commands and the `stego` binary.
//!
//! ## Modules
//!
//! - [`config`]: TOML configuration loading
//! - [`content`]: payload input/output and size formatting
//! - [`logging`]: `env_logger` setup

pub mod config;
pub mod content;
pub mod logging;
