//! # Image Container
//!
//! An RGB image treated as a mutable byte store. The container owns the decoded sample
//! array, keeps the header in memory, and only re-encodes the image on close when something
//! was written or an initialization was requested.
//!
//! ## States
//! - **Uninitialized**: the magic bytes do not match
//! - **Empty**: valid header, zero payload length
//! - **Populated**: valid header, non-zero payload length
//!
//! `initialize` moves to Empty, `write` to Populated and `format` back to Empty.

use log::{debug, info, warn};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use super::cursor::{BitPosition, Cursor, OpKind, Operation};
use super::header::{self, Header};
use super::strategy::ByteSource;
use crate::binary::mask;
use crate::error::{Result, StegoError};
use crate::processing::raster::{self, Raster};

/// Payload bits per sample used when no width is configured.
pub const DEFAULT_LSB: u8 = 2;

/// Options controlling how a container is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    /// Payload bits per channel sample, `1..=8`
    pub lsb: u8,
    /// Turn the image into an empty container right after opening
    pub initialize: bool,
    /// Allow `initialize` to wipe an existing container
    pub force: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            lsb: DEFAULT_LSB,
            initialize: false,
            force: false,
        }
    }
}

impl OpenOptions {
    pub fn with_lsb(lsb: u8) -> Self {
        Self {
            lsb,
            ..Self::default()
        }
    }
}

/// Outcome of [`Container::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Valid,
    InvalidHeader,
    ChecksumMismatch { expected: [u8; 4], actual: [u8; 4] },
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid)
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validation::Valid => write!(f, "valid container"),
            Validation::InvalidHeader => write!(f, "invalid header"),
            Validation::ChecksumMismatch { expected, actual } => write!(
                f,
                "invalid checksum {} != {}",
                hex(actual),
                hex(expected)
            ),
        }
    }
}

/// Snapshot of container metadata, as shown by the `info` command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerInfo {
    pub path: String,
    pub valid: bool,
    pub width: u32,
    pub height: u32,
    pub capacity: usize,
    pub used: usize,
    pub used_percent: f64,
    pub samples: usize,
    pub lsb: u8,
    pub checksum: String,
    pub reserved: String,
    /// Logical offset of the payload region, only meaningful for valid containers
    pub header_end: Option<usize>,
    /// Rough estimate of how much of the channel value range is untouched
    pub visual_integrity: f64,
}

#[derive(Debug)]
pub struct Container {
    path: PathBuf,
    raster: Raster,
    lsb: u8,
    header: Header,
    header_end: usize,
    cursor: Cursor,
    initialized: bool,
}

impl Container {
    /// Decode `path` and read its header.
    ///
    /// # Errors
    /// - The image cannot be read or is not 8-bit RGB
    /// - `options.lsb` is outside `[1, 8]`
    /// - `options.initialize` is set on an existing container without `options.force`
    pub fn open(path: impl AsRef<Path>, options: &OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        // Width is checked before decoding.
        Cursor::new(options.lsb)?;
        let raster = raster::decode(path)?;
        Self::from_raster(path, raster, options)
    }

    /// Build a container over an already decoded raster.
    pub fn from_raster(
        path: impl Into<PathBuf>,
        raster: Raster,
        options: &OpenOptions,
    ) -> Result<Self> {
        let mut cursor = Cursor::new(options.lsb)?;
        let (header, header_end) = Header::read(options.lsb, &raster.samples)?;
        cursor.seek(Some(header_end));

        let mut container = Self {
            path: path.into(),
            raster,
            lsb: options.lsb,
            header,
            header_end,
            cursor,
            initialized: false,
        };
        debug!("Opened {} ({})", container.path.display(), container.cursor);

        if options.initialize {
            container.initialize(options.force)?;
        }
        Ok(container)
    }

    /// Open `path`, hand the container to `f`, then [`close`](Self::close) it whatever `f`
    /// returned.
    ///
    /// An error from `f` takes precedence over an error from closing.
    pub fn scoped<T, E, F>(
        path: impl AsRef<Path>,
        options: &OpenOptions,
        f: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Container) -> std::result::Result<T, E>,
        E: From<StegoError>,
    {
        let mut container = Container::open(path, options)?;
        let outcome = f(&mut container);
        match (outcome, container.close()) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(close_err)) => {
                warn!("Failed to close container: {}", close_err);
                Err(e)
            }
        }
    }

    /// Persist the container if it was written to or initialized, consuming it.
    ///
    /// Returns the path of the written image, if any.
    pub fn close(mut self) -> Result<Option<PathBuf>> {
        if !self.is_dirty() {
            debug!("{} unchanged, nothing to save", self.path.display());
            return Ok(None);
        }
        self.save(None).map(Some)
    }

    /// Recompute the checksum, rewrite the header and encode the image as PNG at `path` (or
    /// the container's own path).
    pub fn save(&mut self, path: Option<&Path>) -> Result<PathBuf> {
        self.header.checksum = self.checksum()?;
        let ops = self.header.write(self.lsb, &mut self.raster.samples)?;
        self.cursor.extend_operations(ops);

        let target = raster::encode(&self.raster, path.unwrap_or(self.path.as_path()))?;
        info!("Saved {}", target.display());
        self.path = target.clone();
        Ok(target)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_end(&self) -> usize {
        self.header_end
    }

    pub fn lsb(&self) -> u8 {
        self.lsb
    }

    pub fn samples(&self) -> &[u8] {
        &self.raster.samples
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.raster.width, self.raster.height)
    }

    pub fn operations(&self) -> &[Operation] {
        self.cursor.operations()
    }

    pub fn is_valid(&self) -> bool {
        self.header.is_valid()
    }

    /// Whether closing would rewrite the image.
    pub fn is_dirty(&self) -> bool {
        self.initialized || self.cursor.has_writes()
    }

    /// Payload bytes this image can hold at the configured width.
    pub fn capacity(&self) -> usize {
        (self.raster.samples.len() * self.lsb as usize / 8).saturating_sub(self.header_end)
    }

    /// Seek relative to the start of the payload region, or report the current position.
    pub fn seek(&mut self, pos: Option<usize>) -> BitPosition {
        self.cursor.seek(pos.map(|p| p.saturating_add(self.header_end)))
    }

    /// Current offset relative to the payload region.
    pub fn tell(&self) -> usize {
        self.cursor
            .position()
            .offset
            .saturating_sub(self.header_end)
    }

    /// Declared payload length, bounded by what the image can actually hold.
    fn payload_len(&self) -> usize {
        (self.header.length as usize).min(self.capacity())
    }

    /// Read up to `count` payload bytes from the current position, or everything that
    /// remains when `count` is `None`.
    ///
    /// Requests past the declared payload length are clamped with a warning.
    ///
    /// # Errors
    /// - [`StegoError::InvalidContainer`] if the header is invalid
    pub fn read(&mut self, count: Option<usize>) -> Result<Vec<u8>> {
        if !self.is_valid() {
            return Err(StegoError::InvalidContainer("read from"));
        }

        let max_count = self.payload_len().saturating_sub(self.tell());
        let count = match count {
            Some(count) if count > max_count => {
                warn!("Read past boundary ({} > {})", count, max_count);
                max_count
            }
            Some(count) => count,
            None => max_count,
        };
        self.cursor.read(&self.raster.samples, count)
    }

    /// Read from payload offset `pos` without disturbing the current position.
    pub fn read_from(&mut self, count: usize, pos: usize) -> Result<Vec<u8>> {
        let current = self.cursor.position().offset;
        self.seek(Some(pos));
        let res = self.read(Some(count));
        self.cursor.seek(Some(current));
        res
    }

    /// Write `data` at the current position and declare it as the whole payload.
    ///
    /// # Errors
    /// - [`StegoError::InvalidContainer`] if the header is invalid
    /// - [`StegoError::CapacityExceeded`] if `data` does not fit; nothing is written
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        if !self.is_valid() {
            return Err(StegoError::InvalidContainer("write to"));
        }

        let offset = self.tell();
        let capacity = self.capacity();
        let exceeded = StegoError::CapacityExceeded {
            requested: data.len(),
            offset,
            capacity,
        };
        if offset.checked_add(data.len()).map_or(true, |end| end > capacity) {
            return Err(exceeded);
        }
        let length = u32::try_from(data.len()).map_err(|_| exceeded)?;

        debug!("Writing {} bytes to pixel channel LSBs", data.len());
        self.cursor.write(&mut self.raster.samples, data)?;
        self.header.length = length;
        self.header.checksum = self.checksum()?;
        Ok(())
    }

    /// Write at payload offset `pos` without disturbing the current position.
    pub fn write_from(&mut self, data: &[u8], pos: usize) -> Result<()> {
        let current = self.cursor.position().offset;
        self.seek(Some(pos));
        let res = self.write(data);
        self.cursor.seek(Some(current));
        res
    }

    /// Checksum of the declared payload.
    pub fn checksum(&mut self) -> Result<[u8; 4]> {
        let current = self.cursor.position().offset;
        let count = self.payload_len();
        self.seek(Some(0));
        let payload = self.cursor.read(&self.raster.samples, count);
        self.cursor.seek(Some(current));
        Ok(header::checksum(&payload?))
    }

    /// Check the header and, unless `header_only`, the payload checksum.
    ///
    /// A failed check is reported through the returned [`Validation`], not as an error.
    pub fn validate(&mut self, header_only: bool) -> Result<Validation> {
        let validation = if !self.is_valid() {
            Validation::InvalidHeader
        } else if header_only {
            Validation::Valid
        } else {
            let actual = self.checksum()?;
            let expected = self.header.checksum;
            if actual == expected {
                Validation::Valid
            } else {
                Validation::ChecksumMismatch { expected, actual }
            }
        };

        if validation.is_valid() {
            info!("Valid: {} is a valid container", self.path.display());
        } else {
            warn!("Invalid: {} has an {}", self.path.display(), validation);
        }
        Ok(validation)
    }

    /// Reset the header to an empty container.
    ///
    /// # Errors
    /// - [`StegoError::AlreadyContainer`] if the header is already valid and `force` is unset
    pub fn initialize(&mut self, force: bool) -> Result<()> {
        if !force && self.is_valid() {
            return Err(StegoError::AlreadyContainer(self.path.display().to_string()));
        }

        self.header = Header::initialized();
        self.initialized = true;
        info!(
            "Initialized: {} can now be used as a data container",
            self.path.display()
        );
        Ok(())
    }

    /// Overwrite the whole payload region with bytes from `source`, one byte at a time, and
    /// mark the container empty.
    ///
    /// The whole pass is logged as a single write operation.
    pub fn format<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        let start = self.seek(Some(0));
        let capacity = self.capacity();
        info!("Formatting with strategy: {}", source.name());

        let step = (capacity / 10).max(1);
        let mut written = 0;
        let mut outcome = Ok(());
        while written < capacity {
            let byte = source.next_byte();
            outcome = self.cursor.write_untracked(&mut self.raster.samples, &[byte]);
            if outcome.is_err() {
                break;
            }
            if written % step == 0 {
                debug!("Formatting... {}%", written * 100 / capacity);
            }
            written += 1;
        }
        self.cursor.record(start, written, OpKind::Write);
        outcome?;

        self.header.length = 0;
        self.header.checksum = self.checksum()?;
        Ok(())
    }

    pub fn info(&self) -> ContainerInfo {
        let valid = self.is_valid();
        let capacity = self.capacity();
        let used = self.header.length as usize;
        let used_percent = if capacity == 0 {
            0.0
        } else {
            used as f64 / capacity as f64 * 100.0
        };

        let max_integrity = self.raster.samples.len() as f64 * 256.0;
        let touched = self.cursor.locate(used).index as f64;
        let degradation = (mask(self.lsb as u32) as f64 + 1.0) * touched;
        let visual_integrity = if max_integrity == 0.0 {
            0.0
        } else {
            (max_integrity - degradation) / max_integrity * 100.0
        };

        ContainerInfo {
            path: self.path.display().to_string(),
            valid,
            width: self.raster.width,
            height: self.raster.height,
            capacity,
            used,
            used_percent,
            samples: self.raster.samples.len(),
            lsb: self.lsb,
            checksum: hex(&self.header.checksum),
            reserved: hex(&self.header.reserved),
            header_end: valid.then_some(self.header_end),
            visual_integrity,
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
