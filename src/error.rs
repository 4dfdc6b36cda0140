use thiserror::Error;

#[derive(Error, Debug)]
pub enum StegoError {
    #[error("Invalid LSB width: {0} (must be between 1 and 8)")]
    InvalidWidth(u8),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported image mode {0} (only 8-bit RGB images can be containers)")]
    UnsupportedLayout(String),

    #[error("Attempt to {0} an invalid container")]
    InvalidContainer(&'static str),

    #[error("{0} is already a container, refusing to initialize")]
    AlreadyContainer(String),

    #[error("Payload of {requested} bytes at offset {offset} exceeds container capacity of {capacity} bytes")]
    CapacityExceeded {
        requested: usize,
        offset: usize,
        capacity: usize,
    },

    #[error("Sample index {index} is out of bounds for {len} samples")]
    OutOfBounds { index: usize, len: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StegoError>;
