/// Error taxonomy of the paged containers.
///
/// `KeyNotFound` and `IndexOutOfRange` are the recoverable *not-found* kinds;
/// everything else is fatal for the operation that raised it. Nothing is
/// retried internally.
use codec::CodecError;
use config::ConfigError;
use keyhash::HashError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Invalid capacity or page bound, raised before any file I/O.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `get`/`remove` on a key the container does not hold.
    #[error("key not found")]
    KeyNotFound,

    /// Positional access past the end of a list.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: u64, len: u64 },

    /// A page the container believes is on disk has no file.
    #[error("page {address} should be on disk at {} but is missing", path.display())]
    MissingPage { address: u64, path: PathBuf },

    /// Existing files were written with a different page capacity.
    #[error(
        "{} was written with page capacity {stored}, cannot reopen with {requested}",
        path.display()
    )]
    CapacityMismatch {
        path: PathBuf,
        stored: u64,
        requested: u64,
    },

    /// The key has no deterministic hash.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// A page or index file failed to encode or decode.
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The container was closed; open it again to keep using the files.
    #[error("container is closed")]
    Closed,
}

impl StoreError {
    /// Returns `true` for the recoverable not-found kinds.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::KeyNotFound | StoreError::IndexOutOfRange { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
