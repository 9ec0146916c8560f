use std::io;
use std::path::PathBuf;
use std::result;

use thiserror::Error;

/// Result type for mapping operations
pub type Result<T> = result::Result<T, Error>;

/// Errors surfaced by the mapping layer
#[derive(Debug, Error)]
pub enum Error {
    /// Read of an absent key
    #[error("key not found: {}", String::from_utf8_lossy(.0))]
    KeyNotFound(Vec<u8>),
    /// A key or value the codec cannot represent
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// Unknown open mode or malformed option
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Write attempted on a read-only store
    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),
    /// Store does not exist and the open mode does not create it
    #[error("store not found: {}", .0.display())]
    StoreNotFound(PathBuf),
    /// Store is already open in this process
    #[error("database is already open: {}", .0.display())]
    AlreadyOpen(PathBuf),
    /// Environment mapsize limit reached
    #[error("environment mapsize limit reached")]
    CapacityExceeded,
    /// Another process grew the map beyond our mapping
    #[error("database contents grew beyond environment mapsize")]
    MapResized,
    /// Growth retries exhausted; the store must not be used further
    #[error("failed to grow database ({}) after {attempts} attempts; is there enough disk space available?", path.display())]
    GrowthExhausted { path: PathBuf, attempts: u32 },
    /// On-disk artifact absent during removal
    #[error("missing artifact: {}", .0.display())]
    MissingArtifact(PathBuf),
    /// Operation on a closed database
    #[error("database is closed")]
    Closed,
    /// Value could not be transformed by the codec
    #[error("codec error: {0}")]
    Codec(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Any other storage engine failure
    #[error("storage engine error: {0}")]
    Engine(heed::Error),
}

impl Error {
    /// True only for conditions after which the store cannot be trusted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::GrowthExhausted { .. })
    }

    pub fn is_capacity_exceeded(&self) -> bool {
        matches!(self, Error::CapacityExceeded)
    }
}

impl From<heed::Error> for Error {
    fn from(err: heed::Error) -> Error {
        match err {
            heed::Error::Mdb(heed::MdbError::MapFull) => Error::CapacityExceeded,
            heed::Error::Mdb(heed::MdbError::MapResized) => Error::MapResized,
            heed::Error::Io(err) => Error::Io(err),
            err => Error::Engine(err),
        }
    }
}
