use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

/// How a store is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Open an existing store for reading only (`r`)
    #[default]
    ReadOnly,
    /// Open an existing store for reading and writing (`w`)
    ReadWriteExisting,
    /// Open for reading and writing, creating the store if missing (`c`)
    CreateIfAbsent,
    /// Delete any existing store, then create a new empty one (`n`)
    RecreateFresh,
}

impl OpenMode {
    pub fn is_writable(self) -> bool {
        !matches!(self, OpenMode::ReadOnly)
    }

    pub fn creates(self) -> bool {
        matches!(self, OpenMode::CreateIfAbsent | OpenMode::RecreateFresh)
    }

    /// The dbm-style flag string for this mode.
    pub fn as_flag(self) -> &'static str {
        match self {
            OpenMode::ReadOnly => "r",
            OpenMode::ReadWriteExisting => "w",
            OpenMode::CreateIfAbsent => "c",
            OpenMode::RecreateFresh => "n",
        }
    }
}

impl FromStr for OpenMode {
    type Err = Error;

    fn from_str(flag: &str) -> Result<Self> {
        match flag {
            "r" => Ok(OpenMode::ReadOnly),
            "w" => Ok(OpenMode::ReadWriteExisting),
            "c" => Ok(OpenMode::CreateIfAbsent),
            "n" => Ok(OpenMode::RecreateFresh),
            other => Err(Error::InvalidArgument(format!("invalid open flag {:?}", other))),
        }
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_flag())
    }
}

/// Point-in-time description of an open store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreInfo {
    /// Store directory
    pub path: PathBuf,
    /// Mode the store was opened with
    pub mode: OpenMode,
    /// Current map size in bytes
    pub capacity: usize,
    /// Number of entries
    pub entries: usize,
}
