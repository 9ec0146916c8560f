//! A mutable mapping over an LMDB environment.
//!
//! [`Database`] behaves like an ordinary key/value container while each
//! operation runs in its own LMDB transaction. Writes that do not fit in the
//! memory map grow it and retry; values pass through a [`Codec`] so the same
//! transaction logic serves plain and compressed stores.
//!
//! ```no_run
//! use lmdbm::{Database, Datum, OpenMode};
//!
//! # fn main() -> lmdbm::Result<()> {
//! let mut db = Database::open("example.db", OpenMode::CreateIfAbsent)?;
//! db.set("a", "1")?;
//! db.update([("b", "2"), ("c", "3")])?;
//! assert_eq!(db.get("a")?, Datum::from("1"));
//! # Ok(())
//! # }
//! ```
mod batch;
mod codec;
mod constants;
mod cursor;
mod database;
mod env;
mod error;
mod growth;
mod transaction;
mod types;
mod value;

pub use batch::KeySource;
pub use codec::{Codec, Compressed, Latin1};
pub use constants::{
    EnvFlags, DATA_FILE, DEFAULT_COMPRESSION_LEVEL, DEFAULT_GROWTH_FACTOR, DEFAULT_MAP_SIZE,
    DEFAULT_MAX_ATTEMPTS, LOCK_FILE,
};
pub use cursor::{Items, Keys, Snapshot, Values};
pub use database::{CompressedDatabase, Database};
pub use env::{remove, OpenOptions};
pub use error::{Error, Result};
pub use growth::{with_growth, Growable, GrowthPolicy};
pub use types::{OpenMode, StoreInfo};
pub use value::Datum;

/// Open `path` with a dbm-style flag: `r`, `w`, `c` or `n`.
pub fn open<P: AsRef<std::path::Path>>(path: P, flag: &str) -> Result<Database> {
    Database::open(path, flag.parse()?)
}
