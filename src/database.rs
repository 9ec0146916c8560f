use std::fmt;
use std::path::Path;

use crate::batch::{EncodedPairs, KeySource};
use crate::codec::{Codec, Compressed, Latin1};
use crate::cursor::Snapshot;
use crate::env::{Environment, OpenOptions};
use crate::error::{Error, Result};
use crate::growth::{with_growth, Growable, GrowthPolicy};
use crate::types::{OpenMode, StoreInfo};

/// Database whose values are zstd-compressed
pub type CompressedDatabase = Database<Compressed<Latin1>>;

/// Mutable mapping over one LMDB store
///
/// Every read runs in its own read transaction and every write in its own
/// write transaction; writes that overflow the map are retried after the map
/// grows (see [`GrowthPolicy`]). Methods that write take `&mut self`, which
/// keeps an in-place resize from racing a live [`Snapshot`].
///
/// Only one `Database` may be open on a given path within a process; a second
/// open fails with `AlreadyOpen` until the first is closed or dropped.
pub struct Database<C: Codec = Latin1> {
    env: Environment,
    codec: C,
    growth: GrowthPolicy,
}

impl Database<Latin1> {
    /// Open `path` with default options and the given mode.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        OpenOptions::new().mode(mode).open(path)
    }
}

impl<C: Codec> Database<C> {
    pub(crate) fn new(env: Environment, codec: C, growth: GrowthPolicy) -> Self {
        Database { env, codec, growth }
    }

    pub fn path(&self) -> &Path {
        self.env.path()
    }

    pub fn mode(&self) -> OpenMode {
        self.env.mode()
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn growth_policy(&self) -> GrowthPolicy {
        self.growth
    }

    /// Current map size in bytes
    pub fn capacity(&self) -> Result<usize> {
        self.env.capacity()
    }

    /// Enlarge the map. Shrinking is rejected with `InvalidArgument`.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        self.env.set_capacity(capacity)
    }

    pub fn info(&self) -> Result<StoreInfo> {
        Ok(StoreInfo {
            path: self.path().to_path_buf(),
            mode: self.mode(),
            capacity: self.capacity()?,
            entries: self.len()?,
        })
    }

    /// Value stored under `key`, or `KeyNotFound`.
    pub fn get(&self, key: impl Into<C::Key>) -> Result<C::Value> {
        let key = self.codec.encode_key(&key.into())?;
        match self.read_raw(&key)? {
            Some(raw) => self.codec.decode_value(&raw),
            None => Err(Error::KeyNotFound(key)),
        }
    }

    fn read_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.env.read(|txn| Ok(txn.get(key)?.map(<[u8]>::to_vec)))
    }

    pub fn try_get(&self, key: impl Into<C::Key>) -> Result<Option<C::Value>> {
        match self.get(key) {
            Ok(value) => Ok(Some(value)),
            Err(Error::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn get_or(&self, key: impl Into<C::Key>, default: C::Value) -> Result<C::Value> {
        Ok(self.try_get(key)?.unwrap_or(default))
    }

    pub fn contains(&self, key: impl Into<C::Key>) -> Result<bool> {
        let key = self.codec.encode_key(&key.into())?;
        self.env.read(|txn| txn.contains(&key))
    }

    pub fn len(&self) -> Result<usize> {
        self.env.read(|txn| txn.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Insert or overwrite `key`.
    pub fn set(&mut self, key: impl Into<C::Key>, value: impl Into<C::Value>) -> Result<()> {
        let key = self.codec.encode_key(&key.into())?;
        let value = self.codec.encode_value(&value.into())?;
        self.env.ensure_writable()?;
        with_growth(&self.growth, &mut self.env, |env| {
            env.write(|txn| txn.put(&key, &value))
        })
    }

    /// Remove `key`. Removing an absent key is a no-op; the return value
    /// says whether anything was removed.
    pub fn delete(&mut self, key: impl Into<C::Key>) -> Result<bool> {
        let key = self.codec.encode_key(&key.into())?;
        self.env.ensure_writable()?;
        with_growth(&self.growth, &mut self.env, |env| {
            env.write(|txn| txn.delete(&key))
        })
    }

    /// Remove `key` and return its value, if it was present.
    pub fn pop(&mut self, key: impl Into<C::Key>) -> Result<Option<C::Value>> {
        let key = self.codec.encode_key(&key.into())?;
        self.env.ensure_writable()?;
        let raw = with_growth(&self.growth, &mut self.env, |env| {
            env.write(|txn| txn.take(&key))
        })?;
        raw.map(|raw| self.codec.decode_value(&raw)).transpose()
    }

    pub fn pop_or(&mut self, key: impl Into<C::Key>, default: C::Value) -> Result<C::Value> {
        Ok(self.pop(key)?.unwrap_or(default))
    }

    /// Value under `key`; if absent, store `default` and return it.
    ///
    /// A present key is answered from a read transaction, so this works on a
    /// read-only store. The insert rechecks the key inside its write
    /// transaction.
    pub fn get_or_insert(
        &mut self,
        key: impl Into<C::Key>,
        default: impl Into<C::Value>,
    ) -> Result<C::Value> {
        let key = self.codec.encode_key(&key.into())?;
        let default = self.codec.encode_value(&default.into())?;
        if let Some(raw) = self.read_raw(&key)? {
            return self.codec.decode_value(&raw);
        }
        self.env.ensure_writable()?;
        let raw = with_growth(&self.growth, &mut self.env, |env| {
            env.write(|txn| match txn.get(&key)? {
                Some(existing) => Ok(existing.to_vec()),
                None => {
                    txn.put(&key, &default)?;
                    Ok(default.clone())
                }
            })
        })?;
        self.codec.decode_value(&raw)
    }

    /// Remove every entry.
    pub fn clear(&mut self) -> Result<()> {
        self.env.ensure_writable()?;
        with_growth(&self.growth, &mut self.env, |env| env.write(|txn| txn.clear()))
    }

    /// Upsert every `(key, value)` pair in one transaction.
    ///
    /// `pairs` is consumed exactly once, so single-pass iterators are fine
    /// even if the write has to be retried after the map grows.
    pub fn update<I, K, V>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<C::Key>,
        V: Into<C::Value>,
    {
        let mut batch = EncodedPairs::new();
        batch.extend_pairs(&self.codec, pairs)?;
        self.write_batch(batch)
    }

    /// Like `update`, followed by named values written after `pairs`.
    pub fn update_with<'n, I, K, V, N, W>(&mut self, pairs: I, named: N) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<C::Key>,
        V: Into<C::Value>,
        N: IntoIterator<Item = (&'n str, W)>,
        &'n str: Into<C::Key>,
        W: Into<C::Value>,
    {
        let mut batch = EncodedPairs::new();
        batch.extend_pairs(&self.codec, pairs)?;
        batch.extend_pairs(&self.codec, named)?;
        self.write_batch(batch)
    }

    /// Upsert every entry of a key-enumerable source such as a map or
    /// another `Database`.
    pub fn update_from<S>(&mut self, source: &S) -> Result<()>
    where
        S: KeySource + ?Sized,
        S::Key: Into<C::Key>,
        S::Value: Into<C::Value>,
    {
        let mut batch = EncodedPairs::new();
        batch.extend_keyed(&self.codec, source)?;
        self.write_batch(batch)
    }

    fn write_batch(&mut self, batch: EncodedPairs) -> Result<()> {
        self.env.ensure_writable()?;
        if batch.is_empty() {
            return Ok(());
        }
        log::debug!(
            "Writing batch of {} pairs to database ({})",
            batch.len(),
            self.path().display()
        );
        with_growth(&self.growth, &mut self.env, |env| {
            env.write(|txn| batch.apply(txn))
        })
    }

    /// Open a read snapshot for lazy `keys`, `values` and `items` iteration.
    pub fn snapshot(&self) -> Result<Snapshot<'_, C>> {
        Ok(Snapshot::new(self.env.begin_read()?, &self.codec))
    }

    /// All keys, read in one transaction and collected.
    ///
    /// Use [`Snapshot::keys`] through [`Database::snapshot`] to walk the
    /// cursor lazily instead.
    pub fn keys(&self) -> Result<Vec<C::Key>> {
        self.snapshot()?.keys()?.collect()
    }

    /// All values, read in one transaction and collected.
    ///
    /// The lazy form is [`Snapshot::values`].
    pub fn values(&self) -> Result<Vec<C::Value>> {
        self.snapshot()?.values()?.collect()
    }

    /// All entries, read in one transaction and collected.
    ///
    /// The lazy form is [`Snapshot::items`].
    pub fn items(&self) -> Result<Vec<(C::Key, C::Value)>> {
        self.snapshot()?.items()?.collect()
    }

    /// Flush to disk.
    pub fn sync(&self) -> Result<()> {
        self.env.sync()
    }

    /// Release the store. Later operations fail with `Closed`; dropping the
    /// database has the same effect.
    pub fn close(&mut self) -> Result<()> {
        self.env.close()
    }

    pub fn is_open(&self) -> bool {
        self.env.is_open()
    }
}

impl<C: Codec> KeySource for Database<C> {
    type Key = C::Key;
    type Value = C::Value;

    fn source_keys(&self) -> Result<Vec<C::Key>> {
        self.keys()
    }

    fn source_value(&self, key: &C::Key) -> Result<C::Value> {
        let raw_key = self.codec.encode_key(key)?;
        match self.read_raw(&raw_key)? {
            Some(raw) => self.codec.decode_value(&raw),
            None => Err(Error::KeyNotFound(raw_key)),
        }
    }

    /// Every entry from one read transaction.
    fn source_pairs(&self) -> Result<Vec<(C::Key, C::Value)>> {
        self.items()
    }
}

impl<C: Codec + fmt::Debug> fmt::Debug for Database<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Database")
            .field("env", &self.env)
            .field("codec", &self.codec)
            .field("growth", &self.growth)
            .finish()
    }
}
