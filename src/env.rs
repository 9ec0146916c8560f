use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use heed::{Env, EnvOpenOptions};
use log::{debug, warn};
use once_cell::sync::Lazy;

use crate::codec::{Codec, Latin1};
use crate::constants::{
    align_map_size, EnvFlags, DATA_FILE, DEFAULT_DIR_MODE, DEFAULT_MAP_SIZE, LOCK_FILE,
};
use crate::database::Database;
use crate::error::{Error, Result};
use crate::growth::{Growable, GrowthPolicy};
use crate::transaction::{RawDatabase, ReadTxn, WriteTxn};
use crate::types::OpenMode;

/// Options for opening a store
#[derive(Debug, Clone)]
pub struct OpenOptions {
    mode: OpenMode,
    map_size: usize,
    growth: GrowthPolicy,
    max_readers: Option<u32>,
    flags: EnvFlags,
    dir_mode: u32,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions {
            mode: OpenMode::default(),
            map_size: DEFAULT_MAP_SIZE,
            growth: GrowthPolicy::default(),
            max_readers: None,
            flags: EnvFlags::empty(),
            dir_mode: DEFAULT_DIR_MODE,
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        OpenOptions::default()
    }

    pub fn mode(&mut self, mode: OpenMode) -> &mut Self {
        self.mode = mode;
        self
    }

    /// Initial map size in bytes, rounded up to a 64 KiB multiple
    pub fn map_size(&mut self, size: usize) -> &mut Self {
        self.map_size = size;
        self
    }

    /// Grow the map automatically when a write does not fit.
    ///
    /// Disable this when several processes write to the same store: the
    /// resize is not coordinated across processes.
    pub fn autogrow(&mut self, autogrow: bool) -> &mut Self {
        self.growth.autogrow = autogrow;
        self
    }

    pub fn max_attempts(&mut self, attempts: u32) -> &mut Self {
        self.growth.max_attempts = attempts;
        self
    }

    pub fn growth_factor(&mut self, factor: usize) -> &mut Self {
        self.growth.factor = factor;
        self
    }

    pub fn max_readers(&mut self, readers: u32) -> &mut Self {
        self.max_readers = Some(readers);
        self
    }

    pub fn flags(&mut self, flags: EnvFlags) -> &mut Self {
        self.flags = flags;
        self
    }

    /// Permission bits for a directory created by `c` or `n`
    pub fn dir_mode(&mut self, mode: u32) -> &mut Self {
        self.dir_mode = mode;
        self
    }

    pub fn growth_policy(&self) -> GrowthPolicy {
        self.growth
    }

    /// Open with the base Latin-1 codec.
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Database<Latin1>> {
        self.open_with(path, Latin1)
    }

    /// Open with a custom codec.
    pub fn open_with<P: AsRef<Path>, C: Codec>(&self, path: P, codec: C) -> Result<Database<C>> {
        self.growth.validate()?;
        let env = Environment::open(path.as_ref(), self)?;
        Ok(Database::new(env, codec, self.growth))
    }
}

/// Canonical paths of the stores open in this process
///
/// The engine hands out a shared handle when a path is opened twice, which
/// would let one `Database` wipe or block on another's files.
static OPEN_STORES: Lazy<Mutex<HashSet<PathBuf>>> = Lazy::new(|| Mutex::new(HashSet::new()));

fn open_stores() -> MutexGuard<'static, HashSet<PathBuf>> {
    OPEN_STORES.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How long `close` waits for the engine to release the environment
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

struct Inner {
    env: Env,
    db: RawDatabase,
    canonical: PathBuf,
}

/// Store handle: one open LMDB environment and its main database
pub struct Environment {
    path: PathBuf,
    mode: OpenMode,
    inner: Option<Inner>,
}

impl Environment {
    /// Open the environment at `path` according to `options`
    pub(crate) fn open(path: &Path, options: &OpenOptions) -> Result<Self> {
        let map_size = match align_map_size(options.map_size) {
            Some(0) | None => {
                return Err(Error::InvalidArgument(format!(
                    "invalid map size {}",
                    options.map_size
                )))
            }
            Some(size) => size,
        };

        // Held until the new path is registered, so two threads cannot both
        // pass the check for the same store.
        let mut registry = open_stores();
        if path.exists() {
            let canonical = fs::canonicalize(path)?;
            if registry.contains(&canonical) {
                return Err(Error::AlreadyOpen(path.to_path_buf()));
            }
        }

        match options.mode {
            OpenMode::ReadOnly | OpenMode::ReadWriteExisting => {
                if !path.join(DATA_FILE).is_file() {
                    return Err(Error::StoreNotFound(path.to_path_buf()));
                }
            }
            OpenMode::CreateIfAbsent => create_dir(path, options.dir_mode)?,
            OpenMode::RecreateFresh => {
                remove(path, true)?;
                create_dir(path, options.dir_mode)?;
            }
        }
        let canonical = fs::canonicalize(path)?;

        let mut flags = options.flags.to_engine();
        if !options.mode.is_writable() {
            flags |= heed::EnvFlags::READ_ONLY;
        }

        let mut builder = EnvOpenOptions::new();
        builder.map_size(map_size).max_dbs(1);
        if let Some(readers) = options.max_readers {
            builder.max_readers(readers);
        }
        // SAFETY: the environment is opened once per `Environment` and every
        // transaction borrows it, so it cannot be closed while in use.
        let env = unsafe {
            builder.flags(flags);
            builder.open(path)?
        };

        let db = if options.mode.is_writable() {
            let mut wtxn = env.write_txn()?;
            let db: RawDatabase = env.create_database(&mut wtxn, None)?;
            wtxn.commit()?;
            db
        } else {
            let rtxn = env.read_txn()?;
            let db: Option<RawDatabase> = env.open_database(&rtxn, None)?;
            drop(rtxn);
            db.ok_or_else(|| Error::StoreNotFound(path.to_path_buf()))?
        };

        debug!(
            "Opened database ({}) with flag {} and map size {}",
            path.display(),
            options.mode,
            map_size
        );

        registry.insert(canonical.clone());
        Ok(Environment {
            path: path.to_path_buf(),
            mode: options.mode,
            inner: Some(Inner { env, db, canonical }),
        })
    }

    fn inner(&self) -> Result<&Inner> {
        self.inner.as_ref().ok_or(Error::Closed)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    pub(crate) fn begin_read(&self) -> Result<ReadTxn<'_>> {
        let inner = self.inner()?;
        Ok(ReadTxn::new(inner.env.read_txn()?, inner.db))
    }

    pub(crate) fn begin_write(&self) -> Result<WriteTxn<'_>> {
        let inner = self.inner()?;
        self.ensure_writable()?;
        Ok(WriteTxn::new(inner.env.write_txn()?, inner.db))
    }

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        if self.mode.is_writable() {
            Ok(())
        } else {
            Err(Error::PermissionDenied(self.path.clone()))
        }
    }

    /// Run `f` inside one read transaction.
    pub(crate) fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ReadTxn<'_>) -> Result<T>,
    {
        let txn = self.begin_read()?;
        f(&txn)
    }

    /// Run `f` inside one write transaction, committing only if it succeeds.
    pub(crate) fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut WriteTxn<'_>) -> Result<T>,
    {
        let mut txn = self.begin_write()?;
        let out = f(&mut txn)?;
        txn.commit()?;
        Ok(out)
    }

    /// Flush buffers to disk, even when opened with `NOSYNC`
    pub fn sync(&self) -> Result<()> {
        Ok(self.inner()?.env.force_sync()?)
    }

    /// Release the environment. Later calls on this handle fail with `Closed`.
    ///
    /// Waits a bounded time for the engine to finish closing, so the path can
    /// be reopened right away.
    pub fn close(&mut self) -> Result<()> {
        if let Some(inner) = self.release() {
            if !inner.env.prepare_for_closing().wait_timeout(CLOSE_TIMEOUT) {
                warn!(
                    "Database ({}) still in use after {:?}",
                    self.path.display(),
                    CLOSE_TIMEOUT
                );
            }
            debug!("Closed database ({})", self.path.display());
        }
        Ok(())
    }

    /// Detach the engine handle and unregister the path.
    fn release(&mut self) -> Option<Inner> {
        let inner = self.inner.take()?;
        open_stores().remove(&inner.canonical);
        Some(inner)
    }
}

impl Growable for Environment {
    fn path(&self) -> &Path {
        &self.path
    }

    fn capacity(&self) -> Result<usize> {
        Ok(self.inner()?.env.info().map_size)
    }

    fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        let current = self.capacity()?;
        let capacity = align_map_size(capacity)
            .ok_or_else(|| Error::InvalidArgument(format!("invalid map size {}", capacity)))?;
        if capacity < current {
            return Err(Error::InvalidArgument(format!(
                "map size can only grow ({} < {})",
                capacity, current
            )));
        }
        let inner = self.inner()?;
        // SAFETY: `&mut self` guarantees no transaction on this environment
        // is alive in this process.
        unsafe { inner.env.resize(capacity)? };
        Ok(())
    }

    fn refresh_capacity(&mut self) -> Result<()> {
        let inner = self.inner()?;
        // SAFETY: as above; a size of zero adopts the size already on disk.
        unsafe { inner.env.resize(0)? };
        Ok(())
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        // Dropping the last engine handle closes it; never block here.
        drop(self.release());
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Environment")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("open", &self.is_open())
            .finish()
    }
}

fn create_dir(path: &Path, mode: u32) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(path)?;
    Ok(())
}

/// Delete a store's data file, lock file and directory, in that order.
///
/// With `missing_ok`, each artifact that is already gone is skipped; otherwise
/// the first absent one is reported as `MissingArtifact`.
pub fn remove<P: AsRef<Path>>(path: P, missing_ok: bool) -> Result<()> {
    let base = path.as_ref();

    for file in [DATA_FILE, LOCK_FILE] {
        let target = base.join(file);
        tolerate_missing(fs::remove_file(&target), &target, missing_ok)?;
    }
    tolerate_missing(fs::remove_dir(base), base, missing_ok)?;

    debug!("Removed database ({})", base.display());
    Ok(())
}

fn tolerate_missing(result: io::Result<()>, target: &Path, missing_ok: bool) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if missing_ok {
                Ok(())
            } else {
                Err(Error::MissingArtifact(target.to_path_buf()))
            }
        }
        Err(e) => Err(Error::Io(e)),
    }
}
