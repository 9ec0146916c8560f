use bitflags::bitflags;

// Engine options accepted by `OpenOptions::flags`
bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EnvFlags: u32 {
        const NOSYNC = 0x10000;
        const NOMETASYNC = 0x40000;
        const WRITEMAP = 0x80000;
        const MAPASYNC = 0x100000;
        const NOLOCK = 0x400000;
        const NORDAHEAD = 0x800000;
        const NOMEMINIT = 0x1000000;
    }
}

impl EnvFlags {
    /// Translate into the engine's flag set.
    pub(crate) fn to_engine(self) -> heed::EnvFlags {
        let mut flags = heed::EnvFlags::empty();
        if self.contains(EnvFlags::NOSYNC) {
            flags |= heed::EnvFlags::NO_SYNC;
        }
        if self.contains(EnvFlags::NOMETASYNC) {
            flags |= heed::EnvFlags::NO_META_SYNC;
        }
        if self.contains(EnvFlags::WRITEMAP) {
            flags |= heed::EnvFlags::WRITE_MAP;
        }
        if self.contains(EnvFlags::MAPASYNC) {
            flags |= heed::EnvFlags::MAP_ASYNC;
        }
        if self.contains(EnvFlags::NOLOCK) {
            flags |= heed::EnvFlags::NO_LOCK;
        }
        if self.contains(EnvFlags::NORDAHEAD) {
            flags |= heed::EnvFlags::NO_READ_AHEAD;
        }
        if self.contains(EnvFlags::NOMEMINIT) {
            flags |= heed::EnvFlags::NO_MEM_INIT;
        }
        flags
    }
}

/// Name of the primary data file inside a store directory
pub const DATA_FILE: &str = "data.mdb";
/// Name of the lock file inside a store directory
pub const LOCK_FILE: &str = "lock.mdb";

/// Initial map size (1 MiB)
pub const DEFAULT_MAP_SIZE: usize = 1 << 20;
/// Map sizes are rounded up to this multiple, which covers 4K, 16K and 64K OS pages
pub const MAP_SIZE_ALIGNMENT: usize = 64 * 1024;
/// Attempts made by the growth executor before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 12;
/// Multiplier applied to the map size on each growth
pub const DEFAULT_GROWTH_FACTOR: usize = 2;
/// Permission bits for a freshly created store directory
pub const DEFAULT_DIR_MODE: u32 = 0o755;
/// zstd level used by the compressing codec
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 9;

/// Round a requested map size up to the next multiple of `MAP_SIZE_ALIGNMENT`.
pub(crate) fn align_map_size(size: usize) -> Option<usize> {
    let rem = size % MAP_SIZE_ALIGNMENT;
    if rem == 0 {
        Some(size)
    } else {
        size.checked_add(MAP_SIZE_ALIGNMENT - rem)
    }
}
