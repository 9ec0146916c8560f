//! Retry a write after enlarging the memory map.
//!
//! LMDB rejects a write that does not fit in the current map with
//! `MDB_MAP_FULL`. Because the failed write transaction never commits, the
//! same attempt can be replayed once the map has been enlarged.

use std::path::Path;

use log::{debug, info, warn};

use crate::constants::{DEFAULT_GROWTH_FACTOR, DEFAULT_MAX_ATTEMPTS};
use crate::error::{Error, Result};

/// When and how far to grow the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthPolicy {
    /// Grow automatically; when false `CapacityExceeded` is returned as is
    pub autogrow: bool,
    /// Full-map failures tolerated before giving up with `GrowthExhausted`
    pub max_attempts: u32,
    /// Multiplier applied to the current map size
    pub factor: usize,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        GrowthPolicy {
            autogrow: true,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            factor: DEFAULT_GROWTH_FACTOR,
        }
    }
}

impl GrowthPolicy {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::InvalidArgument("max_attempts must be at least 1".into()));
        }
        if self.factor < 2 {
            return Err(Error::InvalidArgument("growth factor must be at least 2".into()));
        }
        Ok(())
    }
}

/// A store whose map size can be enlarged in place
pub trait Growable {
    fn path(&self) -> &Path;
    fn capacity(&self) -> Result<usize>;
    fn set_capacity(&mut self, capacity: usize) -> Result<()>;
    /// Adopt a map size set by another process.
    fn refresh_capacity(&mut self) -> Result<()>;
}

/// Run `attempt` until it stops reporting a full map.
///
/// `attempt` must perform exactly one write transaction and must be
/// replayable: everything it writes has to be prepared before the first call.
///
/// Only `CapacityExceeded` failures count towards `max_attempts`. Refreshes
/// after `MapResized` have their own budget of the same size; running out of
/// it returns `MapResized` rather than `GrowthExhausted`.
pub fn with_growth<S, T, F>(policy: &GrowthPolicy, store: &mut S, mut attempt: F) -> Result<T>
where
    S: Growable + ?Sized,
    F: FnMut(&S) -> Result<T>,
{
    let mut full = 0;
    let mut refreshed = 0;
    loop {
        match attempt(store) {
            Err(Error::CapacityExceeded) if !policy.autogrow => {
                warn!(
                    "Database ({}) is full and autogrow is disabled",
                    store.path().display()
                );
                return Err(Error::CapacityExceeded);
            }
            Err(Error::CapacityExceeded) => {
                full += 1;
                let exhausted = || Error::GrowthExhausted {
                    path: store.path().to_path_buf(),
                    attempts: full,
                };
                if full >= policy.max_attempts {
                    return Err(exhausted());
                }
                let grown = store
                    .capacity()?
                    .checked_mul(policy.factor)
                    .ok_or_else(exhausted)?;
                store.set_capacity(grown)?;
                info!(
                    "Grew database ({}) map size to {}",
                    store.path().display(),
                    grown
                );
            }
            Err(Error::MapResized) => {
                refreshed += 1;
                if refreshed > policy.max_attempts {
                    return Err(Error::MapResized);
                }
                store.refresh_capacity()?;
                debug!(
                    "Database ({}) was resized by another process, retrying",
                    store.path().display()
                );
            }
            other => return other,
        }
    }
}
