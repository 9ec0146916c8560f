use heed::types::{Bytes, DecodeIgnore};
use heed::{RoIter, RoTxn, RwTxn};

use crate::error::Result;

pub(crate) type RawDatabase = heed::Database<Bytes, Bytes>;

/// Read transaction over the main database
///
/// Never mutates. Dropping it releases the reader slot.
pub(crate) struct ReadTxn<'env> {
    txn: RoTxn<'env>,
    db: RawDatabase,
}

impl<'env> ReadTxn<'env> {
    pub(crate) fn new(txn: RoTxn<'env>, db: RawDatabase) -> Self {
        ReadTxn { txn, db }
    }

    pub(crate) fn get(&self, key: &[u8]) -> Result<Option<&[u8]>> {
        Ok(self.db.get(&self.txn, key)?)
    }

    pub(crate) fn contains(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    pub(crate) fn len(&self) -> Result<usize> {
        Ok(self.db.len(&self.txn)? as usize)
    }

    /// Forward cursor over all entries in key order
    pub(crate) fn iter(&self) -> Result<RoIter<'_, Bytes, Bytes>> {
        Ok(self.db.iter(&self.txn)?)
    }

    /// Forward cursor that skips decoding values
    pub(crate) fn iter_keys(&self) -> Result<RoIter<'_, Bytes, DecodeIgnore>> {
        Ok(self.db.iter(&self.txn)?.remap_data_type::<DecodeIgnore>())
    }

    /// Forward cursor that skips decoding keys
    pub(crate) fn iter_values(&self) -> Result<RoIter<'_, DecodeIgnore, Bytes>> {
        Ok(self.db.iter(&self.txn)?.remap_key_type::<DecodeIgnore>())
    }
}

/// Write transaction over the main database
///
/// Effects become visible only through `commit`. A `WriteTxn` dropped
/// without committing is aborted by the engine, so an error returned
/// half-way through an operation leaves the store untouched.
pub(crate) struct WriteTxn<'env> {
    txn: RwTxn<'env>,
    db: RawDatabase,
}

impl<'env> WriteTxn<'env> {
    pub(crate) fn new(txn: RwTxn<'env>, db: RawDatabase) -> Self {
        WriteTxn { txn, db }
    }

    pub(crate) fn get(&self, key: &[u8]) -> Result<Option<&[u8]>> {
        Ok(self.db.get(&self.txn, key)?)
    }

    pub(crate) fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        Ok(self.db.put(&mut self.txn, key, value)?)
    }

    /// Upsert every pair inside this transaction.
    pub(crate) fn put_multi(&mut self, pairs: &[(Vec<u8>, Vec<u8>)]) -> Result<()> {
        for (key, value) in pairs {
            self.db.put(&mut self.txn, key.as_slice(), value.as_slice())?;
        }
        Ok(())
    }

    /// Returns whether the key existed.
    pub(crate) fn delete(&mut self, key: &[u8]) -> Result<bool> {
        Ok(self.db.delete(&mut self.txn, key)?)
    }

    /// Remove the key and hand back its previous value.
    pub(crate) fn take(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let previous = self.get(key)?.map(<[u8]>::to_vec);
        if previous.is_some() {
            self.delete(key)?;
        }
        Ok(previous)
    }

    pub(crate) fn clear(&mut self) -> Result<()> {
        Ok(self.db.clear(&mut self.txn)?)
    }

    pub(crate) fn commit(self) -> Result<()> {
        Ok(self.txn.commit()?)
    }
}
