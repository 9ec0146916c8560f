use heed::types::{Bytes, DecodeIgnore};
use heed::RoIter;

use crate::codec::Codec;
use crate::error::Result;
use crate::transaction::ReadTxn;

/// A consistent read view over a database
///
/// Holds one read transaction for its whole lifetime. Iterators produced by
/// a snapshot borrow it, so they cannot outlive the transaction, and the
/// database cannot be written or resized while the snapshot exists.
pub struct Snapshot<'db, C: Codec> {
    txn: ReadTxn<'db>,
    codec: &'db C,
}

impl<'db, C: Codec> Snapshot<'db, C> {
    pub(crate) fn new(txn: ReadTxn<'db>, codec: &'db C) -> Self {
        Snapshot { txn, codec }
    }

    pub fn len(&self) -> Result<usize> {
        self.txn.len()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn get(&self, key: impl Into<C::Key>) -> Result<Option<C::Value>> {
        let key = self.codec.encode_key(&key.into())?;
        match self.txn.get(&key)? {
            Some(raw) => Ok(Some(self.codec.decode_value(raw)?)),
            None => Ok(None),
        }
    }

    pub fn contains(&self, key: impl Into<C::Key>) -> Result<bool> {
        let key = self.codec.encode_key(&key.into())?;
        self.txn.contains(&key)
    }

    /// Keys in cursor order
    pub fn keys(&self) -> Result<Keys<'_, C>> {
        Ok(Keys {
            iter: self.txn.iter_keys()?,
            codec: self.codec,
        })
    }

    /// Values in key order
    pub fn values(&self) -> Result<Values<'_, C>> {
        Ok(Values {
            iter: self.txn.iter_values()?,
            codec: self.codec,
        })
    }

    /// `(key, value)` pairs in key order
    pub fn items(&self) -> Result<Items<'_, C>> {
        Ok(Items {
            iter: self.txn.iter()?,
            codec: self.codec,
        })
    }
}

/// Lazy decoded keys of a snapshot
pub struct Keys<'txn, C: Codec> {
    iter: RoIter<'txn, Bytes, DecodeIgnore>,
    codec: &'txn C,
}

impl<'txn, C: Codec> Iterator for Keys<'txn, C> {
    type Item = Result<C::Key>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.iter.next()?;
        Some(entry.map_err(Into::into).and_then(|(key, ())| self.codec.decode_key(key)))
    }
}

/// Lazy decoded values of a snapshot
pub struct Values<'txn, C: Codec> {
    iter: RoIter<'txn, DecodeIgnore, Bytes>,
    codec: &'txn C,
}

impl<'txn, C: Codec> Iterator for Values<'txn, C> {
    type Item = Result<C::Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.iter.next()?;
        Some(entry.map_err(Into::into).and_then(|((), value)| self.codec.decode_value(value)))
    }
}

/// Lazy decoded entries of a snapshot
pub struct Items<'txn, C: Codec> {
    iter: RoIter<'txn, Bytes, Bytes>,
    codec: &'txn C,
}

impl<'txn, C: Codec> Iterator for Items<'txn, C> {
    type Item = Result<(C::Key, C::Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.iter.next()?;
        Some(entry.map_err(Into::into).and_then(|(key, value)| {
            Ok((self.codec.decode_key(key)?, self.codec.decode_value(value)?))
        }))
    }
}
