//! Normalization of update sources into one replayable list of encoded pairs.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use crate::codec::Codec;
use crate::error::Result;
use crate::transaction::WriteTxn;

/// Anything that can enumerate its keys and look each one up
pub trait KeySource {
    type Key;
    type Value;

    fn source_keys(&self) -> Result<Vec<Self::Key>>;
    fn source_value(&self, key: &Self::Key) -> Result<Self::Value>;

    /// Every `(key, value)` pair. Sources that can read all entries at once
    /// should override this to give a consistent view.
    fn source_pairs(&self) -> Result<Vec<(Self::Key, Self::Value)>> {
        self.source_keys()?
            .into_iter()
            .map(|key| {
                let value = self.source_value(&key)?;
                Ok((key, value))
            })
            .collect()
    }
}

impl<K, V, S> KeySource for HashMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher,
{
    type Key = K;
    type Value = V;

    fn source_keys(&self) -> Result<Vec<K>> {
        Ok(self.keys().cloned().collect())
    }

    fn source_value(&self, key: &K) -> Result<V> {
        Ok(self[key].clone())
    }
}

impl<K, V> KeySource for BTreeMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    type Key = K;
    type Value = V;

    fn source_keys(&self) -> Result<Vec<K>> {
        Ok(self.keys().cloned().collect())
    }

    fn source_value(&self, key: &K) -> Result<V> {
        Ok(self[key].clone())
    }
}

/// Encoded `(key, value)` pairs, materialized once before any transaction
///
/// The growth executor may replay a batch several times; replaying this list
/// instead of the caller's source keeps single-pass iterators safe.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct EncodedPairs {
    pairs: Vec<(Vec<u8>, Vec<u8>)>,
}

impl EncodedPairs {
    pub(crate) fn new() -> Self {
        EncodedPairs::default()
    }

    pub(crate) fn push<C: Codec>(&mut self, codec: &C, key: &C::Key, value: &C::Value) -> Result<()> {
        let key = codec.encode_key(key)?;
        let value = codec.encode_value(value)?;
        self.pairs.push((key, value));
        Ok(())
    }

    /// Consume an iterable of pairs.
    pub(crate) fn extend_pairs<C, I, K, V>(&mut self, codec: &C, source: I) -> Result<()>
    where
        C: Codec,
        I: IntoIterator<Item = (K, V)>,
        K: Into<C::Key>,
        V: Into<C::Value>,
    {
        let iter = source.into_iter();
        self.pairs.reserve(iter.size_hint().0);
        for (key, value) in iter {
            self.push(codec, &key.into(), &value.into())?;
        }
        Ok(())
    }

    /// Take every entry of a key-enumerable source.
    pub(crate) fn extend_keyed<C, S>(&mut self, codec: &C, source: &S) -> Result<()>
    where
        C: Codec,
        S: KeySource + ?Sized,
        S::Key: Into<C::Key>,
        S::Value: Into<C::Value>,
    {
        self.extend_pairs(codec, source.source_pairs()?)
    }

    pub(crate) fn len(&self) -> usize {
        self.pairs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Upsert every pair in `txn`.
    pub(crate) fn apply(&self, txn: &mut WriteTxn<'_>) -> Result<()> {
        txn.put_multi(&self.pairs)
    }

    #[cfg(test)]
    fn pairs(&self) -> &[(Vec<u8>, Vec<u8>)] {
        &self.pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Compressed, Latin1};
    use crate::error::Error;
    use crate::value::Datum;

    #[test]
    fn test_single_pass_source_is_materialized() {
        let mut produced = 0;
        let source = std::iter::from_fn(|| {
            produced += 1;
            if produced <= 3 {
                Some((format!("key_{}", produced), vec![produced as u8]))
            } else {
                None
            }
        });

        let mut pairs = EncodedPairs::new();
        pairs.extend_pairs(&Latin1, source).unwrap();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.pairs()[0], (b"key_1".to_vec(), vec![1]));
        assert_eq!(pairs.pairs()[2], (b"key_3".to_vec(), vec![3]));
    }

    #[test]
    fn test_named_values_follow_positional() {
        let mut pairs = EncodedPairs::new();
        pairs.extend_pairs(&Latin1, vec![("b", "2")]).unwrap();
        pairs.extend_pairs(&Latin1, [("a", "1")]).unwrap();
        let keys: Vec<&[u8]> = pairs.pairs().iter().map(|(k, _)| k.as_slice()).collect();
        assert_eq!(keys, vec![&b"b"[..], &b"a"[..]]);
    }

    #[test]
    fn test_keyed_source() {
        let mut source = BTreeMap::new();
        source.insert("x".to_string(), "10".to_string());
        source.insert("y".to_string(), "20".to_string());

        let mut pairs = EncodedPairs::new();
        pairs.extend_keyed(&Latin1, &source).unwrap();
        assert_eq!(
            pairs.pairs(),
            &[
                (b"x".to_vec(), b"10".to_vec()),
                (b"y".to_vec(), b"20".to_vec())
            ]
        );
    }

    /// Serves every entry at once and refuses per-key lookups.
    struct WholeView(Vec<(&'static str, &'static str)>);

    impl KeySource for WholeView {
        type Key = &'static str;
        type Value = &'static str;

        fn source_keys(&self) -> Result<Vec<&'static str>> {
            Ok(self.0.iter().map(|(k, _)| *k).collect())
        }

        fn source_value(&self, key: &&'static str) -> Result<&'static str> {
            Err(Error::KeyNotFound(key.as_bytes().to_vec()))
        }

        fn source_pairs(&self) -> Result<Vec<(&'static str, &'static str)>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_keyed_source_reads_all_pairs_at_once() {
        let source = WholeView(vec![("k1", "v1"), ("k2", "v2")]);
        let mut pairs = EncodedPairs::new();
        pairs.extend_keyed(&Latin1, &source).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs.pairs()[1], (b"k2".to_vec(), b"v2".to_vec()));
    }

    #[test]
    fn test_values_are_encoded_by_codec() {
        let codec = Compressed::default();
        let mut pairs = EncodedPairs::new();
        pairs.extend_pairs(&codec, [("k", Datum::from(b"v".repeat(100)))]).unwrap();
        let (key, value) = &pairs.pairs()[0];
        assert_eq!(key, b"k");
        assert_eq!(codec.decode_value(value).unwrap(), Datum::from(b"v".repeat(100)));
    }

    #[test]
    fn test_encoding_failure_stops_batch() {
        let mut pairs = EncodedPairs::new();
        let err = pairs
            .extend_pairs(&Latin1, [("ok", "1"), ("\u{263a}", "2")])
            .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }
}
