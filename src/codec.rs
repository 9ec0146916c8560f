//! Encode/decode hooks applied at the mapping boundary.
//!
//! A `Database` never sees application types directly: every key and value
//! passes through a [`Codec`] on the way in and on the way out. The base
//! codec is [`Latin1`]; [`Compressed`] wraps any codec and compresses the
//! encoded value bytes while leaving keys alone.

use crate::constants::DEFAULT_COMPRESSION_LEVEL;
use crate::error::{Error, Result};
use crate::value::Datum;

/// Four-hook transform between application values and stored bytes
///
/// `decode_key(encode_key(k))` and `decode_value(encode_value(v))` must give
/// back a value equal to the input for everything a codec accepts.
pub trait Codec {
    type Key;
    type Value;

    fn encode_key(&self, key: &Self::Key) -> Result<Vec<u8>>;
    fn decode_key(&self, raw: &[u8]) -> Result<Self::Key>;
    fn encode_value(&self, value: &Self::Value) -> Result<Vec<u8>>;
    fn decode_value(&self, raw: &[u8]) -> Result<Self::Value>;
}

/// Base codec: bytes unchanged, text as Latin-1
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latin1;

impl Codec for Latin1 {
    type Key = Datum;
    type Value = Datum;

    fn encode_key(&self, key: &Datum) -> Result<Vec<u8>> {
        key.to_bytes()
    }

    fn decode_key(&self, raw: &[u8]) -> Result<Datum> {
        Ok(Datum::Bytes(raw.to_vec()))
    }

    fn encode_value(&self, value: &Datum) -> Result<Vec<u8>> {
        value.to_bytes()
    }

    fn decode_value(&self, raw: &[u8]) -> Result<Datum> {
        Ok(Datum::Bytes(raw.to_vec()))
    }
}

/// zstd-compressing specialization of an inner codec
///
/// Values are stored as zstd frames. Stores whose values were written as
/// gzip streams are not readable through this codec: decoding them fails
/// with `Error::Codec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compressed<C = Latin1> {
    inner: C,
    level: i32,
}

impl Compressed<Latin1> {
    pub fn new(level: i32) -> Self {
        Compressed::wrap(Latin1, level)
    }
}

impl Default for Compressed<Latin1> {
    fn default() -> Self {
        Compressed::new(DEFAULT_COMPRESSION_LEVEL)
    }
}

impl<C> Compressed<C> {
    pub fn wrap(inner: C, level: i32) -> Self {
        Compressed { inner, level }
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: Codec> Codec for Compressed<C> {
    type Key = C::Key;
    type Value = C::Value;

    fn encode_key(&self, key: &C::Key) -> Result<Vec<u8>> {
        self.inner.encode_key(key)
    }

    fn decode_key(&self, raw: &[u8]) -> Result<C::Key> {
        self.inner.decode_key(raw)
    }

    fn encode_value(&self, value: &C::Value) -> Result<Vec<u8>> {
        let plain = self.inner.encode_value(value)?;
        zstd::encode_all(&plain[..], self.level)
            .map_err(|e| Error::Codec(format!("zstd encode: {}", e)))
    }

    fn decode_value(&self, raw: &[u8]) -> Result<C::Value> {
        let plain =
            zstd::decode_all(raw).map_err(|e| Error::Codec(format!("zstd decode: {}", e)))?;
        self.inner.decode_value(&plain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_latin1_passthrough() {
        let codec = Latin1;
        let raw = codec.encode_value(&Datum::from(b"\x00\xffraw")).unwrap();
        assert_eq!(raw, b"\x00\xffraw");
        assert_eq!(codec.decode_value(&raw).unwrap(), Datum::from(b"\x00\xffraw"));
        assert_eq!(codec.encode_key(&Datum::from("key")).unwrap(), b"key");
    }

    #[test]
    fn test_gzip_payload_is_rejected() {
        // gzip stream of "hello" as written by `gzip -9`
        let gzip = [
            0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x03, 0xcb, 0x48, 0xcd, 0xc9,
            0xc9, 0x07, 0x00, 0x86, 0xa6, 0x10, 0x36, 0x05, 0x00, 0x00, 0x00,
        ];
        let err = Compressed::default().decode_value(&gzip).unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
    }

    #[test]
    fn test_latin1_rejects_wide_text() {
        let err = Latin1.encode_key(&Datum::from("\u{1F600}")).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch(_)));
    }

    #[test]
    fn test_compressed_leaves_keys_alone() {
        let codec = Compressed::default();
        let key = codec.encode_key(&Datum::from("k")).unwrap();
        assert_eq!(key, b"k");
        assert_eq!(codec.level(), DEFAULT_COMPRESSION_LEVEL);
    }

    #[test]
    fn test_compressed_shrinks_repetitive_values() {
        let codec = Compressed::default();
        let value = Datum::from(b"asd".repeat(1000));
        let raw = codec.encode_value(&value).unwrap();
        assert!(raw.len() < 3000);
        assert_eq!(codec.decode_value(&raw).unwrap(), value);
    }

    #[test]
    fn test_compressed_rejects_garbage() {
        let err = Compressed::default().decode_value(b"not zstd").unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
    }

    proptest! {
        #[test]
        fn prop_compressed_roundtrip(bytes in proptest::collection::vec(any::<u8>(), 0..4096), level in 1i32..=19) {
            let codec = Compressed::new(level);
            let value = Datum::from(bytes);
            let raw = codec.encode_value(&value).unwrap();
            prop_assert_eq!(codec.decode_value(&raw).unwrap(), value);
        }

        #[test]
        fn prop_compressed_text_roundtrip(text in "[\\x00-\\xff]{0,512}") {
            let codec = Compressed::default();
            let raw = codec.encode_value(&Datum::from(text.as_str())).unwrap();
            prop_assert_eq!(codec.decode_value(&raw).unwrap().decode_text(), text);
        }
    }
}
