use crate::error::{Error, Result};

/// Application value understood by the base codec
///
/// Bytes pass through unchanged; text is stored one byte per character
/// (Latin-1). Values read back from a store are always `Bytes`. Equality
/// compares the stored representation, so `Datum::from("a") == Datum::from(b"a")`.
#[derive(Debug, Clone)]
pub enum Datum {
    Bytes(Vec<u8>),
    Text(String),
}

impl Datum {
    /// Encode to the byte form written to the store.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Datum::Bytes(bytes) => Ok(bytes.clone()),
            Datum::Text(text) => encode_latin1(text),
        }
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Datum::Bytes(bytes) => Ok(bytes),
            Datum::Text(text) => encode_latin1(&text),
        }
    }

    /// Interpret the datum as Latin-1 text.
    pub fn decode_text(&self) -> String {
        match self {
            Datum::Bytes(bytes) => decode_latin1(bytes),
            Datum::Text(text) => text.clone(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Datum::Bytes(bytes) => bytes.len(),
            Datum::Text(text) => text.chars().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub(crate) fn encode_latin1(text: &str) -> Result<Vec<u8>> {
    text.chars()
        .map(|c| {
            u8::try_from(c).map_err(|_| {
                Error::TypeMismatch(format!("{:?} is not representable as Latin-1", c))
            })
        })
        .collect()
}

pub(crate) fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

impl PartialEq for Datum {
    fn eq(&self, other: &Datum) -> bool {
        match (self, other) {
            (Datum::Bytes(a), Datum::Bytes(b)) => a == b,
            (Datum::Text(a), Datum::Text(b)) => a == b,
            (Datum::Bytes(bytes), Datum::Text(text)) | (Datum::Text(text), Datum::Bytes(bytes)) => {
                text.chars().count() == bytes.len()
                    && text.chars().zip(bytes).all(|(c, &b)| c == char::from(b))
            }
        }
    }
}

impl Eq for Datum {}

impl From<Vec<u8>> for Datum {
    fn from(bytes: Vec<u8>) -> Self {
        Datum::Bytes(bytes)
    }
}

impl From<&[u8]> for Datum {
    fn from(bytes: &[u8]) -> Self {
        Datum::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Datum {
    fn from(bytes: &[u8; N]) -> Self {
        Datum::Bytes(bytes.to_vec())
    }
}

impl From<String> for Datum {
    fn from(text: String) -> Self {
        Datum::Text(text)
    }
}

impl From<&str> for Datum {
    fn from(text: &str) -> Self {
        Datum::Text(text.to_owned())
    }
}

impl From<&String> for Datum {
    fn from(text: &String) -> Self {
        Datum::Text(text.clone())
    }
}
