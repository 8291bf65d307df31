use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Owned bytes that encode as unpadded URL-safe base64
///
/// Key material and JWT segments are both carried in this form.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
#[must_use]
pub struct Base64Url(Vec<u8>);

impl Base64Url {
    /// Wraps raw bytes
    #[inline]
    pub fn from_raw(raw: impl Into<Vec<u8>>) -> Self {
        Self(raw.into())
    }

    /// Decodes unpadded URL-safe base64
    ///
    /// # Errors
    ///
    /// The input contains characters outside of the URL-safe alphabet,
    /// has an impossible length, or carries padding.
    pub fn from_encoded(enc: impl AsRef<[u8]>) -> Result<Self, base64::DecodeError> {
        URL_SAFE_NO_PAD.decode(enc).map(Self)
    }

    /// The decoded bytes
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the wrapper, returning the decoded bytes
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    /// The length of the encoded representation
    #[inline]
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        Self::calc_encoded_len(self.0.len())
    }

    /// The length of the encoded representation of `len` raw bytes
    #[inline]
    #[must_use]
    pub const fn calc_encoded_len(len: usize) -> usize {
        (len * 4 + 2) / 3
    }
}

impl From<Vec<u8>> for Base64Url {
    #[inline]
    fn from(raw: Vec<u8>) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(&self.0))
    }
}

impl fmt::Debug for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Base64Url({})", self)
    }
}

impl Serialize for Base64Url {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&URL_SAFE_NO_PAD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Base64Url {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_encoded(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}
