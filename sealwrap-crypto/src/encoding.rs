//! Base64 helpers shared by the wire types.
//!
//! Everything is emitted with the standard alphabet. Decoding also accepts
//! the URL-safe alphabet, with or without padding, because both appear on
//! the wire.

use crate::error::{CryptoError, CryptoResult};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};

/// Encodes bytes with the standard base64 alphabet.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes standard or URL-safe base64, padded or not.
pub fn decode(text: &str) -> CryptoResult<Vec<u8>> {
    let text = text.trim();
    let engine = if text.contains(['-', '_']) {
        if text.ends_with('=') { URL_SAFE } else { URL_SAFE_NO_PAD }
    } else if text.ends_with('=') || text.len() % 4 == 0 {
        STANDARD
    } else {
        STANDARD_NO_PAD
    };
    engine
        .decode(text)
        .map_err(|e| CryptoError::Encoding(format!("invalid base64: {e}")))
}

/// `#[serde(with = "...")]` adapter for `Vec<u8>` fields carried as base64.
pub mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::decode(&text).map_err(de::Error::custom)
    }
}

/// `#[serde(with = "...")]` adapter for nullable base64 fields.
pub mod base64_option {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_some(&super::encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => super::decode(&text).map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_both_alphabets() {
        let bytes = [0xfbu8, 0xff, 0xbf, 0x00, 0x10];
        let standard = STANDARD.encode(bytes);
        let url = URL_SAFE_NO_PAD.encode(bytes);
        assert!(standard.contains('+') || standard.contains('/'));
        assert_eq!(decode(&standard).unwrap(), bytes);
        assert_eq!(decode(&url).unwrap(), bytes);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(decode("not base64!!"), Err(CryptoError::Encoding(_))));
    }
}
