//! Versioned wire token for wrapped secrets: `vault:v<version>:<base64>`.

use crate::error::{VaultError, VaultResult};
use sealwrap_crypto::encoding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PREFIX: &str = "vault:v";

/// A secret wrapped under a specific ephemeral key version.
///
/// The version is what the server uses to pick the private key for unwrap.
/// The client cannot check it is still held server-side; it only carries it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WrappedSecretToken {
    raw: String,
    version: u64,
}

impl WrappedSecretToken {
    pub(crate) fn new(version: u64, ciphertext: &[u8]) -> Self {
        Self {
            raw: format!("{PREFIX}{version}:{}", encoding::encode(ciphertext)),
            version,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Key version the secret was wrapped under.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Decoded ciphertext bytes.
    pub fn ciphertext(&self) -> VaultResult<Vec<u8>> {
        encoding::decode(self.encoded_ciphertext())
            .map_err(|e| VaultError::InvalidToken(e.to_string()))
    }

    fn encoded_ciphertext(&self) -> &str {
        // Parsing guarantees the prefix and the version separator.
        self.raw[PREFIX.len()..]
            .split_once(':')
            .map(|(_, body)| body)
            .unwrap_or_default()
    }
}

impl FromStr for WrappedSecretToken {
    type Err = VaultError;

    fn from_str(s: &str) -> VaultResult<Self> {
        let rest = s
            .strip_prefix(PREFIX)
            .ok_or_else(|| VaultError::InvalidToken(format!("missing `{PREFIX}` prefix")))?;
        let (version, body) = rest
            .split_once(':')
            .ok_or_else(|| VaultError::InvalidToken("missing version separator".to_string()))?;

        if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VaultError::InvalidToken(format!("bad version `{version}`")));
        }
        let version: u64 = version
            .parse()
            .map_err(|e| VaultError::InvalidToken(format!("bad version: {e}")))?;

        if body.is_empty() {
            return Err(VaultError::InvalidToken("empty ciphertext".to_string()));
        }
        encoding::decode(body).map_err(|e| VaultError::InvalidToken(e.to_string()))?;

        Ok(Self {
            raw: s.to_string(),
            version,
        })
    }
}

impl TryFrom<String> for WrappedSecretToken {
    type Error = VaultError;

    fn try_from(s: String) -> VaultResult<Self> {
        s.parse()
    }
}

impl From<WrappedSecretToken> for String {
    fn from(token: WrappedSecretToken) -> Self {
        token.raw
    }
}

impl fmt::Display for WrappedSecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_version_prefix() {
        let token = WrappedSecretToken::new(7, &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(token.as_str(), "vault:v7:3q2+7w==");
        assert_eq!(token.version(), 7);
        assert_eq!(token.ciphertext().unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn parses_url_safe_body() {
        let token: WrappedSecretToken = "vault:v12:3q2-7w".parse().unwrap();
        assert_eq!(token.version(), 12);
        assert_eq!(token.ciphertext().unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn rejects_malformed() {
        for bad in [
            "",
            "vault:7:AAAA",
            "vault:v:AAAA",
            "vault:v-1:AAAA",
            "vault:v1x:AAAA",
            "vault:v1:",
            "vault:v1",
            "vault:v1:!!!!",
            "vault:v99999999999999999999999:AAAA",
        ] {
            assert!(
                matches!(bad.parse::<WrappedSecretToken>(), Err(VaultError::InvalidToken(_))),
                "accepted {bad:?}"
            );
        }
    }
}
