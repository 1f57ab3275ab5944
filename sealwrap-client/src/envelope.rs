//! Cipher envelopes: a ciphertext plus the method needed to open it.
//!
//! One secret may be described by several envelopes, each reachable through
//! a different [`DecryptionMethod`] (a user key wrapped once under a
//! password-derived key and once under a WebAuthn PRF key, say). Envelopes
//! are immutable; changing the method means producing a new envelope.
//!
//! Wire shape:
//!
//! ```json
//! { "decryptionMethod": "password", "iv": "<base64>" | null, "cipher": "<base64>" }
//! ```

use crate::error::{VaultError, VaultResult};
use crate::material::MaterialKind;
use sealwrap_crypto::encoding::{base64_bytes, base64_option};
use sealwrap_crypto::{KdfParameters, SymmetricKey, derive_key, encrypt, prf};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an envelope is opened. Closed set; the resolver matches exhaustively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecryptionMethod {
    /// Argon2-derived key from the user's password, then symmetric decrypt.
    #[serde(rename = "password")]
    PasswordDerived,
    /// Symmetric decrypt with a key already resident in memory.
    #[serde(rename = "rawKey")]
    RawUserKey,
    /// The server performs the unwrap; opaque to the client.
    #[serde(rename = "serverSide")]
    ServerSide,
    /// Sealed box opened with a key derived from WebAuthn PRF output.
    #[serde(rename = "webAuthn")]
    WebAuthn,
}

impl DecryptionMethod {
    pub const ALL: [DecryptionMethod; 4] = [
        Self::RawUserKey,
        Self::WebAuthn,
        Self::PasswordDerived,
        Self::ServerSide,
    ];

    /// Symmetric at-rest methods need an IV; the others may omit it.
    pub fn requires_iv(self) -> bool {
        matches!(self, Self::PasswordDerived | Self::RawUserKey)
    }

    /// Material that must be present before this method can be attempted.
    pub fn required_material(self) -> &'static [MaterialKind] {
        match self {
            Self::PasswordDerived => &[MaterialKind::Password, MaterialKind::KdfParameters],
            Self::RawUserKey => &[MaterialKind::RawKey],
            Self::ServerSide => &[MaterialKind::ServerCustody],
            Self::WebAuthn => &[MaterialKind::WebAuthnPrf],
        }
    }

    /// Lower is tried first: least additional user interaction wins.
    ///
    /// resident key > WebAuthn assertion > password prompt > server round trip
    pub fn preference_rank(self) -> u8 {
        match self {
            Self::RawUserKey => 0,
            Self::WebAuthn => 1,
            Self::PasswordDerived => 2,
            Self::ServerSide => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PasswordDerived => "password",
            Self::RawUserKey => "rawKey",
            Self::ServerSide => "serverSide",
            Self::WebAuthn => "webAuthn",
        }
    }
}

impl fmt::Display for DecryptionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CipherEnvelopeWire {
    decryption_method: DecryptionMethod,
    #[serde(default, with = "base64_option")]
    iv: Option<Vec<u8>>,
    #[serde(with = "base64_bytes")]
    cipher: Vec<u8>,
}

/// A ciphertext and the metadata describing how to decrypt it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CipherEnvelopeWire", into = "CipherEnvelopeWire")]
pub struct CipherEnvelope {
    method: DecryptionMethod,
    iv: Option<Vec<u8>>,
    cipher: Vec<u8>,
}

impl CipherEnvelope {
    /// Builds an envelope, enforcing the IV/method invariant.
    pub fn new(
        method: DecryptionMethod,
        iv: Option<Vec<u8>>,
        cipher: Vec<u8>,
    ) -> VaultResult<Self> {
        if method.requires_iv() && iv.as_ref().is_none_or(|iv| iv.is_empty()) {
            return Err(VaultError::Envelope(format!("{method} envelope requires an IV")));
        }
        if cipher.is_empty() {
            return Err(VaultError::Envelope(format!("{method} envelope has empty cipher")));
        }
        Ok(Self { method, iv, cipher })
    }

    pub fn method(&self) -> DecryptionMethod {
        self.method
    }

    pub fn iv(&self) -> Option<&[u8]> {
        self.iv.as_deref()
    }

    pub fn cipher(&self) -> &[u8] {
        &self.cipher
    }

    /// Wraps `secret` under a key derived from `password`.
    pub fn seal_with_password(
        secret: &[u8],
        password: &str,
        kdf: &KdfParameters,
    ) -> VaultResult<Self> {
        let key = derive_key(password.as_bytes(), kdf).map_err(|e| envelope_err("password", e))?;
        Self::seal_symmetric(DecryptionMethod::PasswordDerived, secret, &key)
    }

    /// Wraps `secret` under an in-memory symmetric key.
    pub fn seal_with_raw_key(secret: &[u8], key: &SymmetricKey) -> VaultResult<Self> {
        Self::seal_symmetric(DecryptionMethod::RawUserKey, secret, key)
    }

    /// Wraps `secret` to the public key registered for a WebAuthn credential.
    pub fn seal_for_webauthn(secret: &[u8], prf_public_key: &[u8; 32]) -> VaultResult<Self> {
        let packed = prf::seal(secret, prf_public_key).map_err(|e| envelope_err("webAuthn", e))?;
        Self::new(DecryptionMethod::WebAuthn, None, packed)
    }

    fn seal_symmetric(
        method: DecryptionMethod,
        secret: &[u8],
        key: &SymmetricKey,
    ) -> VaultResult<Self> {
        let sealed = encrypt(key, secret).map_err(|e| envelope_err(method.as_str(), e))?;
        Self::new(method, Some(sealed.nonce.to_vec()), sealed.ciphertext)
    }
}

fn envelope_err(method: &str, e: sealwrap_crypto::CryptoError) -> VaultError {
    VaultError::Envelope(format!("sealing {method} envelope failed: {e}"))
}

impl TryFrom<CipherEnvelopeWire> for CipherEnvelope {
    type Error = VaultError;

    fn try_from(wire: CipherEnvelopeWire) -> VaultResult<Self> {
        Self::new(wire.decryption_method, wire.iv, wire.cipher)
    }
}

impl From<CipherEnvelope> for CipherEnvelopeWire {
    fn from(envelope: CipherEnvelope) -> Self {
        Self {
            decryption_method: envelope.method,
            iv: envelope.iv,
            cipher: envelope.cipher,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preference_order_is_total_and_documented() {
        let ranks: Vec<u8> = DecryptionMethod::ALL.iter().map(|m| m.preference_rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn symmetric_methods_need_iv() {
        for method in [DecryptionMethod::PasswordDerived, DecryptionMethod::RawUserKey] {
            assert!(CipherEnvelope::new(method, None, vec![1]).is_err());
            assert!(CipherEnvelope::new(method, Some(vec![]), vec![1]).is_err());
            assert!(CipherEnvelope::new(method, Some(vec![0; 12]), vec![1]).is_ok());
        }
        assert!(CipherEnvelope::new(DecryptionMethod::WebAuthn, None, vec![1]).is_ok());
        assert!(CipherEnvelope::new(DecryptionMethod::ServerSide, None, vec![1]).is_ok());
    }
}
