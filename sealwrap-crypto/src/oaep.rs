//! RSA-OAEP/SHA-256 wrapping under the server's ephemeral public key.
//!
//! The client only ever holds the public half. It is imported from an SPKI
//! PEM and can encrypt, nothing else: there is no accessor that hands the key
//! material back out.
//!
//! OAEP caps the plaintext at `k - 2*hLen - 2` bytes, where `k` is the modulus
//! size. With SHA-256 and a 2048-bit key that is 190 bytes. The ceiling is
//! checked before the primitive runs so an oversized payload is reported as
//! [`CryptoError::PayloadTooLarge`].

use crate::error::{CryptoError, CryptoResult};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::rand_core::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPublicKey};
use sha2::Sha256;

pub use rsa::RsaPrivateKey;

/// SHA-256 digest length.
const HASH_LEN: usize = 32;

/// Largest plaintext OAEP/SHA-256 accepts for a modulus of `modulus_bytes`.
pub fn max_payload_for(modulus_bytes: usize) -> usize {
    modulus_bytes.saturating_sub(2 * HASH_LEN + 2)
}

/// An imported, encrypt-only RSA public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrappingKey {
    inner: RsaPublicKey,
}

impl WrappingKey {
    /// Imports an SPKI PEM (`-----BEGIN PUBLIC KEY-----`).
    pub fn from_spki_pem(pem: &str) -> CryptoResult<Self> {
        let inner = RsaPublicKey::from_public_key_pem(pem.trim())
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.inner.size() * 8
    }

    /// Largest secret this key can wrap.
    pub fn max_payload(&self) -> usize {
        max_payload_for(self.inner.size())
    }

    /// Encrypts `secret`, rejecting it up front if it exceeds the ceiling.
    pub fn encrypt(&self, secret: &[u8]) -> CryptoResult<Vec<u8>> {
        let max = self.max_payload();
        if secret.len() > max {
            return Err(CryptoError::PayloadTooLarge {
                size: secret.len(),
                max,
            });
        }

        self.inner
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), secret)
            .map_err(|e| CryptoError::Encryption(e.to_string()))
    }
}

/// Reverses [`WrappingKey::encrypt`] with the matching private key.
///
/// Only the server holds that key; this exists for server-side tooling and
/// for verifying wraps against a locally generated pair.
pub fn unwrap(private: &RsaPrivateKey, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    private
        .decrypt(Oaep::new::<Sha256>(), ciphertext)
        .map_err(|_| CryptoError::Decryption("OAEP unwrap failed".to_string()))
}

/// Generates a fresh RSA private key of `bits` size.
pub fn generate_private_key(bits: usize) -> CryptoResult<RsaPrivateKey> {
    RsaPrivateKey::new(&mut OsRng, bits).map_err(|e| CryptoError::Encryption(e.to_string()))
}

/// SPKI PEM of the public half of `private`, as the key endpoint serves it.
pub fn public_key_pem(private: &RsaPrivateKey) -> CryptoResult<String> {
    private
        .to_public_key()
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_for_common_key_sizes() {
        assert_eq!(max_payload_for(256), 190);
        assert_eq!(max_payload_for(384), 318);
        assert_eq!(max_payload_for(512), 446);
        assert_eq!(max_payload_for(10), 0);
    }

    #[test]
    fn garbage_pem_is_rejected() {
        let pem = "-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----";
        let err = WrappingKey::from_spki_pem(pem).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidPublicKey(_)));
        assert!(matches!(
            WrappingKey::from_spki_pem(""),
            Err(CryptoError::InvalidPublicKey(_))
        ));
    }
}
