//! WebAuthn PRF-bound sealed boxes.
//!
//! The authenticator's PRF output is stretched with HKDF-SHA256 into an
//! X25519 secret key. At registration the client publishes the matching
//! public key; anyone holding it can seal a secret that only a later
//! assertion with the same credential and salt can open.
//!
//! Sealing uses an ephemeral X25519 keypair and XSalsa20-Poly1305. The
//! ephemeral public key and nonce travel inside the packed ciphertext, so
//! envelopes of this kind carry no separate IV:
//!
//! ```text
//! ephemeral_pk (32) || nonce (24) || ciphertext + tag
//! ```

use crate::error::{CryptoError, CryptoResult};
use crypto_box::aead::{Aead, AeadCore, OsRng};
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

const PUBLIC_KEY_SIZE: usize = 32;
const BOX_NONCE_SIZE: usize = 24;
const BOX_TAG_SIZE: usize = 16;

/// Shortest PRF output accepted as key material.
pub const MIN_PRF_OUTPUT: usize = 32;

const HKDF_SALT: &[u8] = b"sealwrap-webauthn-prf";
const HKDF_INFO: &[u8] = b"x25519-unwrap-key-v1";

/// X25519 keypair derived from a PRF output.
///
/// The secret key zeroizes on drop (from crypto_box).
pub struct PrfKeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl PrfKeyPair {
    /// Derives the keypair bound to one credential's PRF output.
    pub fn from_prf_output(prf_output: &[u8]) -> CryptoResult<Self> {
        if prf_output.len() < MIN_PRF_OUTPUT {
            return Err(CryptoError::InvalidKeyLength {
                expected: MIN_PRF_OUTPUT,
                actual: prf_output.len(),
            });
        }

        let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), prf_output);
        let mut okm = Zeroizing::new([0u8; 32]);
        hk.expand(HKDF_INFO, &mut okm[..])
            .map_err(|e| CryptoError::KeyDerivation(format!("HKDF expand failed: {e}")))?;

        let secret = SecretKey::from(*okm);
        let public = secret.public_key();
        Ok(Self { secret, public })
    }

    /// Public half, as registered with the server.
    pub fn public_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        *self.public.as_bytes()
    }

    /// Opens a box produced by [`seal`] for this keypair.
    pub fn open(&self, packed: &[u8]) -> CryptoResult<Vec<u8>> {
        if packed.len() < PUBLIC_KEY_SIZE + BOX_NONCE_SIZE + BOX_TAG_SIZE {
            return Err(CryptoError::Decryption("sealed box truncated".to_string()));
        }
        let (epk, rest) = packed.split_at(PUBLIC_KEY_SIZE);
        let (nonce, ciphertext) = rest.split_at(BOX_NONCE_SIZE);

        let mut epk_bytes = [0u8; PUBLIC_KEY_SIZE];
        epk_bytes.copy_from_slice(epk);
        let salsa_box = SalsaBox::new(&PublicKey::from(epk_bytes), &self.secret);

        salsa_box
            .decrypt(crypto_box::Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                CryptoError::Decryption(
                    "sealed box open failed (wrong PRF or tampered data)".to_string(),
                )
            })
    }
}

/// Seals `secret` to a PRF-derived public key.
pub fn seal(secret: &[u8], recipient: &[u8; PUBLIC_KEY_SIZE]) -> CryptoResult<Vec<u8>> {
    let ephemeral = SecretKey::generate(&mut OsRng);
    let ephemeral_pk = ephemeral.public_key();

    let salsa_box = SalsaBox::new(&PublicKey::from(*recipient), &ephemeral);
    let nonce = SalsaBox::generate_nonce(&mut OsRng);

    let ciphertext = salsa_box
        .encrypt(&nonce, secret)
        .map_err(|e| CryptoError::Encryption(format!("sealed box failed: {e}")))?;

    let mut packed = Vec::with_capacity(PUBLIC_KEY_SIZE + BOX_NONCE_SIZE + ciphertext.len());
    packed.extend_from_slice(ephemeral_pk.as_bytes());
    packed.extend_from_slice(&nonce);
    packed.extend_from_slice(&ciphertext);
    Ok(packed)
}
