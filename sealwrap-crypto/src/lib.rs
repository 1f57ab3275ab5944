//! Key-wrapping primitives for sealwrap.
//!
//! Provides the building blocks behind secret wrapping and envelope
//! decryption:
//! - RSA-OAEP/SHA-256 wrapping under a server-issued ephemeral public key
//! - Argon2-family key derivation driven by server-supplied parameters
//! - ChaCha20-Poly1305 for symmetric at-rest envelopes
//! - X25519 sealed boxes keyed from a WebAuthn PRF output
//!
//! # Architecture
//!
//! Everything here is synchronous and free of I/O. Fetching keys, choosing
//! which envelope to open and talking to the server live in
//! `sealwrap-client`.
//!
//! Key material types (`SymmetricKey`, `PrfKeyPair`) zeroize on drop.

mod cipher;
pub mod encoding;
mod error;
mod key;
pub mod oaep;
pub mod prf;

pub use cipher::{EncryptedData, NONCE_SIZE, TAG_SIZE, decrypt, encrypt};
pub use error::{CryptoError, CryptoResult};
pub use key::{
    Argon2Cost, KEY_SIZE, KdfAlgorithm, KdfParameters, MIN_SALT_SIZE, SymmetricKey, derive_key,
    generate_random_key, generate_salt,
};
pub use oaep::WrappingKey;
pub use prf::PrfKeyPair;
