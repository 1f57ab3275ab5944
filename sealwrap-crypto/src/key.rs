//! Symmetric keys and password-based key derivation.

use crate::encoding::base64_bytes;
use crate::error::{CryptoError, CryptoResult};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Symmetric key size in bytes.
pub const KEY_SIZE: usize = 32;

/// Shortest salt Argon2 accepts.
pub const MIN_SALT_SIZE: usize = 8;

/// A 256-bit symmetric key, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds a key from a slice, rejecting anything that is not 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        let array: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey(..)")
    }
}

/// Generates a random symmetric key.
pub fn generate_random_key() -> SymmetricKey {
    let mut bytes = [0u8; KEY_SIZE];
    rand::rng().fill_bytes(&mut bytes);
    SymmetricKey(bytes)
}

/// Generates a random salt of the given length.
pub fn generate_salt(len: usize) -> Vec<u8> {
    let mut salt = vec![0u8; len];
    rand::rng().fill_bytes(&mut salt);
    salt
}

/// Argon2 variant named by the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KdfAlgorithm {
    Argon2id,
    Argon2i,
    Argon2d,
}

impl KdfAlgorithm {
    /// Parses the server's algorithm identifier, ignoring case.
    pub fn parse(name: &str) -> CryptoResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "argon2id" => Ok(Self::Argon2id),
            "argon2i" => Ok(Self::Argon2i),
            "argon2d" => Ok(Self::Argon2d),
            _ => Err(CryptoError::UnsupportedKdf(name.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Argon2id => "argon2id",
            Self::Argon2i => "argon2i",
            Self::Argon2d => "argon2d",
        }
    }

    fn variant(self) -> Algorithm {
        match self {
            Self::Argon2id => Algorithm::Argon2id,
            Self::Argon2i => Algorithm::Argon2i,
            Self::Argon2d => Algorithm::Argon2d,
        }
    }
}

/// Argon2 cost parameters. `memory` is in KiB.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Cost {
    pub memory: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for Argon2Cost {
    fn default() -> Self {
        Self {
            memory: 64 * 1024,
            iterations: 3,
            parallelism: 4,
        }
    }
}

/// KDF details supplied by the server for one unlock flow.
///
/// The values are applied as given; the client never adjusts cost.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KdfParameters {
    pub algorithm: String,
    pub parameters: Argon2Cost,
    #[serde(with = "base64_bytes")]
    pub salt: Vec<u8>,
    /// Replay/skew tolerance for signed unlock flows. Carried, not enforced here.
    pub signature_verification_window: u64,
}

impl KdfParameters {
    /// Argon2id parameters with the given cost and salt.
    pub fn argon2id(parameters: Argon2Cost, salt: Vec<u8>) -> Self {
        Self {
            algorithm: KdfAlgorithm::Argon2id.as_str().to_string(),
            parameters,
            salt,
            signature_verification_window: 0,
        }
    }

    pub fn kdf_algorithm(&self) -> CryptoResult<KdfAlgorithm> {
        KdfAlgorithm::parse(&self.algorithm)
    }
}

/// Derives a symmetric key from a password under server-supplied parameters.
pub fn derive_key(password: &[u8], kdf: &KdfParameters) -> CryptoResult<SymmetricKey> {
    let algorithm = kdf.kdf_algorithm()?;
    if kdf.salt.len() < MIN_SALT_SIZE {
        return Err(CryptoError::KeyDerivation(format!(
            "salt must be at least {MIN_SALT_SIZE} bytes, got {}",
            kdf.salt.len()
        )));
    }

    let cost = &kdf.parameters;
    let params = Params::new(cost.memory, cost.iterations, cost.parallelism, Some(KEY_SIZE))
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    let argon2 = Argon2::new(algorithm.variant(), Version::V0x13, params);

    let mut output = [0u8; KEY_SIZE];
    argon2
        .hash_password_into(password, &kdf.salt, &mut output)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    let key = SymmetricKey(output);
    output.zeroize();
    Ok(key)
}
