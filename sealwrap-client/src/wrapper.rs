//! Wraps outbound secrets under the server's ephemeral public key.

use crate::error::{EncryptionFailure, VaultError, VaultResult};
use crate::key_cache::AsymmetricKeyCache;
use crate::token::WrappedSecretToken;
use sealwrap_crypto::CryptoError;
use sealwrap_crypto::oaep::max_payload_for;
use std::sync::Arc;
use tracing::{debug, warn};

/// Largest RSA modulus the key import accepts, in bytes (4096 bits).
const MAX_MODULUS_BYTES: usize = 512;

/// Produces transport tokens for secrets. No retries: a failed wrap is
/// returned to the caller to re-attempt explicitly.
#[derive(Clone)]
pub struct SecretWrapper {
    keys: Arc<AsymmetricKeyCache>,
}

impl SecretWrapper {
    pub fn new(keys: Arc<AsymmetricKeyCache>) -> Self {
        Self { keys }
    }

    /// Wraps `secret` as `vault:v{version}:{base64}`.
    ///
    /// Size is checked before any work: first against the ceiling of the
    /// largest key that could ever be served, so an impossible payload never
    /// triggers a fetch; then against the active key's own ceiling, before
    /// the RSA primitive runs.
    pub async fn wrap(&self, secret: &[u8]) -> VaultResult<WrappedSecretToken> {
        check_size(secret.len(), max_payload_for(MAX_MODULUS_BYTES))?;

        let key = self.keys.get_or_fetch().await?;
        check_size(secret.len(), key.max_payload())?;

        let ciphertext = key.encrypt(secret).map_err(|e| match e {
            CryptoError::PayloadTooLarge { size, max } => {
                VaultError::Encryption(EncryptionFailure::PayloadTooLarge { size, max })
            }
            other => VaultError::Encryption(EncryptionFailure::Primitive(other.to_string())),
        })?;

        debug!(version = key.version(), "wrapped secret");
        Ok(WrappedSecretToken::new(key.version(), &ciphertext))
    }

    pub async fn wrap_str(&self, secret: &str) -> VaultResult<WrappedSecretToken> {
        self.wrap(secret.as_bytes()).await
    }

    /// Ceiling for the active key, fetching it if needed.
    pub async fn max_payload(&self) -> VaultResult<usize> {
        Ok(self.keys.get_or_fetch().await?.max_payload())
    }
}

fn check_size(size: usize, max: usize) -> VaultResult<()> {
    if size > max {
        warn!(size, max, "secret exceeds wrap ceiling");
        return Err(VaultError::Encryption(EncryptionFailure::PayloadTooLarge {
            size,
            max,
        }));
    }
    Ok(())
}
