//! Server-side custody: envelopes only the server can open.

use crate::envelope::CipherEnvelope;
use crate::error::VaultResult;
use crate::material::SecretBytes;
use async_trait::async_trait;

/// Performs the unwrap of a server-side envelope on the caller's behalf.
///
/// Transport failures are `VaultError::Custody`; the server refusing the
/// envelope is `VaultError::DecryptionFailed` with the server-side method.
#[async_trait]
pub trait CustodyBackend: Send + Sync {
    async fn unwrap_in_custody(&self, envelope: &CipherEnvelope) -> VaultResult<SecretBytes>;
}
