//! Picks and drives a decryption path for a set of envelopes.
//!
//! # Selection policy
//!
//! Among envelopes whose required material is all present, the one whose
//! method needs the least additional user interaction is chosen:
//!
//! 1. resident raw key
//! 2. WebAuthn assertion already obtained
//! 3. password (needs a prompt)
//! 4. server-side custody (needs a round trip)
//!
//! Envelopes sharing a method are tried in input order; the first wins.
//!
//! Exactly one envelope is attempted per call. If its primitive rejects the
//! input, the failure is returned as-is and no other envelope is tried. A
//! wrong password must surface as a wrong password, not be masked by a
//! silent fallback to some other method. Retrying with a different
//! envelope is the caller's decision.

use crate::custody::CustodyBackend;
use crate::envelope::{CipherEnvelope, DecryptionMethod};
use crate::error::{BlockedCandidate, VaultError, VaultResult};
use crate::material::{ClientMaterial, MaterialKind, SecretBytes};
use sealwrap_crypto::{KdfParameters, PrfKeyPair, decrypt, derive_key};
use std::sync::Arc;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Outcome of the pure selection step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// The envelope at `index` would be attempted.
    Chosen {
        index: usize,
        method: DecryptionMethod,
    },
    /// Nothing is viable; one entry per offered envelope.
    Blocked(Vec<BlockedCandidate>),
}

/// Resolves envelope sets to plaintext.
#[derive(Clone, Default)]
pub struct EnvelopeResolver {
    custody: Option<Arc<dyn CustodyBackend>>,
}

impl EnvelopeResolver {
    /// A resolver without server custody; server-side envelopes stay blocked.
    pub fn new() -> Self {
        Self { custody: None }
    }

    pub fn with_custody(custody: Arc<dyn CustodyBackend>) -> Self {
        Self {
            custody: Some(custody),
        }
    }

    fn has(&self, material: &ClientMaterial, kind: MaterialKind) -> bool {
        match kind {
            MaterialKind::ServerCustody => self.custody.is_some(),
            other => material.has(other),
        }
    }

    fn missing_for(
        &self,
        method: DecryptionMethod,
        material: &ClientMaterial,
    ) -> Vec<MaterialKind> {
        method
            .required_material()
            .iter()
            .copied()
            .filter(|kind| !self.has(material, *kind))
            .collect()
    }

    /// Decides which envelope would be attempted, without decrypting.
    pub fn select(&self, envelopes: &[CipherEnvelope], material: &ClientMaterial) -> Selection {
        let mut best: Option<(u8, usize, DecryptionMethod)> = None;
        let mut blocked = Vec::new();

        for (index, envelope) in envelopes.iter().enumerate() {
            let method = envelope.method();
            let missing = self.missing_for(method, material);
            if !missing.is_empty() {
                blocked.push(BlockedCandidate {
                    index,
                    method,
                    missing,
                });
                continue;
            }

            let rank = method.preference_rank();
            if best.is_none_or(|(best_rank, _, _)| rank < best_rank) {
                best = Some((rank, index, method));
            }
        }

        match best {
            Some((_, index, method)) => Selection::Chosen { index, method },
            None => Selection::Blocked(blocked),
        }
    }

    /// Opens the best viable envelope with the material at hand.
    pub async fn resolve(
        &self,
        envelopes: &[CipherEnvelope],
        material: &ClientMaterial,
    ) -> VaultResult<SecretBytes> {
        if envelopes.is_empty() {
            return Err(VaultError::Envelope("no envelopes offered".to_string()));
        }

        let (index, method) = match self.select(envelopes, material) {
            Selection::Chosen { index, method } => (index, method),
            Selection::Blocked(candidates) => {
                debug!(count = candidates.len(), "no viable decryption method");
                return Err(VaultError::NoViableDecryptionMethod { candidates });
            }
        };
        debug!(index, %method, "resolving envelope");

        let envelope = &envelopes[index];
        let result = match method {
            DecryptionMethod::RawUserKey => self.open_raw_key(envelope, material),
            DecryptionMethod::WebAuthn => self.open_webauthn(envelope, material),
            DecryptionMethod::PasswordDerived => self.open_password(envelope, material).await,
            DecryptionMethod::ServerSide => self.open_server_side(envelope).await,
        };

        result.inspect_err(|e| warn!(%method, "envelope resolution failed: {e}"))
    }

    fn open_raw_key(
        &self,
        envelope: &CipherEnvelope,
        material: &ClientMaterial,
    ) -> VaultResult<SecretBytes> {
        let method = DecryptionMethod::RawUserKey;
        let key = material.raw_key().ok_or_else(|| unavailable(method))?;
        let iv = envelope.iv().ok_or_else(|| missing_iv(method))?;

        decrypt(key, iv, envelope.cipher())
            .map(SecretBytes::new)
            .map_err(|e| failed(method, e))
    }

    fn open_webauthn(
        &self,
        envelope: &CipherEnvelope,
        material: &ClientMaterial,
    ) -> VaultResult<SecretBytes> {
        let method = DecryptionMethod::WebAuthn;
        let prf_output = material.prf_output().ok_or_else(|| unavailable(method))?;

        PrfKeyPair::from_prf_output(prf_output)
            .and_then(|keypair| keypair.open(envelope.cipher()))
            .map(SecretBytes::new)
            .map_err(|e| failed(method, e))
    }

    /// Argon2 runs on the blocking pool so other tasks keep making progress.
    async fn open_password(
        &self,
        envelope: &CipherEnvelope,
        material: &ClientMaterial,
    ) -> VaultResult<SecretBytes> {
        let method = DecryptionMethod::PasswordDerived;
        let password = Zeroizing::new(
            material
                .password()
                .ok_or_else(|| unavailable(method))?
                .to_string(),
        );
        let kdf: KdfParameters = material
            .kdf_parameters()
            .ok_or_else(|| unavailable(method))?
            .clone();
        let iv = envelope.iv().ok_or_else(|| missing_iv(method))?.to_vec();
        let cipher = envelope.cipher().to_vec();

        let task = tokio::task::spawn_blocking(move || {
            let key = derive_key(password.as_bytes(), &kdf)?;
            decrypt(&key, &iv, &cipher)
        });

        match task.await {
            Ok(result) => result.map(SecretBytes::new).map_err(|e| failed(method, e)),
            Err(join_err) => Err(VaultError::DecryptionFailed {
                method,
                reason: format!("key derivation task failed: {join_err}"),
            }),
        }
    }

    async fn open_server_side(&self, envelope: &CipherEnvelope) -> VaultResult<SecretBytes> {
        let custody = self
            .custody
            .as_ref()
            .ok_or_else(|| unavailable(DecryptionMethod::ServerSide))?;
        custody.unwrap_in_custody(envelope).await
    }
}

fn failed(method: DecryptionMethod, e: sealwrap_crypto::CryptoError) -> VaultError {
    VaultError::DecryptionFailed {
        method,
        reason: e.to_string(),
    }
}

fn missing_iv(method: DecryptionMethod) -> VaultError {
    VaultError::Envelope(format!("{method} envelope has no IV"))
}

// Only reachable when an opener is called for a method `select` did not pick.
fn unavailable(method: DecryptionMethod) -> VaultError {
    VaultError::NoViableDecryptionMethod {
        candidates: vec![BlockedCandidate {
            index: 0,
            method,
            missing: method.required_material().to_vec(),
        }],
    }
}
