//! Shared test doubles: a deterministic RSA pair standing in for the
//! server's private half, a counting key source and a recording custody
//! backend.

#![allow(dead_code)]

use async_trait::async_trait;
use sealwrap_client::{
    CipherEnvelope, CustodyBackend, DecryptionMethod, PublicKeyResponse, PublicKeySource,
    SecretBytes, VaultError, VaultResult,
};
use sealwrap_crypto::oaep::{self, RsaPrivateKey};
use sealwrap_crypto::{Argon2Cost, KdfParameters};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

/// Server-side private key, generated once per test binary.
pub fn server_private_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| oaep::generate_private_key(2048).expect("RSA keygen must succeed"))
}

pub fn server_public_pem() -> String {
    oaep::public_key_pem(server_private_key()).expect("PEM export must succeed")
}

/// Argon2id parameters cheap enough for tests.
pub fn cheap_kdf() -> KdfParameters {
    KdfParameters::argon2id(
        Argon2Cost {
            memory: 64,
            iterations: 1,
            parallelism: 1,
        },
        b"tenant-user-salt".to_vec(),
    )
}

/// In-memory key endpoint. Each successful fetch returns the next version,
/// starting at 1.
pub struct CountingKeySource {
    pem: String,
    calls: AtomicUsize,
    successes: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Duration,
}

impl CountingKeySource {
    pub fn new() -> Self {
        Self {
            pem: server_public_pem(),
            calls: AtomicUsize::new(0),
            successes: AtomicUsize::new(0),
            failures_left: AtomicUsize::new(0),
            delay: Duration::from_millis(0),
        }
    }

    /// Holds every fetch open for `delay` so concurrent callers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fails the first `n` fetches with a network-style error.
    pub fn failing_first(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn with_pem(mut self, pem: impl Into<String>) -> Self {
        self.pem = pem.into();
        self
    }

    /// Makes the next fetch fail.
    pub fn fail_next(&self) {
        self.failures_left.store(1, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PublicKeySource for CountingKeySource {
    async fn fetch_public_key(&self) -> VaultResult<PublicKeyResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(VaultError::KeyFetch("connection reset".into()));
        }

        let version = self.successes.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(PublicKeyResponse {
            public_key: self.pem.clone(),
            version: version as u64,
        })
    }
}

/// Custody backend that records what it was asked to open.
pub struct RecordingCustody {
    pub reply: VaultResult<Vec<u8>>,
    pub seen: Mutex<Vec<CipherEnvelope>>,
}

impl RecordingCustody {
    pub fn returning(secret: &[u8]) -> Self {
        Self {
            reply: Ok(secret.to_vec()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reply: Err(VaultError::DecryptionFailed {
                method: DecryptionMethod::ServerSide,
                reason: "server rejected envelope (403 Forbidden)".into(),
            }),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl CustodyBackend for RecordingCustody {
    async fn unwrap_in_custody(&self, envelope: &CipherEnvelope) -> VaultResult<SecretBytes> {
        self.seen.lock().unwrap().push(envelope.clone());
        match &self.reply {
            Ok(bytes) => Ok(SecretBytes::new(bytes.clone())),
            Err(VaultError::DecryptionFailed { method, reason }) => {
                Err(VaultError::DecryptionFailed {
                    method: *method,
                    reason: reason.clone(),
                })
            }
            Err(other) => Err(VaultError::Custody(other.to_string())),
        }
    }
}
