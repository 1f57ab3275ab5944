//! Ephemeral public key cache with coalesced fetching.
//!
//! Holds at most one key version at a time. The first caller on a cold cache
//! starts a fetch; everyone who arrives while it is in flight awaits that
//! same fetch and gets the same outcome, success or failure. Racing
//! cold-start wraps therefore land under one key version, and a failing
//! endpoint is hit once per attempt, not once per waiter.
//!
//! The key is only ever replaced wholesale, by an explicit [`refresh`].
//!
//! [`refresh`]: AsymmetricKeyCache::refresh

use crate::error::{VaultError, VaultResult};
use crate::types::PublicKeyResponse;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use sealwrap_crypto::{CryptoResult, WrappingKey};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Where the ephemeral public key comes from.
#[async_trait]
pub trait PublicKeySource: Send + Sync {
    async fn fetch_public_key(&self) -> VaultResult<PublicKeyResponse>;
}

/// The server's current ephemeral public key and its version.
#[derive(Clone, Debug)]
pub struct EphemeralPublicKey {
    key: WrappingKey,
    version: u64,
    fetched_at: DateTime<Utc>,
}

impl EphemeralPublicKey {
    /// Imports a key endpoint response.
    pub fn from_response(response: &PublicKeyResponse) -> VaultResult<Self> {
        if response.public_key.trim().is_empty() {
            return Err(VaultError::KeyFetch("response has no public key".to_string()));
        }
        let key = WrappingKey::from_spki_pem(&response.public_key)
            .map_err(|e| VaultError::KeyFetch(e.to_string()))?;
        Ok(Self {
            key,
            version: response.version,
            fetched_at: Utc::now(),
        })
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Largest secret this key can wrap.
    pub fn max_payload(&self) -> usize {
        self.key.max_payload()
    }

    pub fn bits(&self) -> usize {
        self.key.bits()
    }

    pub(crate) fn encrypt(&self, secret: &[u8]) -> CryptoResult<Vec<u8>> {
        self.key.encrypt(secret)
    }
}

/// Outcome of one fetch attempt, shared by everyone awaiting it. The error
/// is the `KeyFetch` reason, kept as a string so it can be cloned.
type FetchOutcome = Result<Arc<EphemeralPublicKey>, String>;

type InFlightFetch = Shared<BoxFuture<'static, FetchOutcome>>;

struct CacheState {
    current: Option<Arc<EphemeralPublicKey>>,
    /// Number of successful fetches.
    generation: u64,
    /// The fetch currently running, if any. Cleared by the fetch task itself
    /// when it finishes, in the same critical section that stores the key.
    in_flight: Option<InFlightFetch>,
}

/// Explicitly owned cache of the ephemeral public key.
///
/// Construct one per backend and share it by `Arc`; there is no global
/// instance. Fetches run on the tokio runtime, so a caller dropping its
/// future does not cancel a fetch other callers are waiting on.
pub struct AsymmetricKeyCache {
    source: Arc<dyn PublicKeySource>,
    state: Arc<RwLock<CacheState>>,
}

impl AsymmetricKeyCache {
    pub fn new(source: Arc<dyn PublicKeySource>) -> Self {
        Self {
            source,
            state: Arc::new(RwLock::new(CacheState {
                current: None,
                generation: 0,
                in_flight: None,
            })),
        }
    }

    /// Returns the cached key, fetching it if the cache is cold.
    ///
    /// Callers racing on a cold cache share one fetch. If it fails, all of
    /// them get the same `KeyFetch` error and nothing is retried; the next
    /// call after that starts a new attempt.
    pub async fn get_or_fetch(&self) -> VaultResult<Arc<EphemeralPublicKey>> {
        if let Some(key) = self.cached().await {
            return Ok(key);
        }

        let fetch = {
            let mut state = self.state.write().await;
            if let Some(key) = &state.current {
                return Ok(key.clone());
            }
            match state.in_flight.clone() {
                Some(fetch) => {
                    debug!("joined in-flight key fetch");
                    fetch
                }
                None => self.start_fetch(&mut state),
            }
        };

        fetch.await.map_err(VaultError::KeyFetch)
    }

    /// Replaces the cached key with a freshly fetched one.
    ///
    /// Concurrent refreshes collapse into one: a caller arriving while a
    /// fetch is running awaits that fetch instead of starting another. A
    /// failed refresh leaves the current key in place.
    pub async fn refresh(&self) -> VaultResult<Arc<EphemeralPublicKey>> {
        let fetch = {
            let mut state = self.state.write().await;
            match state.in_flight.clone() {
                Some(fetch) => {
                    debug!("refresh joined in-flight key fetch");
                    fetch
                }
                None => {
                    debug!("refreshing ephemeral public key");
                    self.start_fetch(&mut state)
                }
            }
        };

        fetch.await.map_err(VaultError::KeyFetch)
    }

    /// Current key, without fetching.
    pub async fn cached(&self) -> Option<Arc<EphemeralPublicKey>> {
        self.state.read().await.current.clone()
    }

    /// Number of successful fetches so far.
    pub async fn fetch_count(&self) -> u64 {
        self.state.read().await.generation
    }

    /// Spawns a fetch and records it as in flight. Must be called with the
    /// state write lock held and no fetch already running.
    fn start_fetch(&self, state: &mut CacheState) -> InFlightFetch {
        let source = self.source.clone();
        let shared_state = self.state.clone();

        let task = tokio::spawn(async move {
            let outcome = fetch_key(source.as_ref()).await;

            let mut state = shared_state.write().await;
            state.in_flight = None;
            match &outcome {
                Ok(key) => {
                    state.current = Some(key.clone());
                    state.generation += 1;
                    debug!(
                        version = key.version(),
                        bits = key.bits(),
                        "cached ephemeral public key"
                    );
                }
                Err(reason) => warn!("ephemeral key fetch failed: {reason}"),
            }
            outcome
        });

        let fetch = async move {
            task.await
                .unwrap_or_else(|join_err| Err(format!("key fetch task failed: {join_err}")))
        }
        .boxed()
        .shared();

        state.in_flight = Some(fetch.clone());
        fetch
    }
}

async fn fetch_key(source: &dyn PublicKeySource) -> FetchOutcome {
    let response = source.fetch_public_key().await.map_err(key_fetch_reason)?;
    EphemeralPublicKey::from_response(&response)
        .map(Arc::new)
        .map_err(key_fetch_reason)
}

fn key_fetch_reason(e: VaultError) -> String {
    match e {
        VaultError::KeyFetch(reason) => reason,
        other => other.to_string(),
    }
}
