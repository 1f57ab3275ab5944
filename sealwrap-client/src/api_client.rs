//! HTTP client for the key and custody endpoints.
//!
//! Attaches a bearer token when one is set; the public key endpoint is
//! reachable without one. Uses reqwest with JSON serialization.

use crate::config::VaultConfig;
use crate::custody::CustodyBackend;
use crate::envelope::{CipherEnvelope, DecryptionMethod};
use crate::error::{VaultError, VaultResult};
use crate::key_cache::PublicKeySource;
use crate::material::SecretBytes;
use crate::types::{CustodyUnwrapResponse, PublicKeyResponse};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use sealwrap_crypto::encoding;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// HTTP client for the sealwrap backend.
pub struct VaultApiClient {
    client: Client,
    config: VaultConfig,
    access_token: Arc<RwLock<Option<String>>>,
}

impl VaultApiClient {
    pub fn new(config: VaultConfig) -> VaultResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| VaultError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Sets the bearer token sent with every request.
    pub async fn set_access_token(&self, token: String) {
        *self.access_token.write().await = Some(token);
    }

    pub async fn clear_access_token(&self) {
        *self.access_token.write().await = None;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.access_token.read().await.is_some()
    }

    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.access_token.read().await.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // ── Ephemeral key ──

    /// Fetches the server's current ephemeral public key.
    ///
    /// Transport, status and body failures are reported as `KeyFetch`. The
    /// PEM itself is checked when [`EphemeralPublicKey`] imports it.
    ///
    /// [`EphemeralPublicKey`]: crate::key_cache::EphemeralPublicKey
    pub async fn get_public_key(&self) -> VaultResult<PublicKeyResponse> {
        let url = self.config.url_for(&self.config.public_key_path);
        debug!("fetching ephemeral public key from {url}");

        let resp = self
            .authorize(self.client.get(&url))
            .await
            .send()
            .await
            .map_err(|e| VaultError::KeyFetch(format!("request failed: {e}")))?
            .error_for_status()
            .map_err(|e| VaultError::KeyFetch(e.to_string()))?;

        resp.json()
            .await
            .map_err(|e| VaultError::KeyFetch(format!("malformed key response: {e}")))
    }

    // ── Custody ──

    /// Asks the server to unwrap an envelope it holds custody of.
    pub async fn custody_unwrap(&self, envelope: &CipherEnvelope) -> VaultResult<SecretBytes> {
        let url = self.config.url_for(&self.config.custody_unwrap_path);

        let resp = self
            .authorize(self.client.post(&url))
            .await
            .json(envelope)
            .send()
            .await
            .map_err(|e| VaultError::Custody(format!("request failed: {e}")))?;

        let status = resp.status();
        if status.is_client_error() {
            return Err(VaultError::DecryptionFailed {
                method: DecryptionMethod::ServerSide,
                reason: format!("server rejected envelope ({status})"),
            });
        }
        let resp = resp
            .error_for_status()
            .map_err(|e| VaultError::Custody(e.to_string()))?;

        let body: CustodyUnwrapResponse = resp
            .json()
            .await
            .map_err(|e| VaultError::Custody(format!("malformed custody response: {e}")))?;
        let secret = encoding::decode(&body.secret)
            .map_err(|e| VaultError::Custody(format!("malformed custody response: {e}")))?;

        Ok(SecretBytes::new(secret))
    }
}

#[async_trait]
impl PublicKeySource for VaultApiClient {
    async fn fetch_public_key(&self) -> VaultResult<PublicKeyResponse> {
        self.get_public_key().await
    }
}

#[async_trait]
impl CustodyBackend for VaultApiClient {
    async fn unwrap_in_custody(&self, envelope: &CipherEnvelope) -> VaultResult<SecretBytes> {
        self.custody_unwrap(envelope).await
    }
}
