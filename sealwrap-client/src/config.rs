//! Client configuration.

use crate::error::{VaultError, VaultResult};
use serde::{Deserialize, Serialize};

/// Configuration for talking to the key and custody endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Base URL of the backend API (e.g., "https://api.example.com/v1").
    pub api_base_url: String,

    /// Path of the ephemeral public key endpoint, relative to the base URL.
    pub public_key_path: String,

    /// Path of the server-side custody unwrap endpoint.
    pub custody_unwrap_path: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.example.invalid".to_string(),
            public_key_path: "auth/public-key".to_string(),
            custody_unwrap_path: "auth/custody/unwrap".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl VaultConfig {
    /// Config pointing at `base_url` with every other field defaulted.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> VaultResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(VaultError::Config("api_base_url must not be empty".to_string()));
        }
        if self.public_key_path.trim().is_empty() {
            return Err(VaultError::Config("public_key_path must not be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(VaultError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Joins the base URL and `path` with exactly one slash.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
