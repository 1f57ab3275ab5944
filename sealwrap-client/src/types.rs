//! Wire types for the key and custody endpoints.

use serde::{Deserialize, Serialize};

/// Body of `GET auth/public-key`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyResponse {
    /// SPKI PEM of the server's current ephemeral RSA key.
    pub public_key: String,
    pub version: u64,
}

/// Body returned by the custody unwrap endpoint.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct CustodyUnwrapResponse {
    /// Base64 plaintext.
    pub secret: String,
}
