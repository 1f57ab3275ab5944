//! Secret wrapping and envelope resolution for sealwrap clients.
//!
//! Two paths:
//! - **Outbound**: [`SecretWrapper`] wraps a secret under the server's
//!   ephemeral RSA key, fetched once and shared through
//!   [`AsymmetricKeyCache`], and returns a `vault:v<version>:<base64>` token.
//! - **Inbound**: [`EnvelopeResolver`] takes the [`CipherEnvelope`]s that
//!   describe one secret, picks the method the caller's
//!   [`ClientMaterial`] can drive, and returns the plaintext.
//!
//! HTTP transport lives behind [`PublicKeySource`] and [`CustodyBackend`];
//! [`VaultApiClient`] implements both.

pub mod api_client;
pub mod config;
pub mod custody;
pub mod envelope;
pub mod error;
pub mod key_cache;
pub mod material;
pub mod resolver;
pub mod token;
pub mod types;
pub mod wrapper;

pub use api_client::VaultApiClient;
pub use config::VaultConfig;
pub use custody::CustodyBackend;
pub use envelope::{CipherEnvelope, DecryptionMethod};
pub use error::{BlockedCandidate, EncryptionFailure, VaultError, VaultResult};
pub use key_cache::{AsymmetricKeyCache, EphemeralPublicKey, PublicKeySource};
pub use material::{ClientMaterial, MaterialKind, SecretBytes};
pub use resolver::{EnvelopeResolver, Selection};
pub use token::WrappedSecretToken;
pub use types::PublicKeyResponse;
pub use wrapper::SecretWrapper;
