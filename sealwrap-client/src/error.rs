//! Wrap/unwrap error types.
//!
//! Every failure is local to one secret's wrap or unwrap attempt and carries
//! enough context for the caller to decide the next UI action.

use crate::envelope::DecryptionMethod;
use crate::material::MaterialKind;
use std::fmt;
use thiserror::Error;

/// Result type for client operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Errors that can occur while wrapping or resolving secrets.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Fetching or importing the ephemeral public key failed.
    #[error("ephemeral key fetch failed: {0}")]
    KeyFetch(String),

    #[error("encryption failed: {0}")]
    Encryption(EncryptionFailure),

    /// None of the offered envelopes can be opened with the material at hand.
    #[error("no viable decryption method: {}", describe_blocked(.candidates))]
    NoViableDecryptionMethod { candidates: Vec<BlockedCandidate> },

    /// The chosen method's primitive rejected the ciphertext or key.
    #[error("decryption failed via {method}: {reason}")]
    DecryptionFailed {
        method: DecryptionMethod,
        reason: String,
    },

    #[error("malformed envelope: {0}")]
    Envelope(String),

    #[error("invalid wrapped token: {0}")]
    InvalidToken(String),

    #[error("server custody unavailable: {0}")]
    Custody(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl VaultError {
    /// Whether repeating the same call unchanged may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::KeyFetch(_) | Self::Custody(_))
    }
}

/// Why a wrap could not be produced.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EncryptionFailure {
    #[error("secret of {size} bytes exceeds wrap ceiling of {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("{0}")]
    Primitive(String),
}

/// An envelope that could not be attempted, and what would unblock it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockedCandidate {
    /// Position of the envelope in the set handed to the resolver.
    pub index: usize,
    pub method: DecryptionMethod,
    pub missing: Vec<MaterialKind>,
}

impl fmt::Display for BlockedCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} needs ", self.index, self.method)?;
        for (i, kind) in self.missing.iter().enumerate() {
            if i > 0 {
                f.write_str(" + ")?;
            }
            write!(f, "{kind}")?;
        }
        Ok(())
    }
}

fn describe_blocked(candidates: &[BlockedCandidate]) -> String {
    if candidates.is_empty() {
        return "no envelopes offered".to_string();
    }
    candidates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
