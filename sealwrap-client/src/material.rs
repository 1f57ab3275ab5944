//! Client-side material available for opening envelopes.

use sealwrap_crypto::{KdfParameters, SymmetricKey};
use std::fmt;
use zeroize::Zeroizing;

/// One kind of input an unlock path can need.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    /// The user's password, typed in.
    Password,
    /// Server-supplied KDF details for the password.
    KdfParameters,
    /// An already-unwrapped symmetric key resident in memory.
    RawKey,
    /// PRF output from a completed WebAuthn assertion.
    WebAuthnPrf,
    /// A configured round trip to the server's custody endpoint.
    ServerCustody,
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Password => "password",
            Self::KdfParameters => "KDF parameters",
            Self::RawKey => "resident key",
            Self::WebAuthnPrf => "WebAuthn assertion",
            Self::ServerCustody => "server custody",
        })
    }
}

/// What the caller currently holds. Built up as the user supplies more.
#[derive(Clone, Default)]
pub struct ClientMaterial {
    password: Option<Zeroizing<String>>,
    kdf: Option<KdfParameters>,
    raw_key: Option<SymmetricKey>,
    prf_output: Option<Zeroizing<Vec<u8>>>,
}

impl ClientMaterial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(Zeroizing::new(password.into()));
        self
    }

    pub fn with_kdf_parameters(mut self, kdf: KdfParameters) -> Self {
        self.kdf = Some(kdf);
        self
    }

    pub fn with_raw_key(mut self, key: SymmetricKey) -> Self {
        self.raw_key = Some(key);
        self
    }

    pub fn with_prf_output(mut self, prf_output: impl Into<Vec<u8>>) -> Self {
        self.prf_output = Some(Zeroizing::new(prf_output.into()));
        self
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().map(String::as_str)
    }

    pub fn kdf_parameters(&self) -> Option<&KdfParameters> {
        self.kdf.as_ref()
    }

    pub fn raw_key(&self) -> Option<&SymmetricKey> {
        self.raw_key.as_ref()
    }

    pub fn prf_output(&self) -> Option<&[u8]> {
        self.prf_output.as_deref().map(Vec::as_slice)
    }

    /// Whether `kind` is held. `ServerCustody` is never client material;
    /// the resolver supplies it.
    pub fn has(&self, kind: MaterialKind) -> bool {
        match kind {
            MaterialKind::Password => self.password.is_some(),
            MaterialKind::KdfParameters => self.kdf.is_some(),
            MaterialKind::RawKey => self.raw_key.is_some(),
            MaterialKind::WebAuthnPrf => self.prf_output.is_some(),
            MaterialKind::ServerCustody => false,
        }
    }

    /// Kinds of material currently held.
    pub fn available(&self) -> Vec<MaterialKind> {
        [
            MaterialKind::Password,
            MaterialKind::KdfParameters,
            MaterialKind::RawKey,
            MaterialKind::WebAuthnPrf,
        ]
        .into_iter()
        .filter(|kind| self.has(*kind))
        .collect()
    }
}

impl fmt::Debug for ClientMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientMaterial")
            .field("available", &self.available())
            .finish()
    }
}

/// Plaintext recovered from an envelope. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretBytes(Zeroizing<Vec<u8>>);

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for SecretBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes({} bytes)", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealwrap_crypto::generate_random_key;

    #[test]
    fn available_tracks_builder() {
        let material = ClientMaterial::new()
            .with_password("pw")
            .with_raw_key(generate_random_key());
        assert_eq!(
            material.available(),
            vec![MaterialKind::Password, MaterialKind::RawKey]
        );
        assert!(!material.has(MaterialKind::ServerCustody));
    }

    #[test]
    fn debug_redacts_secrets() {
        let material = ClientMaterial::new()
            .with_password("hunter2")
            .with_prf_output(vec![1u8; 32]);
        let rendered = format!("{material:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("WebAuthnPrf"));

        let secret = SecretBytes::new(b"top secret".to_vec());
        assert_eq!(format!("{secret:?}"), "SecretBytes(10 bytes)");
    }
}
