use sealwrap_crypto::{
    Argon2Cost, CryptoError, KdfParameters, NONCE_SIZE, SymmetricKey, decrypt, derive_key,
    encrypt, generate_random_key,
};

fn cheap_kdf() -> KdfParameters {
    KdfParameters::argon2id(
        Argon2Cost {
            memory: 64,
            iterations: 1,
            parallelism: 1,
        },
        b"per-user-salt-16".to_vec(),
    )
}

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = generate_random_key();
    let sealed = encrypt(&key, b"private key bytes").unwrap();
    assert_eq!(sealed.open(&key).unwrap(), b"private key bytes");
}

#[test]
fn wrong_key_fails() {
    let sealed = encrypt(&generate_random_key(), b"secret").unwrap();
    let err = sealed.open(&generate_random_key()).unwrap_err();
    assert!(matches!(err, CryptoError::Decryption(_)));
}

#[test]
fn nonce_length_is_checked() {
    let key = generate_random_key();
    let sealed = encrypt(&key, b"secret").unwrap();
    let err = decrypt(&key, &sealed.nonce[..8], &sealed.ciphertext).unwrap_err();
    assert!(matches!(
        err,
        CryptoError::InvalidNonceLength { expected: NONCE_SIZE, actual: 8 }
    ));
}

#[test]
fn truncated_ciphertext_fails() {
    let key = generate_random_key();
    let mut sealed = encrypt(&key, b"secret").unwrap();
    sealed.ciphertext.truncate(5);
    assert!(matches!(sealed.open(&key), Err(CryptoError::Decryption(_))));
}

#[test]
fn password_derived_key_roundtrip() {
    let kdf = cheap_kdf();
    let key = derive_key(b"correct horse", &kdf).unwrap();
    let sealed = encrypt(&key, b"user key").unwrap();

    let again = derive_key(b"correct horse", &kdf).unwrap();
    assert_eq!(sealed.open(&again).unwrap(), b"user key");

    let wrong = derive_key(b"battery staple", &kdf).unwrap();
    assert!(sealed.open(&wrong).is_err());
}

#[test]
fn unsupported_kdf_is_reported() {
    let mut kdf = cheap_kdf();
    kdf.algorithm = "scrypt".into();
    assert!(matches!(
        derive_key(b"pw", &kdf),
        Err(CryptoError::UnsupportedKdf(name)) if name == "scrypt"
    ));
}

#[test]
fn symmetric_key_from_slice_checks_length() {
    assert!(SymmetricKey::from_slice(&[0u8; 32]).is_ok());
    assert!(matches!(
        SymmetricKey::from_slice(&[0u8; 31]),
        Err(CryptoError::InvalidKeyLength { expected: 32, actual: 31 })
    ));
}

#[test]
fn debug_does_not_leak_key_bytes() {
    let key = SymmetricKey::from_bytes([0x41; 32]);
    assert_eq!(format!("{key:?}"), "SymmetricKey(..)");
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn encrypt_always_roundtrips(data in proptest::collection::vec(any::<u8>(), 0..1024)) {
            let key = generate_random_key();
            let sealed = encrypt(&key, &data).unwrap();
            prop_assert_eq!(sealed.open(&key).unwrap(), data);
        }
    }
}
