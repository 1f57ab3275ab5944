//! Adversarial tests for PRF-bound sealed boxes (X25519 + XSalsa20-Poly1305).
//!
//! Validates that:
//! - A box opens only with the PRF output it was sealed for
//! - Tampered ciphertext / nonce / ephemeral key are detected
//! - Empty and large secrets round-trip correctly

use sealwrap_crypto::prf::{PrfKeyPair, seal};
use sealwrap_crypto::CryptoError;

const PRF_OUTPUT: [u8; 32] = [0x5a; 32];

fn keypair() -> PrfKeyPair {
    PrfKeyPair::from_prf_output(&PRF_OUTPUT).unwrap()
}

#[test]
fn seal_and_open_roundtrip() {
    let kp = keypair();
    let secret = b"0123456789abcdef0123456789abcdef";

    let packed = seal(secret, &kp.public_bytes()).unwrap();
    assert_eq!(kp.open(&packed).unwrap(), secret);
}

#[test]
fn stale_prf_output_fails() {
    let kp = keypair();
    let other = PrfKeyPair::from_prf_output(&[0x11; 32]).unwrap();
    let packed = seal(b"user-key", &kp.public_bytes()).unwrap();

    let err = other.open(&packed).unwrap_err();
    match err {
        CryptoError::Decryption(msg) => {
            assert!(msg.contains("wrong PRF") || msg.contains("tampered"), "got: {msg}");
        }
        other => panic!("expected CryptoError::Decryption, got: {other:?}"),
    }
}

#[test]
fn tampered_ciphertext_detected() {
    let kp = keypair();
    let mut packed = seal(b"user-key", &kp.public_bytes()).unwrap();
    let last = packed.len() - 1;
    packed[last] ^= 0xFF;

    assert!(matches!(kp.open(&packed), Err(CryptoError::Decryption(_))));
}

#[test]
fn tampered_nonce_detected() {
    let kp = keypair();
    let mut packed = seal(b"user-key", &kp.public_bytes()).unwrap();
    packed[32] ^= 0x01;

    assert!(kp.open(&packed).is_err());
}

#[test]
fn tampered_ephemeral_key_detected() {
    let kp = keypair();
    let mut packed = seal(b"user-key", &kp.public_bytes()).unwrap();
    packed[0] ^= 0x01;

    assert!(kp.open(&packed).is_err());
}

#[test]
fn empty_and_large_secrets_roundtrip() {
    let kp = keypair();
    for secret in [Vec::new(), vec![0xAB; 4096]] {
        let packed = seal(&secret, &kp.public_bytes()).unwrap();
        assert_eq!(kp.open(&packed).unwrap(), secret);
    }
}

#[test]
fn each_seal_is_unique() {
    let kp = keypair();
    let a = seal(b"same", &kp.public_bytes()).unwrap();
    let b = seal(b"same", &kp.public_bytes()).unwrap();
    assert_ne!(a, b);
    assert_eq!(kp.open(&a).unwrap(), kp.open(&b).unwrap());
}
