//! Signature computation and verification primitives.
//!
//! Keys and signatures travel base64-encoded (standard alphabet, padded).
//!
//! | Mode       | Signing key                        | Verification key        |
//! |------------|------------------------------------|-------------------------|
//! | HMAC       | raw secret                         | raw secret              |
//! | RSA PKCS#1 | PKCS#8 or PKCS#1 `RSAPrivateKey`   | PKCS#1 `RSAPublicKey`   |
//! | Ed25519    | PKCS#8                             | raw 32-byte public key  |

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{self, Ed25519KeyPair, RsaKeyPair, UnparsedPublicKey};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, KeyInit, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

use crate::algorithm::{Algorithm, AlgorithmMode, HashFunction};
use crate::error::{SignatureError, SignatureResult};

const ED25519_PUBLIC_KEY_LEN: usize = 32;

macro_rules! keyed_hash {
    ($hash:ty, $key:expr, $message:expr) => {{
        let mut mac =
            Hmac::<$hash>::new_from_slice($key).expect("HMAC can accept keys of any length");
        mac.update($message);
        mac.finalize().into_bytes().to_vec()
    }};
}

/// Decode a base64 key.
pub fn decode_key(encoded: &str) -> SignatureResult<Vec<u8>> {
    BASE64
        .decode(encoded.trim())
        .map_err(|e| SignatureError::InvalidKey(format!("key is not valid base64: {e}")))
}

/// Decode a base64 signature, ignoring any whitespace inside it.
pub fn decode_signature(encoded: &str) -> SignatureResult<Vec<u8>> {
    let compact: String = encoded.split_whitespace().collect();
    BASE64
        .decode(compact)
        .map_err(|_| SignatureError::InvalidSignatureEncoding)
}

/// Sign `message` with `key`, returning the raw signature bytes.
///
/// # Errors
///
/// Returns [`SignatureError::InvalidKey`] if the key cannot be parsed for the
/// algorithm's mode.
pub fn sign(algorithm: &Algorithm, key: &[u8], message: &[u8]) -> SignatureResult<Vec<u8>> {
    match algorithm.mode() {
        AlgorithmMode::Hmac => Ok(hmac_digest(algorithm.hash(), key, message)),
        AlgorithmMode::RsaPkcs1 => {
            let encoding = match algorithm.hash() {
                HashFunction::Sha256 => &signature::RSA_PKCS1_SHA256,
                HashFunction::Sha512 => &signature::RSA_PKCS1_SHA512,
                HashFunction::Sha1 => {
                    return Err(SignatureError::AlgorithmUnsupported(
                        algorithm.name().to_owned(),
                    ));
                }
            };
            let key_pair = RsaKeyPair::from_pkcs8(key)
                .or_else(|_| RsaKeyPair::from_der(key))
                .map_err(|e| SignatureError::InvalidKey(format!("RSA private key: {e}")))?;

            let mut signature = vec![0; key_pair.public_modulus_len()];
            key_pair
                .sign(encoding, &SystemRandom::new(), message, &mut signature)
                .map_err(|_| SignatureError::SigningFailed)?;
            Ok(signature)
        }
        AlgorithmMode::Ed25519 => {
            let key_pair = Ed25519KeyPair::from_pkcs8(key)
                .map_err(|e| SignatureError::InvalidKey(format!("Ed25519 private key: {e}")))?;
            Ok(key_pair.sign(message).as_ref().to_vec())
        }
    }
}

/// Check `signature` over `message` against `key`.
///
/// Returns `Ok(false)` when the signature is well-formed but does not match.
pub fn verify(
    algorithm: &Algorithm,
    key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> SignatureResult<bool> {
    match algorithm.mode() {
        AlgorithmMode::Hmac => {
            let expected = hmac_digest(algorithm.hash(), key, message);
            Ok(expected.ct_eq(signature).into())
        }
        AlgorithmMode::RsaPkcs1 => {
            let params = match algorithm.hash() {
                HashFunction::Sha256 => &signature::RSA_PKCS1_2048_8192_SHA256,
                HashFunction::Sha512 => &signature::RSA_PKCS1_2048_8192_SHA512,
                HashFunction::Sha1 => {
                    return Err(SignatureError::AlgorithmUnsupported(
                        algorithm.name().to_owned(),
                    ));
                }
            };
            Ok(UnparsedPublicKey::new(params, key)
                .verify(message, signature)
                .is_ok())
        }
        AlgorithmMode::Ed25519 => {
            if key.len() != ED25519_PUBLIC_KEY_LEN {
                return Err(SignatureError::InvalidKey(format!(
                    "Ed25519 public key must be {ED25519_PUBLIC_KEY_LEN} bytes, got {}",
                    key.len()
                )));
            }
            Ok(UnparsedPublicKey::new(&signature::ED25519, key)
                .verify(message, signature)
                .is_ok())
        }
    }
}

fn hmac_digest(hash: HashFunction, key: &[u8], message: &[u8]) -> Vec<u8> {
    match hash {
        HashFunction::Sha1 => keyed_hash!(Sha1, key, message),
        HashFunction::Sha256 => keyed_hash!(Sha256, key, message),
        HashFunction::Sha512 => keyed_hash!(Sha512, key, message),
    }
}
