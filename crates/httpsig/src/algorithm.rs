//! Signature algorithm registry.
//!
//! Algorithms are looked up by their wire name (the `algorithm` signature
//! parameter). Each entry records the hash function and whether the algorithm
//! is a shared-secret keyed hash or a public-key signature scheme.
//!
//! The registry shipped with the crate contains:
//!
//! | Name          | Mode      | Hash    |
//! |---------------|-----------|---------|
//! | `hmac-sha1`   | HMAC      | SHA-1   |
//! | `hmac-sha256` | HMAC      | SHA-256 |
//! | `hmac-sha512` | HMAC      | SHA-512 |
//! | `rsa-sha256`  | RSA PKCS#1 v1.5 | SHA-256 |
//! | `rsa-sha512`  | RSA PKCS#1 v1.5 | SHA-512 |
//! | `ed25519`     | Ed25519   | SHA-512 |

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Hash function used by an algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashFunction {
    /// SHA-1
    Sha1,
    /// SHA-256
    Sha256,
    /// SHA-512
    Sha512,
}

/// How an algorithm turns the signing string into a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmMode {
    /// Shared-secret keyed hash (HMAC).
    Hmac,
    /// RSASSA-PKCS1-v1_5 signature.
    RsaPkcs1,
    /// Ed25519 signature.
    Ed25519,
}

impl AlgorithmMode {
    /// Whether signer and verifier share the same secret key.
    #[must_use]
    pub fn is_symmetric(self) -> bool {
        matches!(self, Self::Hmac)
    }
}

/// A registry entry describing a signature algorithm.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Algorithm {
    name: Cow<'static, str>,
    hash: HashFunction,
    mode: AlgorithmMode,
}

impl Algorithm {
    /// `hmac-sha1`
    pub const HMAC_SHA1: Self =
        Self::from_static("hmac-sha1", HashFunction::Sha1, AlgorithmMode::Hmac);
    /// `hmac-sha256`
    pub const HMAC_SHA256: Self =
        Self::from_static("hmac-sha256", HashFunction::Sha256, AlgorithmMode::Hmac);
    /// `hmac-sha512`
    pub const HMAC_SHA512: Self =
        Self::from_static("hmac-sha512", HashFunction::Sha512, AlgorithmMode::Hmac);
    /// `rsa-sha256`
    pub const RSA_SHA256: Self =
        Self::from_static("rsa-sha256", HashFunction::Sha256, AlgorithmMode::RsaPkcs1);
    /// `rsa-sha512`
    pub const RSA_SHA512: Self =
        Self::from_static("rsa-sha512", HashFunction::Sha512, AlgorithmMode::RsaPkcs1);
    /// `ed25519`
    pub const ED25519: Self =
        Self::from_static("ed25519", HashFunction::Sha512, AlgorithmMode::Ed25519);

    /// Create a new algorithm descriptor. The name is stored lowercased.
    #[must_use]
    pub fn new(name: impl Into<String>, hash: HashFunction, mode: AlgorithmMode) -> Self {
        Self {
            name: Cow::Owned(name.into().to_ascii_lowercase()),
            hash,
            mode,
        }
    }

    const fn from_static(name: &'static str, hash: HashFunction, mode: AlgorithmMode) -> Self {
        Self {
            name: Cow::Borrowed(name),
            hash,
            mode,
        }
    }

    /// The wire name of the algorithm.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The hash function the algorithm uses.
    #[must_use]
    pub fn hash(&self) -> HashFunction {
        self.hash
    }

    /// The signing mode of the algorithm.
    #[must_use]
    pub fn mode(&self) -> AlgorithmMode {
        self.mode
    }
}

static DEFAULT_REGISTRY: LazyLock<AlgorithmRegistry> =
    LazyLock::new(AlgorithmRegistry::with_defaults);

/// A mapping from algorithm name to [`Algorithm`].
///
/// The process-wide default registry ([`AlgorithmRegistry::global`]) is read-only.
/// To add algorithms, build an owned registry and pass it to the signer or verifier.
///
/// # Examples
///
/// ```
/// use httpsig::algorithm::{Algorithm, AlgorithmMode, AlgorithmRegistry, HashFunction};
///
/// let mut registry = AlgorithmRegistry::with_defaults();
/// registry.register(Algorithm::new("hs2019-hmac", HashFunction::Sha512, AlgorithmMode::Hmac));
///
/// assert!(registry.resolve("hs2019-hmac").is_some());
/// assert!(AlgorithmRegistry::global().resolve("hs2019-hmac").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AlgorithmRegistry {
    algorithms: HashMap<String, Algorithm>,
}

impl AlgorithmRegistry {
    /// Create a registry with no algorithms.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a registry containing every built-in algorithm.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for algorithm in [
            Algorithm::HMAC_SHA1,
            Algorithm::HMAC_SHA256,
            Algorithm::HMAC_SHA512,
            Algorithm::RSA_SHA256,
            Algorithm::RSA_SHA512,
            Algorithm::ED25519,
        ] {
            registry.register(algorithm);
        }
        registry
    }

    /// The shared, read-only registry of built-in algorithms.
    #[must_use]
    pub fn global() -> &'static Self {
        &DEFAULT_REGISTRY
    }

    /// Add an algorithm, returning the entry it replaced, if any.
    pub fn register(&mut self, algorithm: Algorithm) -> Option<Algorithm> {
        self.algorithms.insert(algorithm.name().to_owned(), algorithm)
    }

    /// Look up an algorithm by its exact (lowercase) name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&Algorithm> {
        self.algorithms.get(name)
    }

    /// Iterate over the registered algorithm names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.algorithms.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_resolve_builtin_algorithms() {
        let registry = AlgorithmRegistry::global();

        let hmac = registry.resolve("hmac-sha256").unwrap();
        assert_eq!(hmac.hash(), HashFunction::Sha256);
        assert!(hmac.mode().is_symmetric());

        let rsa = registry.resolve("rsa-sha256").unwrap();
        assert_eq!(rsa.mode(), AlgorithmMode::RsaPkcs1);
        assert!(!rsa.mode().is_symmetric());

        assert_eq!(registry.names().count(), 6);
    }

    #[test]
    fn test_should_match_names_exactly() {
        let registry = AlgorithmRegistry::global();
        assert!(registry.resolve("HMAC-SHA256").is_none());
        assert!(registry.resolve("hmac-sha256 ").is_none());
        assert!(registry.resolve("hmac-md5").is_none());
    }

    #[test]
    fn test_should_store_registered_names_lowercased() {
        let mut registry = AlgorithmRegistry::empty();
        let replaced = registry.register(Algorithm::new(
            "HMAC-SHA384-Legacy",
            HashFunction::Sha512,
            AlgorithmMode::Hmac,
        ));
        assert!(replaced.is_none());
        assert_eq!(
            registry.resolve("hmac-sha384-legacy").map(Algorithm::name),
            Some("hmac-sha384-legacy")
        );
    }

    #[test]
    fn test_should_replace_existing_entry() {
        let mut registry = AlgorithmRegistry::with_defaults();
        let replaced = registry.register(Algorithm::new(
            "hmac-sha256",
            HashFunction::Sha512,
            AlgorithmMode::Hmac,
        ));
        assert_eq!(replaced, Some(Algorithm::HMAC_SHA256));
        assert_eq!(
            registry.resolve("hmac-sha256").map(Algorithm::hash),
            Some(HashFunction::Sha512)
        );
    }
}
