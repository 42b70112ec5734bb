//! HTTP Message Signatures (draft-cavage-http-signatures) for HTTP requests.
//!
//! This crate signs outgoing requests and verifies incoming ones. A signer picks
//! a list of headers (plus the `(request-target)` pseudo-header built from the
//! method and URL), joins them into a deterministic signing string, and signs
//! that string. A verifier rebuilds the same string from the incoming request
//! and checks the signature with a key resolved from the `keyId` parameter.
//!
//! # Usage
//!
//! ```rust
//! use httpsig::verify::StaticKeys;
//! use httpsig::{Signer, Verifier};
//!
//! let mut request = http::Request::builder()
//!     .method("POST")
//!     .uri("https://example.com/foo?param=value&pet=dog")
//!     .header("Host", "example.com")
//!     .header("Date", "Sun, 05 Jan 2014 21:31:40 GMT")
//!     .body(())
//!     .unwrap();
//!
//! // Signing adds `Signature: keyId="Test",algorithm="hmac-sha256",...`.
//! let signer = Signer::new("hmac-sha256", &["(request-target)", "host", "date"]);
//! signer.sign_request(&mut request, "Test", "c2VjcmV0").unwrap();
//!
//! // Verification with the clock-skew check disabled (-1).
//! let keys = StaticKeys::new(vec![("Test".to_owned(), "c2VjcmV0".to_owned())]);
//! let verifier = Verifier::new(-1, &["hmac-sha256"], &["(request-target)"]);
//! assert!(verifier.verify(&request, &keys).unwrap());
//! ```
//!
//! # Modules
//!
//! - [`algorithm`] - Algorithm registry (HMAC, RSA PKCS#1 v1.5, Ed25519)
//! - [`canonical`] - Signing string construction
//! - [`clock`] - HTTP dates and the clock-skew freshness check
//! - [`config`] - Signer and verifier configuration from the environment
//! - [`crypto`] - Signature computation and verification primitives
//! - [`error`] - Error taxonomy and status code mapping
//! - [`params`] - Signature parameters from configuration or the wire
//! - [`request`] - The request surface read and written by signing
//! - [`signer`] - Request signing
//! - [`verify`] - Request verification

pub mod algorithm;
pub mod canonical;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod params;
pub mod request;
pub mod signer;
pub mod verify;

pub use algorithm::{Algorithm, AlgorithmMode, AlgorithmRegistry, HashFunction};
pub use config::{SignerConfig, VerifierConfig};
pub use error::{ErrorClass, SignatureError, SignatureResult, VerifyRequestError};
pub use params::{ParsedSignature, SignatureConfig, SignatureParameters};
pub use request::{OutgoingRequest, SignableRequest};
pub use signer::Signer;
pub use verify::{KeyLookup, StaticKeys, Verifier, verify_request};
