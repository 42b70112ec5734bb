//! Request verification.
//!
//! The verification flow for an incoming request is:
//!
//! 1. Parse the `Signature` (or `Authorization: Signature ...`) header and
//!    resolve its header list against the request.
//! 2. Reject algorithms outside the allow-list.
//! 3. Reject signatures that do not cover every required header.
//! 4. Check the signed `x-date`/`date` against the allowed clock skew.
//! 5. Look up the key for `keyId` through the caller's [`KeyLookup`].
//! 6. Rebuild the signing string and check the signature.
//!
//! A signature that does not match yields `Ok(false)`; every other failure is an
//! error. The main entry point is [`verify_request`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::algorithm::AlgorithmRegistry;
use crate::clock;
use crate::config::VerifierConfig;
use crate::crypto;
use crate::error::{SignatureError, SignatureParameter, SignatureResult, VerifyRequestError};
use crate::params::SignatureParameters;
use crate::request::SignableRequest;

/// Resolves a key identifier to base64 key material.
///
/// Implemented for any `Fn(&str) -> Result<String, E>`, so a closure can be
/// passed wherever a `KeyLookup` is expected.
pub trait KeyLookup {
    /// The error produced when no key can be resolved.
    type Error: std::error::Error + 'static;

    /// Retrieve the base64 key for `key_id`.
    ///
    /// # Errors
    ///
    /// Returns the implementation's error when the key cannot be resolved.
    fn lookup_key(&self, key_id: &str) -> Result<String, Self::Error>;
}

impl<F, E> KeyLookup for F
where
    F: Fn(&str) -> Result<String, E>,
    E: std::error::Error + 'static,
{
    type Error = E;

    fn lookup_key(&self, key_id: &str) -> Result<String, E> {
        self(key_id)
    }
}

/// Error returned by [`StaticKeys`] for an unknown key identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown key id: {0}")]
pub struct UnknownKeyId(pub String);

/// An in-memory [`KeyLookup`] backed by a `HashMap`.
///
/// # Examples
///
/// ```
/// use httpsig::verify::{KeyLookup, StaticKeys};
///
/// let keys = StaticKeys::new(vec![("Test".to_owned(), "c2VjcmV0".to_owned())]);
/// assert_eq!(keys.lookup_key("Test").unwrap(), "c2VjcmV0");
/// assert!(keys.lookup_key("Other").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticKeys {
    keys: HashMap<String, String>,
}

impl StaticKeys {
    /// Create a lookup from `(key_id, base64_key)` pairs.
    pub fn new(keys: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }
}

impl KeyLookup for StaticKeys {
    type Error = UnknownKeyId;

    fn lookup_key(&self, key_id: &str) -> Result<String, UnknownKeyId> {
        self.keys
            .get(key_id)
            .cloned()
            .ok_or_else(|| UnknownKeyId(key_id.to_owned()))
    }
}

/// Check the signature carried by `params` against `key`.
///
/// # Errors
///
/// Returns [`SignatureError::AlgorithmUnsupported`] if `registry` does not know
/// the algorithm, and a decoding error if the key or signature is malformed.
pub fn verify_signature(
    params: &SignatureParameters,
    registry: &AlgorithmRegistry,
    key: &str,
) -> SignatureResult<bool> {
    let provided = params.signature().ok_or(SignatureError::MissingSignatureParameter(
        SignatureParameter::Signature,
    ))?;
    let algorithm = registry
        .resolve(params.algorithm())
        .ok_or_else(|| SignatureError::AlgorithmUnsupported(params.algorithm().to_owned()))?;

    let key = crypto::decode_key(key)?;
    let provided = crypto::decode_signature(provided)?;
    let signing_string = params.signing_string();
    debug!(key_id = %params.key_id(), signing_string = ?signing_string, "Rebuilt signing string");

    let valid = crypto::verify(algorithm, &key, signing_string.as_bytes(), &provided)?;
    if valid {
        debug!(key_id = %params.key_id(), "Signature verification succeeded");
    } else {
        debug!(key_id = %params.key_id(), algorithm = %algorithm.name(), "Signature mismatch");
    }
    Ok(valid)
}

/// Verifies incoming requests against a fixed policy.
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    config: VerifierConfig,
    registry: Option<AlgorithmRegistry>,
}

impl Verifier {
    /// Create a verifier.
    ///
    /// A negative `allowed_clock_skew` disables the freshness check.
    #[must_use]
    pub fn new(
        allowed_clock_skew: i64,
        allowed_algorithms: &[&str],
        required_headers: &[&str],
    ) -> Self {
        Self::from_config(VerifierConfig {
            allowed_clock_skew,
            allowed_algorithms: allowed_algorithms.iter().map(|s| (*s).to_owned()).collect(),
            required_headers: required_headers.iter().map(|s| (*s).to_owned()).collect(),
        })
    }

    /// Create a verifier from loaded configuration.
    #[must_use]
    pub fn from_config(config: VerifierConfig) -> Self {
        Self {
            config,
            registry: None,
        }
    }

    /// Resolve algorithm names in `registry` instead of the default one.
    #[must_use]
    pub fn with_registry(mut self, registry: AlgorithmRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// The verifier's policy.
    #[must_use]
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    fn registry(&self) -> &AlgorithmRegistry {
        self.registry
            .as_ref()
            .unwrap_or(AlgorithmRegistry::global())
    }

    /// Verify `request`, checking freshness against the current time.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyRequestError::KeyLookup`] with the lookup's own error when
    /// the key cannot be resolved, and [`VerifyRequestError::Signature`] for
    /// every other failure.
    pub fn verify<R, K>(&self, request: &R, keys: &K) -> Result<bool, VerifyRequestError<K::Error>>
    where
        R: SignableRequest + ?Sized,
        K: KeyLookup + ?Sized,
    {
        self.verify_at(request, keys, Utc::now())
    }

    /// Verify `request`, checking freshness against `now`.
    ///
    /// # Errors
    ///
    /// See [`Verifier::verify`].
    pub fn verify_at<R, K>(
        &self,
        request: &R,
        keys: &K,
        now: DateTime<Utc>,
    ) -> Result<bool, VerifyRequestError<K::Error>>
    where
        R: SignableRequest + ?Sized,
        K: KeyLookup + ?Sized,
    {
        let params = SignatureParameters::from_request(request)?;
        debug!(key_id = %params.key_id(), algorithm = %params.algorithm(), "Verifying signature");

        self.check_policy(&params, now)?;

        let key = keys
            .lookup_key(params.key_id())
            .map_err(VerifyRequestError::KeyLookup)?;

        Ok(verify_signature(&params, self.registry(), &key)?)
    }

    fn check_policy(
        &self,
        params: &SignatureParameters,
        now: DateTime<Utc>,
    ) -> SignatureResult<()> {
        if !self
            .config
            .allowed_algorithms
            .iter()
            .any(|allowed| allowed == params.algorithm())
        {
            return Err(SignatureError::AlgorithmNotAllowed(
                params.algorithm().to_owned(),
            ));
        }

        for name in &self.config.required_headers {
            if params.headers().get(name).is_none_or(str::is_empty) {
                return Err(SignatureError::RequiredHeaderNotInHeaderList(
                    name.to_ascii_lowercase(),
                ));
            }
        }

        clock::check_freshness_at(params.headers(), self.config.allowed_clock_skew, now)
    }
}

/// Verify the signature on `request`.
///
/// # Errors
///
/// See [`Verifier::verify`].
///
/// # Examples
///
/// ```
/// use httpsig::{Signer, verify_request};
/// use httpsig::verify::StaticKeys;
///
/// let mut request = http::Request::builder()
///     .method("GET")
///     .uri("/foo")
///     .header("Host", "example.com")
///     .header("Date", "Sun, 05 Jan 2014 21:31:40 GMT")
///     .body(())
///     .unwrap();
///
/// Signer::new("hmac-sha256", &["(request-target)", "host", "date"])
///     .sign_request(&mut request, "Test", "c2VjcmV0")
///     .unwrap();
///
/// let keys = StaticKeys::new(vec![("Test".to_owned(), "c2VjcmV0".to_owned())]);
/// let valid = verify_request(&request, &keys, -1, &["hmac-sha256"], &["host"]).unwrap();
/// assert!(valid);
/// ```
pub fn verify_request<R, K>(
    request: &R,
    keys: &K,
    allowed_clock_skew: i64,
    allowed_algorithms: &[&str],
    required_headers: &[&str],
) -> Result<bool, VerifyRequestError<K::Error>>
where
    R: SignableRequest + ?Sized,
    K: KeyLookup + ?Sized,
{
    Verifier::new(allowed_clock_skew, allowed_algorithms, required_headers).verify(request, keys)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use http::{HeaderValue, Method};

    use super::*;
    use crate::params::SIGNATURE_HEADER;
    use crate::request::OutgoingRequest;
    use crate::signer::Signer;

    const KEY: &str = "U29tZVNlY3JldEtleQ==";
    const DATE: &str = "Sun, 05 Jan 2014 21:31:40 GMT";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2014, 1, 5, 21, 32, 0).unwrap()
    }

    fn keys() -> StaticKeys {
        StaticKeys::new(vec![("Test".to_owned(), KEY.to_owned())])
    }

    fn signed(headers: &[&str]) -> OutgoingRequest {
        let mut request = OutgoingRequest::new(
            Method::POST,
            "https://www.example.com/foo?param=value&pet=dog".parse().unwrap(),
        )
        .with_header(http::header::HOST, HeaderValue::from_static("example.com"))
        .with_header(http::header::DATE, HeaderValue::from_static(DATE));
        Signer::new("hmac-sha256", headers)
            .sign_request(&mut request, "Test", KEY)
            .unwrap();
        request
    }

    fn verifier(required: &[&str]) -> Verifier {
        Verifier::new(300, &["hmac-sha256"], required)
    }

    #[test]
    fn test_should_verify_signed_request() {
        let request = signed(&["(request-target)", "host", "date"]);
        let valid = verifier(&["host"]).verify_at(&request, &keys(), now()).unwrap();
        assert!(valid);
    }

    #[test]
    fn test_should_return_false_for_wrong_key() {
        let request = signed(&["date"]);
        let keys = StaticKeys::new(vec![("Test".to_owned(), "b3RoZXI=".to_owned())]);
        let valid = verifier(&[]).verify_at(&request, &keys, now()).unwrap();
        assert!(!valid);
    }

    #[test]
    fn test_should_reject_disallowed_algorithm() {
        let request = signed(&["date"]);
        let err = Verifier::new(300, &["rsa-sha256"], &[])
            .verify_at(&request, &keys(), now())
            .unwrap_err();
        assert!(matches!(
            err,
            VerifyRequestError::Signature(SignatureError::AlgorithmNotAllowed(ref name))
                if name == "hmac-sha256"
        ));
        assert_eq!(err.status_code(), Some(http::StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_should_reject_uncovered_required_header() {
        let request = signed(&["date"]);
        let err = verifier(&["Host"])
            .verify_at(&request, &keys(), now())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Required header not in header list: 'host'"
        );
    }

    #[test]
    fn test_should_check_clock_skew_before_key_lookup() {
        let request = signed(&["date"]);
        let lookup = |_: &str| -> Result<String, std::io::Error> {
            panic!("key lookup must not run for stale requests")
        };
        let late = now() + chrono::Duration::seconds(3_600);
        let err = verifier(&[]).verify_at(&request, &lookup, late).unwrap_err();
        assert!(matches!(
            err,
            VerifyRequestError::Signature(SignatureError::AllowedClockSkewExceeded)
        ));
    }

    #[test]
    fn test_should_pass_key_lookup_error_through() {
        let request = signed(&["date"]);
        let lookup =
            |_: &str| -> Result<String, std::io::Error> { Err(std::io::Error::other("offline")) };
        let err = verifier(&[]).verify_at(&request, &lookup, now()).unwrap_err();
        match err {
            VerifyRequestError::KeyLookup(inner) => assert_eq!(inner.to_string(), "offline"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_should_report_unknown_key_id_from_static_keys() {
        let request = signed(&["date"]);
        let err = verifier(&[])
            .verify_at(&request, &StaticKeys::default(), now())
            .unwrap_err();
        assert!(matches!(err, VerifyRequestError::KeyLookup(UnknownKeyId(id)) if id == "Test"));
    }

    #[test]
    fn test_should_return_false_for_tampered_signature() {
        let mut request = signed(&["date"]);
        let value = request.headers().get(&SIGNATURE_HEADER).unwrap().to_str().unwrap();
        let (head, signature) = value.split_once("signature=\"").unwrap();
        let mut bytes = crypto::decode_signature(signature.trim_end_matches('"')).unwrap();
        bytes[0] ^= 0x80;
        let tampered = format!(
            "{head}signature=\"{}\"",
            base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
        );
        request
            .header_map_mut()
            .insert(SIGNATURE_HEADER.clone(), HeaderValue::from_str(&tampered).unwrap());

        assert!(!verifier(&[]).verify_at(&request, &keys(), now()).unwrap());
    }

    #[test]
    fn test_should_reject_malformed_signature_encoding() {
        let request = OutgoingRequest::default()
            .with_header(http::header::DATE, HeaderValue::from_static(DATE))
            .with_header(
                SIGNATURE_HEADER.clone(),
                HeaderValue::from_static(r#"keyId="Test",algorithm="hmac-sha256",signature="@@@""#),
            );
        let err = verifier(&[]).verify_at(&request, &keys(), now()).unwrap_err();
        assert!(matches!(
            err,
            VerifyRequestError::Signature(SignatureError::InvalidSignatureEncoding)
        ));
    }

    #[test]
    fn test_should_fail_for_allowed_but_unregistered_algorithm() {
        let request = OutgoingRequest::default()
            .with_header(http::header::DATE, HeaderValue::from_static(DATE))
            .with_header(
                SIGNATURE_HEADER.clone(),
                HeaderValue::from_static(r#"keyId="Test",algorithm="hmac-md5",signature="AAAA""#),
            );
        let err = Verifier::new(-1, &["hmac-md5"], &[])
            .verify_at(&request, &keys(), now())
            .unwrap_err();
        assert!(matches!(
            err,
            VerifyRequestError::Signature(SignatureError::AlgorithmUnsupported(_))
        ));
        assert_eq!(err.status_code(), Some(http::StatusCode::INTERNAL_SERVER_ERROR));
    }
}
