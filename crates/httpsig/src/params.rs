//! Signature parameters: building them from configuration (signing) or from
//! the signature header of an incoming request (verification).
//!
//! Population happens in stages, each stage producing its own type:
//!
//! - [`SignatureConfig`] - validated signer configuration, headers unresolved.
//! - [`ParsedSignature`] - parameters read off the wire, headers unresolved.
//! - [`SignatureParameters`] - headers resolved against a request. Immutable
//!   apart from attaching a computed signature, which consumes the value.
//!
//! The wire format is a comma-separated list of `key="value"` pairs:
//!
//! ```text
//! keyId="Test",algorithm="hmac-sha256",headers="(request-target) host date",signature="..."
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use http::{HeaderName, HeaderValue, header::AUTHORIZATION};
use regex::Regex;
use tracing::debug;

use crate::algorithm::{Algorithm, AlgorithmRegistry};
use crate::canonical::{self, HeaderValues};
use crate::error::{SignatureError, SignatureParameter, SignatureResult};
use crate::request::SignableRequest;

/// The dedicated `Signature` header.
pub static SIGNATURE_HEADER: HeaderName = HeaderName::from_static("signature");

/// The scheme prefix used when the parameters travel in `Authorization`.
pub const AUTHORIZATION_SCHEME: &str = "Signature";

// Keys are anchored to the start of the input or a comma, so an unknown key
// such as `x_keyId` never matches as its `keyId` suffix.
static PARAM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|,)\s*([^\s=,"]+)\s*=\s*"([^"]*)""#).expect("parameter pattern is valid")
});

/// Validated signer configuration.
///
/// # Examples
///
/// ```
/// use httpsig::SignatureConfig;
///
/// let config = SignatureConfig::from_config("Test", "hmac-sha256", &[]).unwrap();
/// assert_eq!(config.header_list(), ["date"]);
///
/// assert!(SignatureConfig::from_config("", "hmac-sha256", &[]).is_err());
/// assert!(SignatureConfig::from_config("Test", "", &[]).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureConfig {
    key_id: String,
    algorithm: Algorithm,
    header_list: Vec<String>,
}

impl SignatureConfig {
    /// Build a configuration, resolving the algorithm in the default registry.
    ///
    /// An empty `headers` slice means `["date"]`.
    pub fn from_config(key_id: &str, algorithm: &str, headers: &[&str]) -> SignatureResult<Self> {
        Self::from_config_with_registry(AlgorithmRegistry::global(), key_id, algorithm, headers)
    }

    /// Build a configuration, resolving the algorithm in `registry`.
    pub fn from_config_with_registry(
        registry: &AlgorithmRegistry,
        key_id: &str,
        algorithm: &str,
        headers: &[&str],
    ) -> SignatureResult<Self> {
        if key_id.is_empty() {
            return Err(SignatureError::NoKeyIdConfigured);
        }
        if algorithm.is_empty() {
            return Err(SignatureError::NoAlgorithmConfigured);
        }
        let algorithm = registry
            .resolve(algorithm)
            .cloned()
            .ok_or_else(|| SignatureError::AlgorithmUnsupported(algorithm.to_owned()))?;

        Ok(Self {
            key_id: key_id.to_owned(),
            algorithm,
            header_list: canonical::normalize_header_list(headers.iter().copied()),
        })
    }

    /// The key identifier.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The resolved algorithm.
    #[must_use]
    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    /// The lowercased header list.
    #[must_use]
    pub fn header_list(&self) -> &[String] {
        &self.header_list
    }

    /// Resolve the header list against an outgoing request.
    ///
    /// The request is only read.
    pub fn resolve<R>(&self, request: &R) -> SignatureResult<SignatureParameters>
    where
        R: SignableRequest + ?Sized,
    {
        let headers = canonical::resolve_headers(&self.header_list, request)?;
        Ok(SignatureParameters {
            key_id: self.key_id.clone(),
            algorithm: self.algorithm.name().to_owned(),
            headers,
            signature: None,
        })
    }
}

/// Signature parameters as read from a signature header, before the header
/// list has been resolved against the request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSignature {
    /// The `keyId` parameter.
    pub key_id: String,
    /// The `algorithm` parameter, not yet checked against any registry.
    pub algorithm: String,
    /// The `headers` parameter, lowercased; `["date"]` when absent.
    pub headers: Vec<String>,
    /// The `signature` parameter, still base64-encoded.
    pub signature: String,
}

impl ParsedSignature {
    /// Parse a signature parameter string.
    ///
    /// A leading `Signature ` scheme is accepted. Unknown keys are ignored and
    /// the last occurrence of a repeated key wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use httpsig::ParsedSignature;
    ///
    /// let parsed = ParsedSignature::parse(
    ///     r#"keyId="Test",algorithm="hmac-sha256",signature="fffff",signature="abcde""#,
    /// )
    /// .unwrap();
    /// assert_eq!(parsed.signature, "abcde");
    /// assert_eq!(parsed.headers, ["date"]);
    /// ```
    pub fn parse(input: &str) -> SignatureResult<Self> {
        let input = strip_scheme(input);

        let mut key_id = None;
        let mut algorithm = None;
        let mut headers = None;
        let mut signature = None;

        for captures in PARAM_PATTERN.captures_iter(input) {
            let value = captures.get(2).map_or("", |m| m.as_str());
            match captures.get(1).map_or("", |m| m.as_str()) {
                "keyId" => key_id = Some(value),
                "algorithm" => algorithm = Some(value),
                "headers" => headers = Some(value),
                "signature" => signature = Some(value),
                _ => {}
            }
        }

        let required = |value: Option<&str>, param| {
            value
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned)
                .ok_or(SignatureError::MissingSignatureParameter(param))
        };

        Ok(Self {
            key_id: required(key_id, SignatureParameter::KeyId)?,
            algorithm: required(algorithm, SignatureParameter::Algorithm)?,
            headers: canonical::normalize_header_list(
                headers.unwrap_or_default().split_whitespace(),
            ),
            signature: required(signature, SignatureParameter::Signature)?,
        })
    }

    /// Locate and parse the signature header of a request.
    ///
    /// The dedicated `Signature` header is preferred over `Authorization`.
    pub fn from_request<R>(request: &R) -> SignatureResult<Self>
    where
        R: SignableRequest + ?Sized,
    {
        let headers = request.header_map();
        let (name, value) = if let Some(value) = headers.get(&SIGNATURE_HEADER) {
            (SIGNATURE_HEADER.as_str(), value)
        } else if let Some(value) = headers.get(AUTHORIZATION) {
            (AUTHORIZATION.as_str(), value)
        } else {
            return Err(SignatureError::NoSignatureHeaderFoundInRequest);
        };

        let value = value
            .to_str()
            .map_err(|_| SignatureError::InvalidHeaderValue(name.to_owned()))?;

        debug!(header = name, value, "Parsing signature header");

        Self::parse(value)
    }

    /// Resolve the header list against the request the signature came with.
    pub fn resolve<R>(self, request: &R) -> SignatureResult<SignatureParameters>
    where
        R: SignableRequest + ?Sized,
    {
        let headers = canonical::resolve_headers(&self.headers, request)?;
        Ok(SignatureParameters {
            key_id: self.key_id,
            algorithm: self.algorithm,
            headers,
            signature: Some(self.signature),
        })
    }
}

impl FromStr for ParsedSignature {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn strip_scheme(input: &str) -> &str {
    let trimmed = input.trim_start();
    match trimmed.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case(AUTHORIZATION_SCHEME) => rest,
        _ => trimmed,
    }
}

/// Fully resolved signature parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureParameters {
    key_id: String,
    algorithm: String,
    headers: HeaderValues,
    signature: Option<String>,
}

impl SignatureParameters {
    /// Parse the signature header of an incoming request and resolve its header
    /// list against that request.
    pub fn from_request<R>(request: &R) -> SignatureResult<Self>
    where
        R: SignableRequest + ?Sized,
    {
        ParsedSignature::from_request(request)?.resolve(request)
    }

    /// The key identifier.
    #[must_use]
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The algorithm name.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The header list, in signing order.
    pub fn header_list(&self) -> impl Iterator<Item = &str> {
        self.headers.names()
    }

    /// The resolved header values.
    #[must_use]
    pub fn headers(&self) -> &HeaderValues {
        &self.headers
    }

    /// The base64-encoded signature, once computed or read from the wire.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// The string that is signed.
    #[must_use]
    pub fn signing_string(&self) -> String {
        canonical::build_signing_string(&self.headers)
    }

    /// Attach a computed signature.
    #[must_use]
    pub fn with_signature(self, signature: impl Into<String>) -> Self {
        Self {
            signature: Some(signature.into()),
            ..self
        }
    }

    /// Encode the parameters as a header value for the `Signature` header.
    pub fn to_header_value(&self) -> SignatureResult<HeaderValue> {
        HeaderValue::from_str(&self.to_string())
            .map_err(|_| SignatureError::InvalidHeaderValue(SIGNATURE_HEADER.to_string()))
    }

    /// Encode the parameters as a header value for the `Authorization` header.
    pub fn to_authorization_value(&self) -> SignatureResult<HeaderValue> {
        HeaderValue::from_str(&format!("{AUTHORIZATION_SCHEME} {self}"))
            .map_err(|_| SignatureError::InvalidHeaderValue(AUTHORIZATION.to_string()))
    }
}

impl fmt::Display for SignatureParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "keyId=\"{}\",algorithm=\"{}\",headers=\"",
            self.key_id, self.algorithm
        )?;
        for (i, name) in self.headers.names().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(name)?;
        }
        f.write_str("\"")?;
        if let Some(signature) = &self.signature {
            write!(f, ",signature=\"{signature}\"")?;
        }
        Ok(())
    }
}
