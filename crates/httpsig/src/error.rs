//! Error types for HTTP signature handling.
//!
//! Every failure is a variant of [`SignatureError`]. Each variant knows whether
//! it stems from a misconfigured signer/verifier or from a malformed request, and
//! maps to a transport status code accordingly. A signature that is well-formed
//! but does not match is *not* an error; verification reports it as `Ok(false)`.

use http::StatusCode;

/// Which side of the exchange is responsible for a [`SignatureError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The signer or verifier is misconfigured (server-side problem).
    Configuration,
    /// The request is malformed or incomplete (client-side problem).
    Request,
}

/// The signature parameters that must appear in a signature header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureParameter {
    /// `keyId`
    KeyId,
    /// `algorithm`
    Algorithm,
    /// `signature`
    Signature,
}

impl SignatureParameter {
    /// The wire name of the parameter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeyId => "keyId",
            Self::Algorithm => "algorithm",
            Self::Signature => "signature",
        }
    }
}

impl std::fmt::Display for SignatureParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while signing or verifying an HTTP request.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    /// The signer was configured without a key identifier.
    #[error("No key id configured")]
    NoKeyIdConfigured,

    /// The signer was configured without an algorithm.
    #[error("No algorithm configured")]
    NoAlgorithmConfigured,

    /// The algorithm name is not present in the algorithm registry.
    #[error("Algorithm not supported: {0}")]
    AlgorithmUnsupported(String),

    /// An allowed clock skew of zero seconds was configured.
    #[error("Allowed clock skew of 0 is not permitted, use a negative value to disable the check")]
    AllowedClockSkewMisconfigured,

    /// Neither a `Signature` nor an `Authorization` header is present.
    #[error("No signature header found in request")]
    NoSignatureHeaderFoundInRequest,

    /// A mandatory parameter is missing from the signature header.
    #[error("Missing signature parameter: {0}")]
    MissingSignatureParameter(SignatureParameter),

    /// A header named in the header list is not present on the request.
    #[error("Missing required header: '{0}'")]
    MissingRequiredHeader(String),

    /// The request carries no method, so `(request-target)` cannot be built.
    #[error("Method not in request")]
    MethodNotInRequest,

    /// The request carries no URL, so `(request-target)` cannot be built.
    #[error("URL not in request")]
    UrlNotInRequest,

    /// A header value is not visible ASCII, or cannot be encoded as one.
    #[error("Invalid header value: '{0}'")]
    InvalidHeaderValue(String),

    /// The timestamp header is not a valid HTTP date.
    #[error("Invalid date header: {0}")]
    InvalidDate(#[from] chrono::ParseError),

    /// The request was signed with an algorithm outside the allow-list.
    #[error("Algorithm not allowed: {0}")]
    AlgorithmNotAllowed(String),

    /// A header the verifier requires is not covered by the signature.
    #[error("Required header not in header list: '{0}'")]
    RequiredHeaderNotInHeaderList(String),

    /// Clock skew checking is enabled but no `X-Date`/`Date` was signed.
    #[error("Date header is missing for clock skew comparison")]
    DateHeaderMissingForClockSkew,

    /// The signed timestamp is older than the allowed clock skew.
    #[error("Allowed clock skew exceeded")]
    AllowedClockSkewExceeded,

    /// The key material could not be decoded or parsed.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The signature value is not valid base64.
    #[error("Signature is not valid base64")]
    InvalidSignatureEncoding,

    /// The cryptographic backend failed to produce a signature.
    #[error("Signing failed")]
    SigningFailed,
}

impl SignatureError {
    /// Returns which side of the exchange caused this error.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NoKeyIdConfigured
            | Self::NoAlgorithmConfigured
            | Self::AlgorithmUnsupported(_)
            | Self::AllowedClockSkewMisconfigured
            | Self::InvalidKey(_)
            | Self::SigningFailed => ErrorClass::Configuration,
            Self::NoSignatureHeaderFoundInRequest
            | Self::MissingSignatureParameter(_)
            | Self::MissingRequiredHeader(_)
            | Self::MethodNotInRequest
            | Self::UrlNotInRequest
            | Self::InvalidHeaderValue(_)
            | Self::InvalidDate(_)
            | Self::AlgorithmNotAllowed(_)
            | Self::RequiredHeaderNotInHeaderList(_)
            | Self::DateHeaderMissingForClockSkew
            | Self::AllowedClockSkewExceeded
            | Self::InvalidSignatureEncoding => ErrorClass::Request,
        }
    }

    /// Returns the HTTP status code a server should answer with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.class() {
            ErrorClass::Configuration => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorClass::Request => StatusCode::BAD_REQUEST,
        }
    }
}

/// Errors returned by request verification.
///
/// Key lookup failures are handed back exactly as the caller's lookup produced
/// them; they are not folded into the [`SignatureError`] taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum VerifyRequestError<E>
where
    E: std::error::Error + 'static,
{
    /// The request or verifier configuration was rejected.
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// The caller-supplied key lookup failed.
    #[error(transparent)]
    KeyLookup(E),
}

impl<E> VerifyRequestError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns the HTTP status code for signature errors.
    ///
    /// Key lookup errors are opaque to this crate, so `None` is returned for them.
    #[must_use]
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Signature(err) => Some(err.status_code()),
            Self::KeyLookup(_) => None,
        }
    }
}

/// Convenience result type for signature operations.
pub type SignatureResult<T> = Result<T, SignatureError>;
