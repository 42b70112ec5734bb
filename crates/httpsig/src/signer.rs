//! Request signing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use http::HeaderValue;
use http::header::{AUTHORIZATION, DATE};
use tracing::debug;

use crate::algorithm::{Algorithm, AlgorithmRegistry};
use crate::canonical;
use crate::clock::format_http_date;
use crate::config::SignerConfig;
use crate::crypto;
use crate::error::{SignatureError, SignatureResult};
use crate::params::{SIGNATURE_HEADER, SignatureConfig, SignatureParameters};
use crate::request::SignableRequest;

/// Compute the base64 signature for resolved parameters.
///
/// # Errors
///
/// Returns [`SignatureError::InvalidKey`] if the key is not valid base64 or not
/// usable with `algorithm`.
pub fn compute_signature(
    params: &SignatureParameters,
    algorithm: &Algorithm,
    key: &str,
) -> SignatureResult<String> {
    let key = crypto::decode_key(key)?;
    let signing_string = params.signing_string();
    debug!(key_id = %params.key_id(), signing_string = ?signing_string, "Built signing string");

    let signature = crypto::sign(algorithm, &key, signing_string.as_bytes())?;
    Ok(BASE64.encode(signature))
}

/// Signs requests with a fixed algorithm and header list.
///
/// # Examples
///
/// ```
/// use httpsig::Signer;
///
/// let mut request = http::Request::builder()
///     .method("POST")
///     .uri("https://example.com/foo?param=value&pet=dog")
///     .header("Host", "example.com")
///     .header("Date", "Sun, 05 Jan 2014 21:31:40 GMT")
///     .body(())
///     .unwrap();
///
/// let signer = Signer::new("hmac-sha256", &["(request-target)", "host", "date"]);
/// signer.sign_request(&mut request, "Test", "c2VjcmV0").unwrap();
///
/// let header = request.headers()["signature"].to_str().unwrap();
/// assert!(header.starts_with(r#"keyId="Test",algorithm="hmac-sha256","#));
/// ```
#[derive(Debug, Clone)]
pub struct Signer {
    algorithm: String,
    headers: Vec<String>,
    registry: Option<AlgorithmRegistry>,
    stamp_date: bool,
}

impl Signer {
    /// Create a signer. An empty header list signs `date` only.
    #[must_use]
    pub fn new(algorithm: &str, headers: &[&str]) -> Self {
        Self {
            algorithm: algorithm.to_owned(),
            headers: headers.iter().map(|name| (*name).to_owned()).collect(),
            registry: None,
            stamp_date: false,
        }
    }

    /// Create a signer from loaded configuration.
    #[must_use]
    pub fn from_config(config: &SignerConfig) -> Self {
        Self {
            algorithm: config.algorithm.clone(),
            headers: config.headers.clone(),
            registry: None,
            stamp_date: false,
        }
    }

    /// Resolve algorithm names in `registry` instead of the default one.
    #[must_use]
    pub fn with_registry(mut self, registry: AlgorithmRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Add a `Date` header with the current time to requests that lack one,
    /// when `date` is part of the header list.
    #[must_use]
    pub fn with_date_stamping(mut self, enabled: bool) -> Self {
        self.stamp_date = enabled;
        self
    }

    fn registry(&self) -> &AlgorithmRegistry {
        self.registry
            .as_ref()
            .unwrap_or(AlgorithmRegistry::global())
    }

    /// Compute signed parameters for `request` without attaching them.
    ///
    /// Only reads the request, except for the optional `Date` stamping.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an empty key id or an unknown
    /// algorithm, and a request error when a listed header cannot be resolved.
    pub fn sign<R>(
        &self,
        request: &mut R,
        key_id: &str,
        key: &str,
    ) -> SignatureResult<SignatureParameters>
    where
        R: SignableRequest + ?Sized,
    {
        let headers: Vec<&str> = self.headers.iter().map(String::as_str).collect();
        let config = SignatureConfig::from_config_with_registry(
            self.registry(),
            key_id,
            &self.algorithm,
            &headers,
        )?;

        if self.stamp_date
            && config.header_list().iter().any(|name| name == canonical::DATE)
            && !request.header_map().contains_key(DATE)
        {
            let now = format_http_date(Utc::now());
            let value = HeaderValue::from_str(&now)
                .map_err(|_| SignatureError::InvalidHeaderValue(DATE.to_string()))?;
            request.header_map_mut().insert(DATE, value);
        }

        let params = config.resolve(request)?;
        let signature = compute_signature(&params, config.algorithm(), key)?;
        Ok(params.with_signature(signature))
    }

    /// Sign `request` and attach the result as a `Signature` header.
    ///
    /// # Errors
    ///
    /// See [`Signer::sign`].
    pub fn sign_request<R>(&self, request: &mut R, key_id: &str, key: &str) -> SignatureResult<()>
    where
        R: SignableRequest + ?Sized,
    {
        let params = self.sign(request, key_id, key)?;
        let value = params.to_header_value()?;
        request.header_map_mut().insert(SIGNATURE_HEADER.clone(), value);
        Ok(())
    }

    /// Sign `request` and attach the result as an `Authorization: Signature ...`
    /// header.
    ///
    /// # Errors
    ///
    /// See [`Signer::sign`].
    pub fn auth_request<R>(&self, request: &mut R, key_id: &str, key: &str) -> SignatureResult<()>
    where
        R: SignableRequest + ?Sized,
    {
        let params = self.sign(request, key_id, key)?;
        let value = params.to_authorization_value()?;
        request.header_map_mut().insert(AUTHORIZATION, value);
        Ok(())
    }
}
