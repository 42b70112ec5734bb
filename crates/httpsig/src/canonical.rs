//! Signing string construction.
//!
//! The signing string is one `name: value` line per entry of the header list,
//! in header-list order, joined by `\n` with no trailing newline:
//!
//! ```text
//! (request-target): post /foo?param=value&pet=dog
//! host: example.com
//! date: Sun, 05 Jan 2014 21:31:40 GMT
//! ```
//!
//! Names are lowercased at every insertion and lookup site so that signer and
//! verifier agree regardless of how either side spells a header.

use http::Method;

use crate::error::{SignatureError, SignatureResult};
use crate::request::{RequestTarget, SignableRequest};

/// The `(request-target)` pseudo-header.
pub const REQUEST_TARGET: &str = "(request-target)";

/// The `date` header.
pub const DATE: &str = "date";

/// The `x-date` header, preferred over `date` for freshness checks.
pub const X_DATE: &str = "x-date";

/// The `host` header.
pub const HOST: &str = "host";

/// Header names and their resolved values, in header-list order.
///
/// A `HeaderValues` only ever comes out of header resolution, so it holds
/// exactly one entry per header-list name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderValues {
    entries: Vec<(String, String)>,
}

impl HeaderValues {
    /// The value resolved for `name` (matched case-insensitively).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether a value was resolved for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// The header names, in header-list order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// The `(name, value)` pairs, in header-list order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of resolved headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no headers were resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normalize a header list: lowercase every name and fall back to `["date"]`
/// when the list is empty.
pub(crate) fn normalize_header_list<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let list: Vec<String> = names
        .into_iter()
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    if list.is_empty() {
        vec![DATE.to_owned()]
    } else {
        list
    }
}

/// Build the `(request-target)` value: lowercased method, a space, the path,
/// then `?query` and `#fragment` verbatim when present.
///
/// # Examples
///
/// ```
/// use http::Method;
/// use httpsig::canonical::request_target_line;
/// use httpsig::request::RequestTarget;
///
/// let target = RequestTarget {
///     path: "/foo",
///     query: Some("param=value&pet=dog"),
///     fragment: Some("bar"),
/// };
/// assert_eq!(
///     request_target_line(&Method::POST, &target),
///     "post /foo?param=value&pet=dog#bar"
/// );
/// ```
#[must_use]
pub fn request_target_line(method: &Method, target: &RequestTarget<'_>) -> String {
    let mut line = format!("{} {}", method.as_str().to_lowercase(), target.path);
    if let Some(query) = target.query {
        line.push('?');
        line.push_str(query);
    }
    if let Some(fragment) = target.fragment {
        line.push('#');
        line.push_str(fragment);
    }
    line
}

/// Resolve every name of `header_list` against `request`.
///
/// `(request-target)` is synthesized from the method and URL. `host` falls back
/// to the URL authority when the request has no `Host` header. Any other name
/// must be present on the request.
pub(crate) fn resolve_headers<R>(
    header_list: &[String],
    request: &R,
) -> SignatureResult<HeaderValues>
where
    R: SignableRequest + ?Sized,
{
    let mut entries = Vec::with_capacity(header_list.len());

    for name in header_list {
        let name = name.to_ascii_lowercase();
        let value = if name == REQUEST_TARGET {
            let method = request
                .request_method()
                .ok_or(SignatureError::MethodNotInRequest)?;
            let target = request
                .request_target()
                .ok_or(SignatureError::UrlNotInRequest)?;
            request_target_line(method, &target)
        } else {
            header_value(request, &name)?
        };
        entries.push((name, value));
    }

    Ok(HeaderValues { entries })
}

fn header_value<R>(request: &R, name: &str) -> SignatureResult<String>
where
    R: SignableRequest + ?Sized,
{
    match request.header_map().get(name) {
        Some(value) => value
            .to_str()
            .map(ToOwned::to_owned)
            .map_err(|_| SignatureError::InvalidHeaderValue(name.to_owned())),
        None if name == HOST => request
            .request_authority()
            .map(ToOwned::to_owned)
            .ok_or_else(|| SignatureError::MissingRequiredHeader(name.to_owned())),
        None => Err(SignatureError::MissingRequiredHeader(name.to_owned())),
    }
}

/// Build the signing string from resolved header values.
///
/// # Examples
///
/// ```
/// use http::Method;
/// use httpsig::canonical::build_signing_string;
/// use httpsig::SignatureConfig;
///
/// let request = http::Request::builder()
///     .method(Method::GET)
///     .uri("/foo?param=value&pet=dog")
///     .header("Host", "example.com")
///     .header("Date", "Sun, 05 Jan 2014 21:31:40 GMT")
///     .body(())
///     .unwrap();
///
/// let config =
///     SignatureConfig::from_config("Test", "hmac-sha256", &["(request-target)", "Host", "date"])
///         .unwrap();
/// let params = config.resolve(&request).unwrap();
///
/// assert_eq!(
///     build_signing_string(params.headers()),
///     "(request-target): get /foo?param=value&pet=dog\n\
///      host: example.com\n\
///      date: Sun, 05 Jan 2014 21:31:40 GMT"
/// );
/// ```
#[must_use]
pub fn build_signing_string(headers: &HeaderValues) -> String {
    headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}
