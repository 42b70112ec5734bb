//! The HTTP request surface this crate reads from and writes to.
//!
//! Signing and verification only need a handful of things from a request: its
//! method, its target (path, query and fragment), its authority, and its headers.
//! [`SignableRequest`] captures exactly that, and is implemented for
//! [`http::Request`], [`http::request::Parts`] and [`OutgoingRequest`].
//!
//! `http::Uri` never retains a fragment, so requests whose `(request-target)`
//! must cover a `#fragment` should be described with [`OutgoingRequest`], which
//! is backed by a full [`url::Url`].

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use url::{Position, Url};

/// The path, query and fragment of a request URL, exactly as they appear on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTarget<'a> {
    /// The URL path.
    pub path: &'a str,
    /// The query string without the leading `?`.
    pub query: Option<&'a str>,
    /// The fragment without the leading `#`.
    pub fragment: Option<&'a str>,
}

/// A request that can be signed or verified.
///
/// Methods returning `Option` report `None` when the request does not carry
/// that piece of information at all.
pub trait SignableRequest {
    /// The request method.
    fn request_method(&self) -> Option<&Method>;

    /// The request target (path, query, fragment).
    fn request_target(&self) -> Option<RequestTarget<'_>>;

    /// The authority (`host[:port]`) of the request URL, if it is absolute.
    fn request_authority(&self) -> Option<&str>;

    /// The request headers.
    fn header_map(&self) -> &HeaderMap;

    /// Mutable access to the request headers.
    fn header_map_mut(&mut self) -> &mut HeaderMap;
}

impl<B> SignableRequest for http::Request<B> {
    fn request_method(&self) -> Option<&Method> {
        Some(self.method())
    }

    fn request_target(&self) -> Option<RequestTarget<'_>> {
        Some(RequestTarget {
            path: self.uri().path(),
            query: self.uri().query(),
            fragment: None,
        })
    }

    fn request_authority(&self) -> Option<&str> {
        self.uri().authority().map(http::uri::Authority::as_str)
    }

    fn header_map(&self) -> &HeaderMap {
        self.headers()
    }

    fn header_map_mut(&mut self) -> &mut HeaderMap {
        self.headers_mut()
    }
}

impl SignableRequest for http::request::Parts {
    fn request_method(&self) -> Option<&Method> {
        Some(&self.method)
    }

    fn request_target(&self) -> Option<RequestTarget<'_>> {
        Some(RequestTarget {
            path: self.uri.path(),
            query: self.uri.query(),
            fragment: None,
        })
    }

    fn request_authority(&self) -> Option<&str> {
        self.uri.authority().map(http::uri::Authority::as_str)
    }

    fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    fn header_map_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}

/// A client-side request described by an optional method, an optional URL and
/// a header map.
///
/// # Examples
///
/// ```
/// use http::Method;
/// use httpsig::request::{OutgoingRequest, SignableRequest};
///
/// let url = "https://www.example.com/foo?param=value#bar".parse().unwrap();
/// let request = OutgoingRequest::new(Method::POST, url);
///
/// let target = request.request_target().unwrap();
/// assert_eq!(target.path, "/foo");
/// assert_eq!(target.query, Some("param=value"));
/// assert_eq!(target.fragment, Some("bar"));
/// assert_eq!(request.request_authority(), Some("www.example.com"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct OutgoingRequest {
    method: Option<Method>,
    url: Option<Url>,
    headers: HeaderMap,
}

impl OutgoingRequest {
    /// Create a request with the given method and URL and no headers.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method: Some(method),
            url: Some(url),
            headers: HeaderMap::new(),
        }
    }

    /// Set the method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the URL.
    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// The request method, if set.
    #[must_use]
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// The request URL, if set.
    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// The request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl SignableRequest for OutgoingRequest {
    fn request_method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    fn request_target(&self) -> Option<RequestTarget<'_>> {
        self.url.as_ref().map(|url| RequestTarget {
            path: url.path(),
            query: url.query(),
            fragment: url.fragment(),
        })
    }

    fn request_authority(&self) -> Option<&str> {
        let url = self.url.as_ref()?;
        url.host_str()?;
        Some(&url[Position::BeforeHost..Position::AfterPort])
    }

    fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    fn header_map_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_expose_http_request_parts() {
        let (parts, ()) = http::Request::builder()
            .method(Method::GET)
            .uri("http://example.com:8080/foo?a=1")
            .header("host", "example.com")
            .body(())
            .unwrap()
            .into_parts();

        assert_eq!(parts.request_method(), Some(&Method::GET));
        assert_eq!(
            parts.request_target(),
            Some(RequestTarget {
                path: "/foo",
                query: Some("a=1"),
                fragment: None,
            })
        );
        assert_eq!(parts.request_authority(), Some("example.com:8080"));
        assert_eq!(parts.header_map().get("Host").unwrap(), "example.com");
    }

    #[test]
    fn test_should_report_missing_method_and_url() {
        let request = OutgoingRequest::default();
        assert!(request.request_method().is_none());
        assert!(request.request_target().is_none());
        assert!(request.request_authority().is_none());
    }

    #[test]
    fn test_should_keep_port_in_outgoing_authority() {
        let url = Url::parse("https://user:pw@example.com:8443/a").unwrap();
        let request = OutgoingRequest::default().with_url(url);
        assert_eq!(request.request_authority(), Some("example.com:8443"));
        assert!(request.request_method().is_none());
    }
}
