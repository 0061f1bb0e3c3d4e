//! Read-only view of the in-flight request handed to dynamic flag checks.

use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, Extensions, HeaderMap, Method, Uri},
};
use std::convert::Infallible;

/// Owned copy of a request's head.
///
/// Checks get this instead of the request itself so nothing they do can leak
/// back into the request the gate and the handler see. Cloning is cheap
/// enough to hand every async check its own copy.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
}

impl RequestContext {
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, extensions: Extensions) -> Self {
        Self {
            method,
            uri,
            headers,
            extensions,
        }
    }

    pub fn from_request<B>(req: &axum::http::Request<B>) -> Self {
        Self::new(
            req.method().clone(),
            req.uri().clone(),
            req.headers().clone(),
            req.extensions().clone(),
        )
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self::new(
            parts.method.clone(),
            parts.uri.clone(),
            parts.headers.clone(),
            parts.extensions.clone(),
        )
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string, `None` if absent or not visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Typed value some earlier middleware stored in the request extensions,
    /// e.g. an authenticated user id.
    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }
}

impl From<&Request> for RequestContext {
    fn from(req: &Request) -> Self {
        Self::from_request(req)
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestContext::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_context_copies_request_head() {
        let mut req = Request::builder()
            .method("POST")
            .uri("/beta?x=1")
            .header("X-Beta", "on")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(42u32);

        let ctx = RequestContext::from(&req);
        assert_eq!(ctx.method(), &Method::POST);
        assert_eq!(ctx.path(), "/beta");
        assert_eq!(ctx.header("x-beta"), Some("on"));
        assert_eq!(ctx.extension::<u32>(), Some(&42));
        assert!(ctx.extension::<String>().is_none());
    }
}
