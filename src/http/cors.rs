//! Response header layer
//!
//! Wraps any response-producing service and appends the CORS and
//! cache-disabling headers to every response it returns, whatever path
//! produced it (file, listing, redirect, error).

use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL,
};
use hyper::service::Service;
use hyper::{Request, Response};
use std::future::Future;
use std::pin::Pin;

/// Headers appended to every response, in emission order
pub const INJECTED_HEADERS: [(HeaderName, &str); 3] = [
    (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (ACCESS_CONTROL_ALLOW_METHODS, "GET, OPTIONS"),
    (CACHE_CONTROL, "no-store, no-cache, must-revalidate"),
];

/// Append the injected headers after whatever is already queued.
///
/// Existing values are left untouched; nothing is replaced.
pub fn append_cors_headers(headers: &mut HeaderMap) {
    for (name, value) in INJECTED_HEADERS {
        headers.append(name, HeaderValue::from_static(value));
    }
}

/// Service decorator stamping [`INJECTED_HEADERS`] onto every response
#[derive(Debug, Clone)]
pub struct CorsHeaders<S> {
    inner: S,
}

impl<S> CorsHeaders<S> {
    pub const fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorsHeaders<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    ResBody: 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<ReqBody>) -> Self::Future {
        let fut = self.inner.call(req);
        Box::pin(async move {
            let mut response = fut.await?;
            append_cors_headers(response.headers_mut());
            Ok(response)
        })
    }
}
