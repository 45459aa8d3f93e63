//! Request dispatch module
//!
//! Entry point for HTTP request processing: method validation, static file
//! dispatch, `Server` stamping and access logging.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, date};
use crate::logger::{self, AccessLogEntry};
use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_LENGTH, IF_MODIFIED_SINCE, IF_NONE_MATCH, SERVER};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Raw, still percent-encoded path
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_modified_since: Option<&'a str>,
    pub has_if_none_match: bool,
}

impl<'a> RequestContext<'a> {
    pub fn from_parts(parts: &'a Parts) -> Self {
        Self {
            path: parts.uri.path(),
            query: parts.uri.query(),
            is_head: parts.method == Method::HEAD,
            if_modified_since: parts
                .headers
                .get(IF_MODIFIED_SINCE)
                .and_then(|v| v.to_str().ok()),
            has_if_none_match: parts.headers.contains_key(IF_NONE_MATCH),
        }
    }

    /// Usable `If-Modified-Since` date; ignored when `If-None-Match` is sent
    pub fn if_modified_since(&self) -> Option<DateTime<Utc>> {
        if self.has_if_none_match {
            return None;
        }
        self.if_modified_since.and_then(date::parse_http_date)
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    // The body is never read; only GET and HEAD are served
    let parts = req.into_parts().0;

    let mut response = dispatch(&parts, &state).await;
    stamp_server_header(&mut response, &state.config.http.server_name);

    if response.status().is_client_error() || response.status().is_server_error() {
        logger::log_error_response(
            &peer_addr,
            response.status().as_u16(),
            response.status().canonical_reason().unwrap_or(""),
        );
    }

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::from_request(peer_addr, &parts);
        entry.status = response.status().as_u16();
        entry.body_bytes = sent_body_bytes(&response, entry.method == "HEAD");
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

async fn dispatch(parts: &Parts, state: &AppState) -> Response<Full<Bytes>> {
    match parts.method {
        Method::GET | Method::HEAD => {
            let ctx = RequestContext::from_parts(parts);
            static_files::serve(&ctx, &state.root).await
        }
        ref other => http::build_501_response(other),
    }
}

fn stamp_server_header(response: &mut Response<Full<Bytes>>, server_name: &str) {
    if let Ok(value) = HeaderValue::from_str(server_name) {
        response.headers_mut().entry(SERVER).or_insert(value);
    }
}

/// Body size actually written, None when no body goes out
fn sent_body_bytes(response: &Response<Full<Bytes>>, is_head: bool) -> Option<u64> {
    if is_head || response.status() == StatusCode::NOT_MODIFIED {
        return None;
    }
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}
