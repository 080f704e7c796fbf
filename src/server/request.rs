use crate::dispatcher::HeaderVec;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use may_minihttp::Request;
use std::sync::Arc;
use tracing::{debug, info};

/// Parsed HTTP request data used by `AppService`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request path without the query string
    pub path: String,
    /// Request target as received, query string included
    pub raw_path: String,
    /// HTTP headers (lowercase names)
    pub headers: HeaderVec,
    /// Incoming `x-request-id` if it was a valid ULID, otherwise a fresh one
    pub request_id: RequestId,
}

impl ParsedRequest {
    /// Build from already extracted parts; used by `parse_request` and tests.
    #[must_use]
    pub fn from_parts(method: &str, raw_path: &str, headers: HeaderVec) -> Self {
        let path = raw_path.split('?').next().unwrap_or("/").to_string();
        let request_id = RequestId::from_header_or_new(
            headers
                .iter()
                .find(|(k, _)| k.as_ref() == REQUEST_ID_HEADER)
                .map(|(_, v)| v.as_str()),
        );
        Self {
            method: method.to_string(),
            path,
            raw_path: raw_path.to_string(),
            headers,
            request_id,
        }
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Extract method, path and headers from a `may_minihttp::Request`.
///
/// Request bodies are ignored; roster only serves reads.
pub fn parse_request(req: Request) -> ParsedRequest {
    let headers: HeaderVec = req
        .headers()
        .iter()
        .map(|h| {
            (
                Arc::from(h.name.to_ascii_lowercase().as_str()),
                String::from_utf8_lossy(h.value).into_owned(),
            )
        })
        .collect();

    debug!(
        header_count = headers.len(),
        header_names = ?headers.iter().map(|(k, _)| k.as_ref()).take(20).collect::<Vec<_>>(),
        "Headers extracted"
    );

    let parsed = ParsedRequest::from_parts(req.method(), req.path(), headers);

    info!(
        request_id = %parsed.request_id,
        method = %parsed.method,
        path = %parsed.path,
        headers_count = parsed.headers.len(),
        "HTTP request parsed"
    );

    parsed
}
