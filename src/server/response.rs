use crate::dispatcher::HandlerResponse;
use may_minihttp::Response;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Mutex, OnceLock, PoisonError};

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// `may_minihttp` only accepts `'static` header lines. Lines are interned so
/// each distinct one is allocated once; callers must not pass per-request data.
fn static_header(line: String) -> &'static str {
    static INTERNED: OnceLock<Mutex<HashSet<&'static str>>> = OnceLock::new();
    let set = INTERNED.get_or_init(|| Mutex::new(HashSet::new()));
    let mut set = set.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(&existing) = set.get(line.as_str()) {
        return existing;
    }
    let leaked: &'static str = Box::leak(line.into_boxed_str());
    set.insert(leaked);
    leaked
}

fn content_type_header(content_type: &str) -> &'static str {
    match content_type {
        "text/html; charset=utf-8" => "Content-Type: text/html; charset=utf-8",
        "application/json" => "Content-Type: application/json",
        "text/plain; charset=utf-8" => "Content-Type: text/plain; charset=utf-8",
        other => static_header(format!("Content-Type: {other}")),
    }
}

/// Write a handler response: status line, content type, extra headers, body.
pub fn write_handler_response(res: &mut Response, hr: HandlerResponse) {
    res.status_code(hr.status as usize, status_reason(hr.status));
    res.header(content_type_header(hr.content_type()));
    for (name, value) in &hr.headers {
        if name.eq_ignore_ascii_case("content-type") {
            continue;
        }
        res.header(static_header(format!("{name}: {value}")));
    }
    res.body_vec(hr.body.into_bytes());
}

/// Write raw bytes with a known content type (static files, metrics).
pub fn write_bytes(res: &mut Response, status: u16, content_type: &str, body: Vec<u8>) {
    res.status_code(status as usize, status_reason(status));
    res.header(content_type_header(content_type));
    res.body_vec(body);
}

pub fn write_json_error(res: &mut Response, status: u16, body: Value) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: application/json");
    res.body_vec(body.to_string().into_bytes());
}
