//! Dispatcher core: handler registry, request hand-off and middleware pipeline.

use crate::ids::RequestId;
use crate::middleware::Middleware;
use crate::router::{ParamVec, RouteMatch};
use crate::runtime_config::RuntimeConfig;
use http::Method;
use may::coroutine;
use may::sync::mpsc;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated header storage (lowercase names).
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Body of a handler response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Html(String),
    Json(Value),
}

impl ResponseBody {
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            ResponseBody::Html(_) => "text/html; charset=utf-8",
            ResponseBody::Json(_) => "application/json",
        }
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ResponseBody::Html(s) => s.into_bytes(),
            ResponseBody::Json(v) => v.to_string().into_bytes(),
        }
    }
}

/// Response produced by a handler or a middleware short-circuit.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResponse {
    pub status: u16,
    /// Extra response headers; `content-type` here overrides the body default
    pub headers: HeaderVec,
    pub body: ResponseBody,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, body: ResponseBody) -> Self {
        Self {
            status,
            headers: HeaderVec::new(),
            body,
        }
    }

    #[must_use]
    pub fn html(status: u16, html: String) -> Self {
        Self::new(status, ResponseBody::Html(html))
    }

    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self::new(status, ResponseBody::Json(body))
    }

    /// JSON error response `{ "error": message }`.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    /// The default page served when a handler fails.
    #[must_use]
    pub fn internal_error() -> Self {
        Self::html(500, "<h1>Internal Server Error</h1>".to_string())
    }

    /// The default page served when nothing handles a request.
    #[must_use]
    pub fn not_found() -> Self {
        Self::html(404, "<h1>Not Found</h1>".to_string())
    }

    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Effective content type: explicit header first, then the body default.
    #[must_use]
    pub fn content_type(&self) -> &str {
        self.get_header("content-type")
            .unwrap_or_else(|| self.body.content_type())
    }
}

/// What a handler did with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutcome {
    /// The handler produced a response.
    Respond(HandlerResponse),
    /// The handler passed the request on; `Some` carries an error message.
    Next(Option<String>),
}

/// Request data passed to a handler coroutine.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub request_id: RequestId,
    pub method: Method,
    /// Normalized route path
    pub path: String,
    pub handler_name: String,
    pub query_params: ParamVec,
    pub headers: HeaderVec,
    /// Channel for sending the outcome back to the dispatcher
    pub reply_tx: mpsc::Sender<HandlerOutcome>,
}

impl HandlerRequest {
    /// Get a query parameter by name (last occurrence wins).
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230).
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Type alias for a channel sender that dispatches requests to a handler.
pub type HandlerSender = mpsc::Sender<HandlerRequest>;

/// Routes requests to registered handler coroutines and runs middleware.
#[derive(Clone, Default)]
pub struct Dispatcher {
    /// Handler name → channel into the handler's coroutine
    pub handlers: HashMap<String, HandlerSender>,
    /// Middleware, executed in insertion order
    pub middlewares: Vec<Arc<dyn Middleware>>,
    runtime: RuntimeConfig,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::with_runtime(RuntimeConfig::from_env())
    }

    #[must_use]
    pub fn with_runtime(runtime: RuntimeConfig) -> Self {
        Dispatcher {
            handlers: HashMap::new(),
            middlewares: Vec::new(),
            runtime,
        }
    }

    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Register a handler function under `name`.
    ///
    /// A receiver coroutine is spawned for the handler and each request runs in
    /// its own child coroutine, so concurrent requests do not queue behind each
    /// other. Handler panics are caught and answered with the default 500 page.
    /// Registering the same name twice replaces the previous handler; its
    /// receiver coroutine exits once the old channel closes.
    ///
    /// # Safety
    ///
    /// Calls `may::coroutine::Builder::spawn()`, which is unsafe in the `may`
    /// runtime. The caller must ensure:
    /// - The `may` runtime is configured before the first call
    /// - The handler sends exactly one outcome per request through `reply_tx`
    pub unsafe fn register_handler<F>(&mut self, name: &str, handler_fn: F)
    where
        F: Fn(HandlerRequest) + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel::<HandlerRequest>();
        let name = name.to_string();
        let stack_size = self.runtime.stack_size;
        let handler_fn = Arc::new(handler_fn);
        let receiver_name = name.clone();

        // SAFETY: see the function-level contract; the closure is Send + 'static.
        let spawn_result = unsafe {
            coroutine::Builder::new()
                .stack_size(stack_size)
                .spawn(move || {
                    debug!(handler_name = %receiver_name, stack_size, "Handler coroutine start");
                    for req in rx.iter() {
                        let handler_fn = Arc::clone(&handler_fn);
                        let reply_tx = req.reply_tx.clone();
                        let request_id = req.request_id;
                        // SAFETY: same contract as the receiver coroutine.
                        let child = unsafe {
                            coroutine::Builder::new()
                                .stack_size(stack_size)
                                .spawn(move || run_handler(handler_fn.as_ref(), req))
                        };
                        if let Err(e) = child {
                            error!(
                                request_id = %request_id,
                                handler_name = %receiver_name,
                                error = %e,
                                "Failed to spawn request coroutine"
                            );
                            let _ = reply_tx.send(HandlerOutcome::Respond(
                                HandlerResponse::error(503, "Handler is not responding"),
                            ));
                        }
                    }
                    debug!(handler_name = %receiver_name, "Handler coroutine exit");
                })
        };

        if let Err(e) = spawn_result {
            error!(
                handler_name = %name,
                error = %e,
                stack_size,
                "Failed to spawn handler coroutine - CRITICAL"
            );
            return;
        }

        if self.handlers.insert(name.clone(), tx).is_some() {
            warn!(handler_name = %name, "Replaced existing handler - old coroutine will exit");
        }
        info!(
            handler_name = %name,
            total_handlers = self.handlers.len(),
            "Handler registered successfully"
        );
    }

    /// Dispatch a matched request and wait for the handler's outcome.
    ///
    /// Returns `None` if no handler is registered under the route's name. A
    /// handler that drops the request without replying is answered with 503.
    #[must_use]
    pub fn dispatch(
        &self,
        route_match: RouteMatch,
        headers: HeaderVec,
        request_id: RequestId,
    ) -> Option<HandlerOutcome> {
        let Some(tx) = self.handlers.get(&route_match.handler_name) else {
            let available: Vec<&String> = self.handlers.keys().collect();
            error!(
                request_id = %request_id,
                handler_name = %route_match.handler_name,
                available_handlers = ?available,
                "Handler not found"
            );
            return None;
        };

        let (reply_tx, reply_rx) = mpsc::channel();
        // Middleware sees a copy whose sender is detached from `reply_rx`; only
        // the handler's copy keeps the reply channel open.
        let (detached_tx, _) = mpsc::channel();
        let request = HandlerRequest {
            request_id,
            method: route_match.route.method.clone(),
            path: route_match.route.path.clone(),
            handler_name: route_match.handler_name,
            query_params: route_match.query_params,
            headers,
            reply_tx: detached_tx,
        };

        let mut early = None;
        for mw in &self.middlewares {
            if let Some(resp) = mw.before(&request) {
                debug!(
                    request_id = %request_id,
                    middleware = std::any::type_name_of_val(mw.as_ref()),
                    "Middleware returned early response"
                );
                early = Some(resp);
                break;
            }
        }

        let start = Instant::now();
        let outcome = match early {
            Some(resp) => HandlerOutcome::Respond(resp),
            None => {
                let handed_off = HandlerRequest {
                    reply_tx,
                    ..request.clone()
                };
                if let Err(e) = tx.send(handed_off) {
                    error!(
                        request_id = %request_id,
                        handler_name = %request.handler_name,
                        error = %e,
                        "Failed to send request to handler"
                    );
                    return None;
                }
                match reply_rx.recv() {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(
                            request_id = %request_id,
                            handler_name = %request.handler_name,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            error = %e,
                            "Handler channel closed without a reply"
                        );
                        HandlerOutcome::Respond(HandlerResponse::error(
                            503,
                            "Handler is not responding",
                        ))
                    }
                }
            }
        };
        let latency = start.elapsed();

        match outcome {
            HandlerOutcome::Respond(mut resp) => {
                for mw in &self.middlewares {
                    mw.after(&request, &mut resp, latency);
                }
                Some(HandlerOutcome::Respond(resp))
            }
            next @ HandlerOutcome::Next(_) => {
                debug!(
                    request_id = %request_id,
                    handler_name = %request.handler_name,
                    latency_ms = latency.as_millis() as u64,
                    "Handler passed request on"
                );
                Some(next)
            }
        }
    }
}

fn run_handler<F>(handler_fn: &F, req: HandlerRequest)
where
    F: Fn(HandlerRequest),
{
    let reply_tx = req.reply_tx.clone();
    let request_id = req.request_id;
    let handler_name = req.handler_name.clone();
    let started = Instant::now();

    if let Err(panic) =
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler_fn(req)))
    {
        error!(
            request_id = %request_id,
            handler_name = %handler_name,
            panic_message = %panic_message(panic.as_ref()),
            "Handler panicked"
        );
        // The dispatcher may already have an outcome; a closed channel is fine.
        let _ = reply_tx.send(HandlerOutcome::Respond(HandlerResponse::internal_error()));
    } else {
        debug!(
            request_id = %request_id,
            handler_name = %handler_name,
            execution_time_ms = started.elapsed().as_millis() as u64,
            "Handler execution complete"
        );
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
