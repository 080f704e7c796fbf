//! # Server Module
//!
//! HTTP serving on top of `may_minihttp`.
//!
//! [`AppService`] answers, in order:
//!
//! 1. `GET /health` with `{"status":"ok"}`
//! 2. `GET /metrics` with Prometheus text, when metrics are enabled
//! 3. files from the static directory, when one is configured and the file exists
//! 4. routed requests through the [`Dispatcher`](crate::dispatcher::Dispatcher)
//! 5. the 404 page for everything else
//!
//! [`HttpServer`] binds the service and returns a [`ServerHandle`] for
//! readiness checks and shutdown.

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle, MAX_REQUEST_HEADERS};
pub use request::{parse_request, ParsedRequest};
pub use service::{health_endpoint, metrics_endpoint, AppService};
