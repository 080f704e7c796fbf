use super::request::{parse_request, ParsedRequest};
use super::response::{write_bytes, write_handler_response, write_json_error};
use crate::dispatcher::{Dispatcher, HandlerOutcome, HandlerResponse};
use crate::middleware::MetricsMiddleware;
use crate::router::Router;
use crate::static_files::StaticFiles;
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// `may_minihttp` service tying routing, dispatch and the built-in endpoints
/// together. Cloned once per connection.
#[derive(Clone)]
pub struct AppService {
    pub router: Arc<Router>,
    pub dispatcher: Arc<Dispatcher>,
    pub metrics: Option<Arc<MetricsMiddleware>>,
    pub static_files: Option<StaticFiles>,
}

impl AppService {
    pub fn new(router: Arc<Router>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            router,
            dispatcher,
            metrics: None,
            static_files: None,
        }
    }

    /// Serve `GET /metrics` from `metrics`.
    pub fn set_metrics_middleware(&mut self, metrics: Arc<MetricsMiddleware>) {
        self.metrics = Some(metrics);
    }

    /// Serve files below `dir` for `GET` requests that match an existing file.
    pub fn set_static_dir(&mut self, dir: PathBuf) {
        self.static_files = Some(StaticFiles::new(dir));
    }

    fn count_top_level(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_top_level_request();
        }
    }

    /// Route and dispatch one parsed request, producing the response to send.
    ///
    /// Unrouted requests and handlers that pass the request on without an
    /// error get the 404 page; every failure gets the 500 page.
    pub fn handle(&self, req: ParsedRequest) -> HandlerResponse {
        let Ok(method) = req.method.parse::<Method>() else {
            debug!(request_id = %req.request_id, method = %req.method, "Unparseable method");
            return HandlerResponse::not_found();
        };
        let Some(route_match) = self.router.route(method, &req.raw_path) else {
            return HandlerResponse::not_found();
        };

        match self
            .dispatcher
            .dispatch(route_match, req.headers, req.request_id)
        {
            Some(HandlerOutcome::Respond(resp)) => resp,
            Some(HandlerOutcome::Next(None)) => HandlerResponse::not_found(),
            Some(HandlerOutcome::Next(Some(err))) => {
                error!(
                    request_id = %req.request_id,
                    path = %req.path,
                    error = %err,
                    "Request passed on with an error"
                );
                HandlerResponse::internal_error()
            }
            None => {
                warn!(
                    request_id = %req.request_id,
                    path = %req.path,
                    "Route has no registered handler"
                );
                HandlerResponse::internal_error()
            }
        }
    }
}

/// Basic health check endpoint returning `{ "status": "ok" }`.
pub fn health_endpoint(res: &mut Response) -> io::Result<()> {
    write_handler_response(
        res,
        HandlerResponse::json(200, serde_json::json!({ "status": "ok" })),
    );
    Ok(())
}

/// Metrics endpoint returning Prometheus text format statistics.
pub fn metrics_endpoint(res: &mut Response, metrics: &MetricsMiddleware) -> io::Result<()> {
    write_bytes(
        res,
        200,
        "text/plain; version=0.0.4",
        metrics.render_prometheus().into_bytes(),
    );
    Ok(())
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed = parse_request(req);

        if parsed.method == "GET" {
            match parsed.path.as_str() {
                "/health" => {
                    self.count_top_level();
                    return health_endpoint(res);
                }
                "/metrics" => {
                    if let Some(metrics) = &self.metrics {
                        metrics.inc_top_level_request();
                        return metrics_endpoint(res, metrics);
                    }
                }
                _ => {}
            }

            if let Some(sf) = &self.static_files {
                let p = parsed.path.trim_start_matches('/');
                let p = if p.is_empty() { "index.html" } else { p };
                match sf.load(p) {
                    Ok((bytes, ct)) => {
                        self.count_top_level();
                        write_bytes(res, 200, ct, bytes);
                        return Ok(());
                    }
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        error!(
                            request_id = %parsed.request_id,
                            path = %parsed.path,
                            error = %e,
                            "Static file read failed"
                        );
                        write_json_error(
                            res,
                            500,
                            serde_json::json!({ "error": "Static file read failed" }),
                        );
                        return Ok(());
                    }
                }
            }
        }

        let response = self.handle(parsed);
        write_handler_response(res, response);
        Ok(())
    }
}
