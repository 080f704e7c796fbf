use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Middleware for collecting Prometheus-compatible metrics
///
/// All counters are atomics updated with `Ordering::Relaxed`; values are
/// eventually consistent and never block a request.
///
/// Metrics collected:
/// - Dispatched request count and average latency
/// - Responses with a 5xx status
/// - Top-level requests that bypass the dispatcher (health, metrics, static files)
#[derive(Debug, Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    server_errors: AtomicUsize,
    top_level_requests: AtomicUsize,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of requests that reached the dispatcher.
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean dispatch latency; zero before the first request completes.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    pub fn server_errors(&self) -> usize {
        self.server_errors.load(Ordering::Relaxed)
    }

    /// Count a request answered outside the dispatcher.
    pub fn inc_top_level_request(&self) {
        self.top_level_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn top_level_request_count(&self) -> usize {
        self.top_level_requests.load(Ordering::Relaxed)
    }

    /// Prometheus text exposition of the current counters.
    #[must_use]
    pub fn render_prometheus(&self) -> String {
        format!(
            "# HELP roster_requests_total Total number of dispatched requests\n\
             # TYPE roster_requests_total counter\n\
             roster_requests_total {}\n\
             # HELP roster_request_latency_seconds Average request latency in seconds\n\
             # TYPE roster_request_latency_seconds gauge\n\
             roster_request_latency_seconds {}\n\
             # HELP roster_server_errors_total Responses with a 5xx status\n\
             # TYPE roster_server_errors_total counter\n\
             roster_server_errors_total {}\n\
             # HELP roster_top_level_requests_total Requests served outside the dispatcher\n\
             # TYPE roster_top_level_requests_total counter\n\
             roster_top_level_requests_total {}\n",
            self.request_count(),
            self.average_latency().as_secs_f64(),
            self.server_errors(),
            self.top_level_request_count()
        )
    }
}

impl Middleware for MetricsMiddleware {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn after(&self, _req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        if res.status >= 500 {
            self.server_errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RequestId;
    use http::Method;
    use may::sync::mpsc;

    fn request() -> HandlerRequest {
        let (reply_tx, _rx) = mpsc::channel();
        HandlerRequest {
            request_id: RequestId::new(),
            method: Method::GET,
            path: "/users".into(),
            handler_name: "users.index".into(),
            query_params: Default::default(),
            headers: Default::default(),
            reply_tx,
        }
    }

    #[test]
    fn test_counts_requests_latency_and_errors() {
        let metrics = MetricsMiddleware::new();
        let req = request();

        assert!(metrics.before(&req).is_none());
        metrics.after(&req, &mut HandlerResponse::html(200, String::new()), Duration::from_millis(4));
        assert!(metrics.before(&req).is_none());
        metrics.after(&req, &mut HandlerResponse::internal_error(), Duration::from_millis(2));

        assert_eq!(metrics.request_count(), 2);
        assert_eq!(metrics.server_errors(), 1);
        assert_eq!(metrics.average_latency(), Duration::from_millis(3));
    }

    #[test]
    fn test_prometheus_output() {
        let metrics = MetricsMiddleware::new();
        metrics.inc_top_level_request();
        let text = metrics.render_prometheus();
        assert!(text.contains("roster_requests_total 0\n"));
        assert!(text.contains("roster_top_level_requests_total 1\n"));
        assert!(text.contains("# TYPE roster_server_errors_total counter"));
    }
}
