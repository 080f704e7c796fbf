use crate::controllers::users::USERS_INDEX;
use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum number of query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the request path.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A single entry of the routing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMeta {
    pub method: Method,
    /// Normalized path, e.g. `/users`
    pub path: String,
    /// Name the handler is registered under in the dispatcher
    pub handler_name: String,
}

impl RouteMeta {
    #[must_use]
    pub fn new(method: Method, path: &str, handler_name: &str) -> Self {
        Self {
            method,
            path: normalize_path(path).to_string(),
            handler_name: handler_name.to_string(),
        }
    }
}

/// Result of successfully matching a request to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<RouteMeta>,
    pub handler_name: String,
    /// Query string parameters in request order
    pub query_params: ParamVec,
}

impl RouteMatch {
    /// Get a query parameter by name.
    ///
    /// Uses "last write wins" semantics for repeated names (`?a=1&a=2` → `2`).
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Strip the query string and one trailing slash; the empty path becomes `/`.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    let path = path.split('?').next().unwrap_or("/");
    match path {
        "" | "/" => "/",
        p => p.strip_suffix('/').unwrap_or(p),
    }
}

fn parse_query(path: &str) -> ParamVec {
    match path.split_once('?') {
        Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect(),
        None => ParamVec::new(),
    }
}

/// Exact-match routing table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: HashMap<(Method, String), Arc<RouteMeta>>,
}

impl Router {
    /// Build a router from route metadata. Later duplicates replace earlier ones.
    #[must_use]
    pub fn new(routes: Vec<RouteMeta>) -> Self {
        let mut table = HashMap::with_capacity(routes.len());
        for route in routes {
            let key = (route.method.clone(), route.path.clone());
            if let Some(old) = table.insert(key, Arc::new(route)) {
                warn!(
                    method = %old.method,
                    path = %old.path,
                    replaced_handler = %old.handler_name,
                    "Duplicate route replaced"
                );
            }
        }

        let routes_summary: Vec<String> = table
            .values()
            .map(|r| format!("{} {} -> {}", r.method, r.path, r.handler_name))
            .collect();
        info!(
            routes_count = table.len(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );

        Self { routes: table }
    }

    /// The routing table roster serves by default (`GET /users`).
    #[must_use]
    pub fn default_routes() -> Vec<RouteMeta> {
        vec![RouteMeta::new(Method::GET, "/users", USERS_INDEX)]
    }

    #[must_use]
    pub fn with_default_routes() -> Self {
        Self::new(Self::default_routes())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Match `method` and `path` (query string allowed) against the table.
    #[must_use]
    pub fn route(&self, method: Method, path: &str) -> Option<RouteMatch> {
        let normalized = normalize_path(path);
        debug!(method = %method, path = %normalized, "Route match attempt");

        match self.routes.get(&(method.clone(), normalized.to_string())) {
            Some(route) => {
                debug!(
                    method = %method,
                    path = %normalized,
                    handler_name = %route.handler_name,
                    "Route matched"
                );
                Some(RouteMatch {
                    route: Arc::clone(route),
                    handler_name: route.handler_name.clone(),
                    query_params: parse_query(path),
                })
            }
            None => {
                debug!(method = %method, path = %normalized, "No route matched");
                None
            }
        }
    }

    /// Routes sorted by path then method, for display.
    #[must_use]
    pub fn routes(&self) -> Vec<Arc<RouteMeta>> {
        let mut routes: Vec<_> = self.routes.values().map(Arc::clone).collect();
        routes.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.method.as_str().cmp(b.method.as_str()))
        });
        routes
    }
}
