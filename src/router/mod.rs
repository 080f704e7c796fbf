//! # Router Module
//!
//! Maps an HTTP method and path to the name of the handler that serves it.
//!
//! ## Overview
//!
//! roster serves a handful of fixed pages, so the routing table is an exact-match
//! map keyed by `(method, normalized path)`. Normalization strips the query string
//! and a single trailing slash, which makes `/users`, `/users/` and `/users?x=1`
//! the same route.
//!
//! ## Example
//!
//! ```rust
//! use roster::router::Router;
//! use http::Method;
//!
//! let router = Router::with_default_routes();
//! let m = router.route(Method::GET, "/users/?sort=name").unwrap();
//! assert_eq!(m.handler_name, "users.index");
//! assert_eq!(m.get_query_param("sort"), Some("name"));
//! assert!(router.route(Method::POST, "/users").is_none());
//! ```
//!
//! ## Default Routes
//!
//! | Method | Path     | Handler       |
//! |--------|----------|---------------|
//! | GET    | `/users` | `users.index` |

mod core;

pub use core::{normalize_path, ParamVec, RouteMatch, RouteMeta, Router, MAX_INLINE_PARAMS};
