//! # roster
//!
//! **roster** serves a fixed list of users as a server-rendered HTML page. It
//! runs on the `may` coroutine runtime with `may_minihttp` for HTTP and
//! `minijinja` for views.
//!
//! ## Overview
//!
//! One route does the work: `GET /users` dispatches to the `users.index`
//! handler, which reads the whole collection from a [`users::UserSource`]
//! and renders the `users` view with `{ title: "Users", users }`. Everything
//! else is the plumbing around that handler.
//!
//! ## Architecture
//!
//! - **[`users`]** - user records, the read-only collection, and sources (JSON fixture, in-memory)
//! - **[`views`]** - the [`views::Renderer`] trait and the minijinja-backed [`views::TemplateRenderer`]
//! - **[`controllers`]** - `(req, res, next)` controllers and the user list handler
//! - **[`router`]** - exact-match routing table
//! - **[`dispatcher`]** - coroutine-per-request handler dispatch and middleware
//! - **[`middleware`]** - tracing and Prometheus metrics
//! - **[`server`]** - `may_minihttp` service, health/metrics endpoints, static files
//! - **[`hot_reload`]** - reload views when the template directory changes
//! - **[`config`]**, **[`runtime_config`]**, **[`telemetry`]** - YAML config, coroutine tuning, logging
//! - **[`cli`]** - the `roster` binary (`serve`, `render`, `check`)
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as AppService
//!     participant Router
//!     participant Dispatcher
//!     participant Controller as UsersController
//!     participant Source as UserSource
//!     participant Renderer
//!
//!     Client->>Server: GET /users
//!     Server->>Router: route(GET, "/users")
//!     Router-->>Server: RouteMatch (users.index)
//!     Server->>Dispatcher: dispatch(route_match)
//!     Dispatcher->>Controller: call(req, res, next)
//!     Controller->>Source: users()
//!     Source-->>Controller: UserCollection
//!     Controller->>Renderer: render("users", {title, users})
//!     Renderer-->>Controller: HTML
//!     Controller-->>Dispatcher: Ok(())
//!     Dispatcher-->>Server: Respond(200 HTML)
//!     Server-->>Client: 200 OK
//! ```
//!
//! Errors from the source or the renderer are returned by the controller with
//! `?`. The dispatcher logs them and answers with the default 500 page.
//!
//! ## Quick Start
//!
//! ```no_run
//! use roster::app::App;
//! use roster::config::AppConfig;
//!
//! let app = App::from_config(AppConfig::default())?;
//! let handle = app.start()?;
//! handle.join().ok();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Runtime Considerations
//!
//! Handlers run in `may` coroutines, not on tokio. The coroutine stack size is
//! read from `ROSTER_STACK_SIZE` (see [`runtime_config`]).

pub mod app;
pub mod cli;
pub mod config;
pub mod controllers;
pub mod dispatcher;
pub mod hot_reload;
pub mod ids;
pub mod middleware;
pub mod router;
pub mod runtime_config;
pub mod server;
pub mod static_files;
pub mod telemetry;
pub mod users;
pub mod views;

pub use controllers::users::{UsersController, USERS_INDEX};
pub use controllers::{Controller, ControllerError, Next, ViewResponse};
pub use users::{UserCollection, UserRecord, UserSource};
pub use views::{Renderer, TemplateRenderer};
