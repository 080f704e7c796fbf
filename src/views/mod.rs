//! # Views Module
//!
//! Server-side HTML rendering for roster. A [`Renderer`] turns a view name and a
//! JSON model into an HTML string; handlers never touch templates directly.
//!
//! ## Templates
//!
//! [`TemplateRenderer`] is backed by [minijinja](https://docs.rs/minijinja). It always
//! knows the bundled `users` view (compiled into the binary from `views/users.html`)
//! and can layer a directory of `*.html` templates on top. A file named `users.html`
//! in that directory replaces the bundled view; every other file adds a view named
//! after its stem.
//!
//! HTML auto-escaping is enabled for every view, so record fields containing markup
//! are rendered as text.
//!
//! ## Usage
//!
//! ```rust
//! use roster::views::{Renderer, TemplateRenderer};
//! use serde_json::json;
//!
//! let renderer = TemplateRenderer::builtin()?;
//! let html = renderer.render("users", &json!({ "title": "Users", "users": [] }))?;
//! assert!(html.contains("<h1>Users</h1>"));
//! # Ok::<(), roster::views::RenderError>(())
//! ```
//!
//! ## Reloading
//!
//! [`TemplateRenderer::reload`] re-reads the template directory. A failed reload
//! leaves the previous templates active. See [`crate::hot_reload::watch_views`] for
//! filesystem-driven reloads during development.

mod renderer;

pub use renderer::{RenderError, Renderer, TemplateRenderer, USERS_VIEW};
