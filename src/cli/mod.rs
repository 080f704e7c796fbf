//! # CLI Module
//!
//! The `roster` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! ```bash
//! roster serve --users data/users.json --views views --static-dir public
//! ```
//!
//! Serves `GET /users` (plus `/health`, `/metrics` and static files) until
//! SIGINT or SIGTERM.
//!
//! ### `render`
//!
//! ```bash
//! roster render --views views > users.html
//! ```
//!
//! Runs the user list handler once and prints the HTML; handy while editing
//! templates.
//!
//! ### `check`
//!
//! Loads the fixture and the views, renders once, and prints what it found.
//! Exits non-zero when anything fails to load.
//!
//! Every flag can also come from a YAML file (`--config`) or a `ROSTER_*`
//! environment variable; flags win over both.

mod commands;


pub use commands::{run_cli, Cli, Commands, DataArgs};
