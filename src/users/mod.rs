//! # Users Module
//!
//! The users module owns the data behind the user listing page: the opaque
//! [`UserRecord`], the immutable [`UserCollection`] and the [`UserSource`] seam
//! through which handlers obtain it.
//!
//! ## Overview
//!
//! User records come from a JSON fixture that is read exactly once, at startup.
//! The resulting collection is shared behind an `Arc` and never mutated, so every
//! request handler can read it concurrently without locking.
//!
//! Records are deliberately schema-less. A record is whatever JSON object the
//! fixture contains and it serializes back to exactly that object.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use roster::users::{FixtureSource, UserSource};
//!
//! let source = FixtureSource::load("data/users.json")?;
//! let users = source.users()?;
//! println!("{} users loaded", users.len());
//! # Ok::<(), roster::users::SourceError>(())
//! ```
//!
//! ## Fixture Format
//!
//! The fixture must be a JSON array whose elements are all objects:
//!
//! ```json
//! [
//!   { "id": 1, "name": "Ana" },
//!   { "id": 2, "name": "Bo" }
//! ]
//! ```
//!
//! Anything else is rejected with a [`SourceError`] that names the file and, for
//! element errors, the offending index.

mod collection;
mod source;

pub use collection::{UserCollection, UserRecord};
pub use source::{FixtureSource, SourceError, StaticSource, UserSource};
