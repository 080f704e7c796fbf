//! # Dispatcher Module
//!
//! Coroutine-based hand-off between the HTTP server and handlers.
//!
//! ## Overview
//!
//! The dispatcher:
//! - Keeps a registry of handler names to coroutine channels
//! - Sends each matched request to its handler and waits for the outcome
//! - Runs middleware before and after the handler
//! - Converts handler panics into the default 500 page
//!
//! ## Outcomes
//!
//! A handler answers every request with exactly one [`HandlerOutcome`]:
//!
//! - [`HandlerOutcome::Respond`] carries the response to send.
//! - [`HandlerOutcome::Next`] passes the request on. `Next(None)` means "not mine"
//!   and ends in a 404; `Next(Some(err))` reports a failure and ends in a 500.
//!
//! Controllers do not send outcomes themselves. They are adapted by
//! [`Dispatcher::register_controller`](crate::controllers), which provides the
//! `res`/`next` pair and turns returned errors into the default 500 page.
//!
//! ## Request Flow
//!
//! 1. Router matches the request → handler name
//! 2. Dispatcher looks up the handler's channel
//! 3. Middleware `before` hooks run (any may short-circuit)
//! 4. Request is sent to the handler coroutine, which spawns a child coroutine
//! 5. The outcome comes back over a per-request channel
//! 6. Middleware `after` hooks see the final response and latency
//!
//! ## Stack Size
//!
//! Handler coroutines use the stack size from
//! [`RuntimeConfig`](crate::runtime_config::RuntimeConfig) (`ROSTER_STACK_SIZE`).

mod core;

pub use core::{
    Dispatcher, HandlerOutcome, HandlerRequest, HandlerResponse, HandlerSender, HeaderVec,
    ResponseBody, MAX_INLINE_HEADERS,
};
