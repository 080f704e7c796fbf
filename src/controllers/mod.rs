//! # Controllers Module
//!
//! Controllers are the request handlers of roster. They see a request, a
//! response handle (`res`) that can render views, and a `next` continuation
//! that passes the request on. This mirrors the classic `(req, res, next)`
//! pipeline shape while keeping failures in the return type.
//!
//! ## Contract
//!
//! - On success a controller calls `res.render(..)` and returns `Ok(())`.
//! - A controller that does not want the request calls `next.run()`.
//! - Failures are returned with `?`; the dispatcher answers them with the
//!   default 500 page and logs the error. Controllers do no local recovery.
//!
//! ## Registration
//!
//! ```rust,no_run
//! use roster::controllers::users::{UsersController, USERS_INDEX};
//! use roster::dispatcher::Dispatcher;
//! use roster::users::FixtureSource;
//! use roster::views::TemplateRenderer;
//! use std::sync::Arc;
//!
//! let source = Arc::new(FixtureSource::load("data/users.json")?);
//! let renderer = Arc::new(TemplateRenderer::builtin()?);
//! let mut dispatcher = Dispatcher::new();
//! unsafe {
//!     dispatcher.register_controller(
//!         USERS_INDEX,
//!         Arc::new(UsersController::new(source)),
//!         renderer,
//!     );
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod users;

use crate::dispatcher::{Dispatcher, HandlerOutcome, HandlerRequest, HandlerResponse};
use crate::users::SourceError;
use crate::views::{RenderError, Renderer};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

/// Failures a controller propagates to the pipeline.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to build view model: {0}")]
    Model(#[from] serde_json::Error),
}

/// Response handle given to controllers.
pub trait ViewResponse {
    /// Render `view` with `model` as the response body.
    fn render(&mut self, view: &str, model: &Value) -> Result<(), RenderError>;
}

/// Continuation that hands the request to the next stage of the pipeline.
pub struct Next {
    called: Arc<AtomicBool>,
    on_next: Box<dyn FnOnce(Option<String>) + Send>,
}

impl Next {
    pub fn new<F>(on_next: F) -> Self
    where
        F: FnOnce(Option<String>) + Send + 'static,
    {
        Self {
            called: Arc::new(AtomicBool::new(false)),
            on_next: Box::new(on_next),
        }
    }

    /// A continuation that does nothing when called.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Flag that flips to `true` once this continuation is called.
    #[must_use]
    pub fn called_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.called)
    }

    /// Pass the request on without an error.
    pub fn run(self) {
        self.called.store(true, Ordering::SeqCst);
        (self.on_next)(None);
    }

    /// Pass the request on with an error.
    pub fn fail(self, err: impl std::fmt::Display) {
        self.called.store(true, Ordering::SeqCst);
        (self.on_next)(Some(err.to_string()));
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("called", &self.called.load(Ordering::SeqCst))
            .finish()
    }
}

/// A request handler in `(req, res, next)` form.
pub trait Controller: Send + Sync {
    fn call(
        &self,
        req: &HandlerRequest,
        res: &mut dyn ViewResponse,
        next: Next,
    ) -> Result<(), ControllerError>;
}

/// [`ViewResponse`] that renders through a [`Renderer`] and keeps the result.
pub struct RenderedResponse {
    renderer: Arc<dyn Renderer>,
    response: Option<HandlerResponse>,
}

impl RenderedResponse {
    #[must_use]
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self {
            renderer,
            response: None,
        }
    }

    /// The rendered response, if `render` succeeded.
    #[must_use]
    pub fn into_response(self) -> Option<HandlerResponse> {
        self.response
    }
}

impl ViewResponse for RenderedResponse {
    fn render(&mut self, view: &str, model: &Value) -> Result<(), RenderError> {
        let html = self.renderer.render(view, model)?;
        self.response = Some(HandlerResponse::html(200, html));
        Ok(())
    }
}

/// Run `controller` for one request and translate the result into an outcome.
///
/// Returns the rendered response, `Next` if the controller passed the request
/// on, or the default 500 page on error.
pub fn run_controller(
    controller: &dyn Controller,
    renderer: Arc<dyn Renderer>,
    req: &HandlerRequest,
) -> HandlerOutcome {
    let (next_tx, next_rx) = std::sync::mpsc::channel();
    let next = Next::new(move |err| {
        // The receiver lives until the end of this function.
        let _ = next_tx.send(err);
    });
    let next_called = next.called_flag();
    let mut res = RenderedResponse::new(renderer);

    match controller.call(req, &mut res, next) {
        Ok(()) => {
            if let Some(resp) = res.into_response() {
                HandlerOutcome::Respond(resp)
            } else if next_called.load(Ordering::SeqCst) {
                HandlerOutcome::Next(next_rx.try_recv().unwrap_or(None))
            } else {
                error!(
                    request_id = %req.request_id,
                    handler_name = %req.handler_name,
                    "Controller finished without a response"
                );
                HandlerOutcome::Respond(HandlerResponse::internal_error())
            }
        }
        Err(e) => {
            error!(
                request_id = %req.request_id,
                handler_name = %req.handler_name,
                error = %e,
                "Controller failed"
            );
            HandlerOutcome::Respond(HandlerResponse::internal_error())
        }
    }
}

impl Dispatcher {
    /// Register a [`Controller`] under `name`, rendering through `renderer`.
    ///
    /// # Safety
    ///
    /// Same contract as [`Dispatcher::register_handler`]: the `may` runtime must
    /// be configured before the first call.
    pub unsafe fn register_controller(
        &mut self,
        name: &str,
        controller: Arc<dyn Controller>,
        renderer: Arc<dyn Renderer>,
    ) {
        let handler = move |req: HandlerRequest| {
            let outcome = run_controller(controller.as_ref(), Arc::clone(&renderer), &req);
            // A closed reply channel means the dispatcher gave up on this request.
            let _ = req.reply_tx.send(outcome);
        };
        // SAFETY: forwarded to the caller.
        unsafe { self.register_handler(name, handler) }
    }
}
