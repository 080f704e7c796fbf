//! Tests for the dispatcher and the controller adapter
//!
//! # Test Coverage
//!
//! - Controllers registered with `register_controller` answer through the router
//! - `next` without an error, `next` with an error, and silent controllers
//! - Middleware short-circuit and after-hooks
//! - Unregistered handlers and plain `register_handler` functions
//! - Handlers that drop the request and handlers or controllers that panic

mod common;

use common::test_server::setup_may_runtime;
use roster::controllers::users::{UsersController, USERS_INDEX};
use roster::controllers::{Controller, ControllerError, Next, ViewResponse};
use roster::dispatcher::{
    Dispatcher, HandlerOutcome, HandlerRequest, HandlerResponse, HeaderVec, ResponseBody,
};
use roster::ids::RequestId;
use roster::middleware::{MetricsMiddleware, Middleware};
use roster::router::{RouteMeta, Router};
use roster::users::{FixtureSource, SourceError, UserCollection, UserSource};
use roster::views::{Renderer, TemplateRenderer};
use http::Method;
use serde_json::json;
use std::sync::Arc;

fn renderer() -> Arc<dyn Renderer> {
    Arc::new(TemplateRenderer::builtin().unwrap())
}

fn dispatch(dispatcher: &Dispatcher, router: &Router, method: Method, path: &str) -> Option<HandlerOutcome> {
    let route_match = router.route(method, path).unwrap();
    dispatcher.dispatch(route_match, HeaderVec::new(), RequestId::new())
}

fn users_dispatcher(source: Arc<dyn UserSource>) -> Dispatcher {
    setup_may_runtime();
    let mut dispatcher = Dispatcher::default();
    unsafe {
        dispatcher.register_controller(
            USERS_INDEX,
            Arc::new(UsersController::new(source)),
            renderer(),
        );
    }
    dispatcher
}

struct Unavailable;

impl UserSource for Unavailable {
    fn users(&self) -> Result<UserCollection, SourceError> {
        Err(SourceError::Unavailable("store offline".into()))
    }
}

struct PassOn(Option<&'static str>);

impl Controller for PassOn {
    fn call(
        &self,
        _req: &HandlerRequest,
        _res: &mut dyn ViewResponse,
        next: Next,
    ) -> Result<(), ControllerError> {
        match self.0 {
            Some(err) => next.fail(err),
            None => next.run(),
        }
        Ok(())
    }
}

#[test]
fn test_users_index_renders_through_dispatcher() {
    let source = FixtureSource::from_json_str(r#"[{"id":1,"name":"Ana"},{"id":2,"name":"Bo"}]"#)
        .unwrap();
    let dispatcher = users_dispatcher(Arc::new(source));
    let router = Router::with_default_routes();

    let outcome = dispatch(&dispatcher, &router, Method::GET, "/users").unwrap();
    let HandlerOutcome::Respond(resp) = outcome else {
        panic!("expected a response, got {outcome:?}");
    };
    assert_eq!(resp.status, 200);
    let ResponseBody::Html(html) = resp.body else {
        panic!("expected html");
    };
    assert!(html.contains("<h1>Users</h1>"));
    assert!(html.contains("<dd>Ana</dd>"));
}

#[test]
fn test_source_failure_becomes_500_page() {
    let dispatcher = users_dispatcher(Arc::new(Unavailable));
    let router = Router::with_default_routes();

    let outcome = dispatch(&dispatcher, &router, Method::GET, "/users").unwrap();
    assert_eq!(outcome, HandlerOutcome::Respond(HandlerResponse::internal_error()));
}

#[test]
fn test_next_outcomes_reach_the_caller() {
    setup_may_runtime();
    let router = Router::new(vec![
        RouteMeta::new(Method::GET, "/skip", "skip"),
        RouteMeta::new(Method::GET, "/fail", "fail"),
    ]);
    let mut dispatcher = Dispatcher::default();
    unsafe {
        dispatcher.register_controller("skip", Arc::new(PassOn(None)), renderer());
        dispatcher.register_controller("fail", Arc::new(PassOn(Some("db down"))), renderer());
    }

    assert_eq!(
        dispatch(&dispatcher, &router, Method::GET, "/skip"),
        Some(HandlerOutcome::Next(None))
    );
    assert_eq!(
        dispatch(&dispatcher, &router, Method::GET, "/fail"),
        Some(HandlerOutcome::Next(Some("db down".to_string())))
    );
}

#[test]
fn test_unregistered_handler_returns_none() {
    setup_may_runtime();
    let dispatcher = Dispatcher::default();
    let router = Router::with_default_routes();
    assert!(!dispatcher.is_registered(USERS_INDEX));
    assert!(dispatch(&dispatcher, &router, Method::GET, "/users").is_none());
}

#[test]
fn test_plain_handler_function() {
    setup_may_runtime();
    let router = Router::new(vec![RouteMeta::new(Method::GET, "/echo", "echo")]);
    let mut dispatcher = Dispatcher::default();
    unsafe {
        dispatcher.register_handler("echo", |req: HandlerRequest| {
            let body = json!({ "q": req.get_query_param("q") });
            let _ = req.reply_tx.send(HandlerOutcome::Respond(HandlerResponse::json(200, body)));
        });
    }

    let outcome = dispatch(&dispatcher, &router, Method::GET, "/echo?q=hi").unwrap();
    assert_eq!(
        outcome,
        HandlerOutcome::Respond(HandlerResponse::json(200, json!({ "q": "hi" })))
    );
}

#[test]
fn test_dropped_request_gets_503() {
    setup_may_runtime();
    let router = Router::new(vec![RouteMeta::new(Method::GET, "/silent", "silent")]);
    let mut dispatcher = Dispatcher::default();
    unsafe {
        dispatcher.register_handler("silent", |req: HandlerRequest| drop(req));
    }

    let outcome = dispatch(&dispatcher, &router, Method::GET, "/silent").unwrap();
    let HandlerOutcome::Respond(resp) = outcome else {
        panic!("expected a response, got {outcome:?}");
    };
    assert_eq!(resp.status, 503);
    assert_eq!(resp.body, ResponseBody::Json(json!({ "error": "Handler is not responding" })));
}

struct Explodes;

impl Controller for Explodes {
    fn call(
        &self,
        _req: &HandlerRequest,
        _res: &mut dyn ViewResponse,
        _next: Next,
    ) -> Result<(), ControllerError> {
        panic!("controller blew up");
    }
}

#[test]
fn test_panics_become_500_page_and_dispatcher_keeps_serving() {
    setup_may_runtime();
    let router = Router::new(vec![
        RouteMeta::new(Method::GET, "/boom", "boom"),
        RouteMeta::new(Method::GET, "/explode", "explode"),
        RouteMeta::new(Method::GET, "/users", USERS_INDEX),
    ]);
    let source = FixtureSource::from_json_str(r#"[{"id":1,"name":"Ana"}]"#).unwrap();
    let mut dispatcher = Dispatcher::default();
    unsafe {
        dispatcher.register_handler("boom", |req: HandlerRequest| {
            if req.get_query_param("fail").is_some() {
                panic!("handler blew up");
            }
            let _ = req
                .reply_tx
                .send(HandlerOutcome::Respond(HandlerResponse::json(200, json!({ "ok": true }))));
        });
        dispatcher.register_controller("explode", Arc::new(Explodes), renderer());
        dispatcher.register_controller(
            USERS_INDEX,
            Arc::new(UsersController::new(Arc::new(source))),
            renderer(),
        );
    }

    let internal_error = Some(HandlerOutcome::Respond(HandlerResponse::internal_error()));
    assert_eq!(dispatch(&dispatcher, &router, Method::GET, "/boom?fail=1"), internal_error);
    assert_eq!(dispatch(&dispatcher, &router, Method::GET, "/explode"), internal_error);

    // Same handlers answer normally afterwards.
    assert_eq!(
        dispatch(&dispatcher, &router, Method::GET, "/boom"),
        Some(HandlerOutcome::Respond(HandlerResponse::json(200, json!({ "ok": true }))))
    );
    let outcome = dispatch(&dispatcher, &router, Method::GET, "/users").unwrap();
    assert!(matches!(outcome, HandlerOutcome::Respond(ref r) if r.status == 200));
    assert_eq!(dispatch(&dispatcher, &router, Method::GET, "/explode"), internal_error);
}

struct Maintenance;

impl Middleware for Maintenance {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        Some(HandlerResponse::html(503, "<h1>Maintenance</h1>".to_string()))
    }
}

#[test]
fn test_middleware_short_circuit_and_metrics() {
    let source = FixtureSource::from_json_str("[]").unwrap();
    let mut dispatcher = users_dispatcher(Arc::new(source));
    let metrics = Arc::new(MetricsMiddleware::new());
    dispatcher.add_middleware(Arc::clone(&metrics) as Arc<dyn Middleware>);
    let router = Router::with_default_routes();

    let outcome = dispatch(&dispatcher, &router, Method::GET, "/users").unwrap();
    assert!(matches!(outcome, HandlerOutcome::Respond(ref r) if r.status == 200));
    assert_eq!(metrics.request_count(), 1);

    dispatcher.add_middleware(Arc::new(Maintenance));
    let outcome = dispatch(&dispatcher, &router, Method::GET, "/users").unwrap();
    let HandlerOutcome::Respond(resp) = outcome else {
        panic!("expected a response");
    };
    assert_eq!(resp.status, 503);
    assert_eq!(metrics.server_errors(), 1);
}

#[test]
fn test_repeated_dispatch_leaves_collection_intact() {
    let source = Arc::new(FixtureSource::from_json_str(r#"[{"id":1}]"#).unwrap());
    let before = source.users().unwrap();
    let dispatcher = users_dispatcher(Arc::clone(&source) as Arc<dyn UserSource>);
    let router = Router::with_default_routes();

    let first = dispatch(&dispatcher, &router, Method::GET, "/users");
    for _ in 0..10 {
        assert_eq!(dispatch(&dispatcher, &router, Method::GET, "/users"), first);
    }
    assert!(source.users().unwrap().ptr_eq(&before));
}
