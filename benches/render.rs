use criterion::{criterion_group, criterion_main, Criterion};
use http::Method;
use roster::controllers::users::{UsersController, USERS_INDEX};
use roster::controllers::{run_controller, Controller, Next, RenderedResponse};
use roster::dispatcher::HandlerRequest;
use roster::ids::RequestId;
use roster::router::Router;
use roster::users::{FixtureSource, UserSource};
use roster::views::{Renderer, TemplateRenderer};
use std::hint::black_box;
use std::sync::Arc;

fn fixture(n: usize) -> String {
    let users: Vec<_> = (0..n)
        .map(|i| serde_json::json!({ "id": i, "name": format!("user{i}"), "email": format!("user{i}@example.com") }))
        .collect();
    serde_json::Value::Array(users).to_string()
}

fn request() -> HandlerRequest {
    let (reply_tx, _rx) = may::sync::mpsc::channel();
    HandlerRequest {
        request_id: RequestId::new(),
        method: Method::GET,
        path: "/users".into(),
        handler_name: USERS_INDEX.into(),
        query_params: Default::default(),
        headers: Default::default(),
        reply_tx,
    }
}

fn bench_users_index(c: &mut Criterion) {
    let renderer: Arc<dyn Renderer> = Arc::new(TemplateRenderer::builtin().unwrap());
    let router = Router::with_default_routes();

    for n in [10usize, 1_000] {
        let source: Arc<dyn UserSource> =
            Arc::new(FixtureSource::from_json_str(&fixture(n)).unwrap());
        let controller = UsersController::new(source);
        let req = request();

        c.bench_function(&format!("users_index_{n}"), |b| {
            b.iter(|| {
                let mut res = RenderedResponse::new(Arc::clone(&renderer));
                controller.call(&req, &mut res, Next::noop()).unwrap();
                black_box(res.into_response());
            })
        });

        c.bench_function(&format!("run_controller_{n}"), |b| {
            b.iter(|| black_box(run_controller(&controller, Arc::clone(&renderer), &req)))
        });
    }

    c.bench_function("route_users", |b| {
        b.iter(|| black_box(router.route(Method::GET, black_box("/users/?page=2"))))
    });
}

criterion_group!(benches, bench_users_index);
criterion_main!(benches);
