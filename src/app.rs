//! Service assembly: fixture, views, handler registration and HTTP wiring.

use crate::config::AppConfig;
use crate::controllers::users::{UsersController, USERS_INDEX};
use crate::controllers::run_controller;
use crate::dispatcher::{Dispatcher, HandlerOutcome, HandlerRequest, ResponseBody};
use crate::hot_reload::watch_views;
use crate::ids::RequestId;
use crate::middleware::{MetricsMiddleware, Middleware, TracingMiddleware};
use crate::router::Router;
use crate::runtime_config::RuntimeConfig;
use crate::server::{AppService, HttpServer, ServerHandle};
use crate::users::{FixtureSource, UserSource};
use crate::views::{Renderer, TemplateRenderer};
use anyhow::{bail, Context, Result};
use http::Method;
use notify::RecommendedWatcher;
use std::io;
use std::sync::Arc;
use tracing::info;

/// A fully wired service, ready to start.
pub struct App {
    pub config: AppConfig,
    pub router: Arc<Router>,
    pub dispatcher: Arc<Dispatcher>,
    pub renderer: Arc<TemplateRenderer>,
    pub metrics: Option<Arc<MetricsMiddleware>>,
    source: Arc<FixtureSource>,
    // Dropping the watcher stops hot reload.
    _watcher: Option<RecommendedWatcher>,
}

/// Load the fixture named by `config`.
///
/// # Errors
///
/// Any [`SourceError`](crate::users::SourceError), with the path in context.
pub fn load_source(config: &AppConfig) -> Result<FixtureSource> {
    FixtureSource::load(&config.data.users)
        .with_context(|| format!("loading users from {}", config.data.users.display()))
}

/// Build the renderer named by `config`: builtins, plus the views directory.
///
/// # Errors
///
/// Any [`RenderError`](crate::views::RenderError) from loading templates.
pub fn load_renderer(config: &AppConfig) -> Result<TemplateRenderer> {
    let renderer = match &config.views.dir {
        Some(dir) => TemplateRenderer::from_dir(dir)
            .with_context(|| format!("loading views from {}", dir.display()))?,
        None => TemplateRenderer::builtin()?,
    };
    Ok(renderer)
}

impl App {
    /// Load everything `config` names and register the `users.index` handler.
    ///
    /// Configures the `may` runtime from `ROSTER_STACK_SIZE` first.
    ///
    /// # Errors
    ///
    /// Fails when the fixture or templates cannot be loaded, or the views
    /// watcher cannot be installed.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let runtime = RuntimeConfig::from_env();
        runtime.apply();

        let source = Arc::new(load_source(&config)?);
        let renderer = Arc::new(load_renderer(&config)?);

        let watcher = if config.views.watch {
            if config.views.dir.is_none() {
                bail!("views.watch requires views.dir");
            }
            Some(watch_views(Arc::clone(&renderer)).context("watching views directory")?)
        } else {
            None
        };

        let metrics = config
            .metrics
            .enabled
            .then(|| Arc::new(MetricsMiddleware::new()));

        let mut dispatcher = Dispatcher::with_runtime(runtime);
        dispatcher.add_middleware(Arc::new(TracingMiddleware));
        if let Some(m) = &metrics {
            dispatcher.add_middleware(Arc::clone(m) as Arc<dyn Middleware>);
        }
        // SAFETY: the may runtime was configured above, before any coroutine spawn.
        unsafe {
            dispatcher.register_controller(
                USERS_INDEX,
                Arc::new(UsersController::new(Arc::clone(&source) as Arc<dyn UserSource>)),
                Arc::clone(&renderer) as Arc<dyn Renderer>,
            );
        }

        let router = Router::with_default_routes();
        info!(
            routes = router.len(),
            users = %config.data.users.display(),
            views = ?renderer.view_names(),
            metrics = config.metrics.enabled,
            "Application assembled"
        );

        Ok(Self {
            config,
            router: Arc::new(router),
            dispatcher: Arc::new(dispatcher),
            renderer,
            metrics,
            source,
            _watcher: watcher,
        })
    }

    #[must_use]
    pub fn source(&self) -> &FixtureSource {
        &self.source
    }

    /// The HTTP service for this app.
    #[must_use]
    pub fn service(&self) -> AppService {
        let mut service = AppService::new(Arc::clone(&self.router), Arc::clone(&self.dispatcher));
        if let Some(m) = &self.metrics {
            service.set_metrics_middleware(Arc::clone(m));
        }
        if let Some(dir) = &self.config.static_files.dir {
            service.set_static_dir(dir.clone());
        }
        service
    }

    /// Bind `http.addr` and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub fn start(&self) -> io::Result<ServerHandle> {
        HttpServer(self.service()).start(self.config.http.addr.as_str())
    }
}

/// Run the `users.index` controller once, outside the server, and return the
/// rendered HTML.
///
/// # Errors
///
/// Fails when loading fails, or when the controller fails or passes the
/// request on instead of rendering.
pub fn render_users_page(config: &AppConfig) -> Result<String> {
    let source: Arc<dyn UserSource> = Arc::new(load_source(config)?);
    let renderer: Arc<dyn Renderer> = Arc::new(load_renderer(config)?);
    let controller = UsersController::new(source);

    let (reply_tx, _reply_rx) = may::sync::mpsc::channel();
    let req = HandlerRequest {
        request_id: RequestId::new(),
        method: Method::GET,
        path: "/users".to_string(),
        handler_name: USERS_INDEX.to_string(),
        query_params: Default::default(),
        headers: Default::default(),
        reply_tx,
    };

    match run_controller(&controller, renderer, &req) {
        HandlerOutcome::Respond(resp) if resp.status == 200 => match resp.body {
            ResponseBody::Html(html) => Ok(html),
            ResponseBody::Json(v) => Ok(v.to_string()),
        },
        HandlerOutcome::Respond(resp) => bail!("rendering failed with status {}", resp.status),
        HandlerOutcome::Next(err) => bail!(
            "controller passed the request on: {}",
            err.unwrap_or_else(|| "no error".to_string())
        ),
    }
}
