//! # Hot Reload Module
//!
//! Live reloading of view templates without restarting the server. Intended for
//! development: edit `views/users.html`, refresh the browser.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use roster::hot_reload::watch_views;
//! use roster::views::TemplateRenderer;
//! use std::sync::Arc;
//!
//! let renderer = Arc::new(TemplateRenderer::from_dir("views")?);
//! let watcher = watch_views(Arc::clone(&renderer))?;
//!
//! // The watcher stops when dropped; keep it alive for the server's lifetime.
//! # drop(watcher);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! If a changed template fails to compile the error is logged and the previous
//! templates remain active, so the server keeps answering while the file is
//! being edited.

use crate::views::TemplateRenderer;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Watch the renderer's template directory and reload on changes.
///
/// # Errors
///
/// Fails when the renderer has no template directory or the watcher cannot
/// be installed.
pub fn watch_views(renderer: Arc<TemplateRenderer>) -> notify::Result<RecommendedWatcher> {
    let Some(dir) = renderer.dir().map(|d| d.to_path_buf()) else {
        return Err(notify::Error::io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "renderer has no template directory to watch",
        )));
    };

    let reload_target = Arc::clone(&renderer);
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                match reload_target.reload() {
                    Ok(count) => info!(
                        paths = ?event.paths,
                        view_count = count,
                        "hot-reload: templates updated"
                    ),
                    Err(e) => warn!(
                        error = %e,
                        "hot-reload: keeping previous templates"
                    ),
                }
            }
            Err(e) => error!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    info!(dir = %dir.display(), "Watching templates for changes");
    Ok(watcher)
}
