use minijinja::{AutoEscape, Environment, ErrorKind};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the user listing view.
pub const USERS_VIEW: &str = "users";

const BUILTIN_VIEWS: &[(&str, &str)] = &[(USERS_VIEW, include_str!("../../views/users.html"))];

/// Failures while loading or rendering a view.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown view '{0}'")]
    UnknownView(String),
    #[error("template error in view '{view}': {source}")]
    Template {
        view: String,
        #[source]
        source: minijinja::Error,
    },
    #[error("failed to load templates from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rendering collaborator used by controllers.
pub trait Renderer: Send + Sync {
    /// Render `view` with `model` into an HTML document.
    fn render(&self, view: &str, model: &Value) -> Result<String, RenderError>;
}

struct Loaded {
    env: Environment<'static>,
    views: BTreeSet<String>,
}

/// minijinja-backed renderer with bundled views and an optional template directory.
pub struct TemplateRenderer {
    dir: Option<PathBuf>,
    loaded: RwLock<Loaded>,
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("dir", &self.dir)
            .field("views", &self.view_names())
            .finish()
    }
}

impl TemplateRenderer {
    /// Renderer with only the bundled views.
    ///
    /// # Errors
    ///
    /// Fails only if a bundled template does not compile.
    pub fn builtin() -> Result<Self, RenderError> {
        Ok(Self {
            dir: None,
            loaded: RwLock::new(load(None)?),
        })
    }

    /// Renderer with the bundled views overlaid by every `*.html` file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Load`] if the directory cannot be read and
    /// [`RenderError::Template`] if a template fails to compile.
    pub fn from_dir<P: Into<PathBuf>>(dir: P) -> Result<Self, RenderError> {
        let dir = dir.into();
        let loaded = load(Some(&dir))?;
        info!(
            dir = %dir.display(),
            views = ?loaded.views,
            "Templates loaded"
        );
        Ok(Self {
            dir: Some(dir),
            loaded: RwLock::new(loaded),
        })
    }

    /// Directory templates are read from, if any.
    #[must_use]
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Re-read the template directory and swap in the new templates.
    ///
    /// On error the currently active templates are kept.
    ///
    /// # Errors
    ///
    /// Same as [`TemplateRenderer::from_dir`].
    pub fn reload(&self) -> Result<usize, RenderError> {
        let fresh = load(self.dir.as_deref())?;
        let count = fresh.views.len();
        *self.loaded.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        info!(view_count = count, "Templates reloaded");
        Ok(count)
    }

    #[must_use]
    pub fn has_view(&self, view: &str) -> bool {
        self.loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .views
            .contains(view)
    }

    #[must_use]
    pub fn view_names(&self) -> Vec<String> {
        self.loaded
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .views
            .iter()
            .cloned()
            .collect()
    }
}

impl Renderer for TemplateRenderer {
    fn render(&self, view: &str, model: &Value) -> Result<String, RenderError> {
        let loaded = self.loaded.read().unwrap_or_else(PoisonError::into_inner);
        let template = loaded.env.get_template(view).map_err(|source| {
            if source.kind() == ErrorKind::TemplateNotFound {
                RenderError::UnknownView(view.to_string())
            } else {
                template_error(view, source)
            }
        })?;
        let html = template
            .render(model)
            .map_err(|source| template_error(view, source))?;
        debug!(view = view, bytes = html.len(), "View rendered");
        Ok(html)
    }
}

fn template_error(view: &str, source: minijinja::Error) -> RenderError {
    RenderError::Template {
        view: view.to_string(),
        source,
    }
}

fn load(dir: Option<&Path>) -> Result<Loaded, RenderError> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);
    let mut views = BTreeSet::new();

    for &(name, source) in BUILTIN_VIEWS {
        env.add_template(name, source)
            .map_err(|e| template_error(name, e))?;
        views.insert(name.to_string());
    }

    let Some(dir) = dir else {
        return Ok(Loaded { env, views });
    };

    let load_err = |source| RenderError::Load {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(load_err)? {
        let path = entry.map_err(load_err)?.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("html") {
            files.push(path);
        }
    }
    files.sort();

    for path in files {
        let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            warn!(path = %path.display(), "Skipping template with non UTF-8 name");
            continue;
        };
        let source = fs::read_to_string(&path).map_err(|source| RenderError::Load {
            path: path.clone(),
            source,
        })?;
        env.add_template_owned(name.clone(), source)
            .map_err(|e| template_error(&name, e))?;
        debug!(view = %name, path = %path.display(), "Template registered");
        views.insert(name);
    }

    Ok(Loaded { env, views })
}
