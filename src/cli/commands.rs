use crate::app::{load_renderer, load_source, render_users_page, App};
use crate::config::AppConfig;
use crate::server::ServerHandle;
use crate::users::UserSource;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Command-line interface for roster
#[derive(Parser, Debug)]
#[command(name = "roster", version)]
#[command(about = "Serve the user list as server-rendered HTML", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Fixture and view locations shared by every command.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct DataArgs {
    /// YAML config file; flags below override it
    #[arg(short, long, env = "ROSTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// JSON fixture with the user list
    #[arg(short, long, env = "ROSTER_USERS")]
    pub users: Option<PathBuf>,

    /// Directory of `*.html` views overriding the built-in ones
    #[arg(long, env = "ROSTER_VIEWS")]
    pub views: Option<PathBuf>,
}

impl DataArgs {
    /// Load the config file (or defaults) and apply the flags on top.
    ///
    /// # Errors
    ///
    /// Fails if the named config file cannot be read or parsed.
    pub fn resolve(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load_or_default(self.config.as_deref())?;
        if let Some(users) = &self.users {
            config.data.users = users.clone();
        }
        if let Some(views) = &self.views {
            config.views.dir = Some(views.clone());
        }
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve `GET /users` until SIGINT or SIGTERM
    Serve {
        #[command(flatten)]
        data: DataArgs,

        /// Listen address, e.g. 0.0.0.0:8080
        #[arg(short, long, env = "ROSTER_ADDR")]
        addr: Option<String>,

        /// Serve files from this directory
        #[arg(long, env = "ROSTER_STATIC")]
        static_dir: Option<PathBuf>,

        /// Reload views when files in the views directory change
        #[arg(long, default_value_t = false)]
        watch_views: bool,

        /// Disable `GET /metrics`
        #[arg(long, default_value_t = false)]
        no_metrics: bool,
    },
    /// Render the user list once and print the HTML
    Render {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Load the fixture and views and report what was found
    Check {
        #[command(flatten)]
        data: DataArgs,
    },
}

impl Commands {
    /// Effective configuration for this command.
    ///
    /// # Errors
    ///
    /// Fails if the named config file cannot be read or parsed.
    pub fn resolve_config(&self) -> Result<AppConfig> {
        match self {
            Commands::Serve {
                data,
                addr,
                static_dir,
                watch_views,
                no_metrics,
            } => {
                let mut config = data.resolve()?;
                if let Some(addr) = addr {
                    config.http.addr = addr.clone();
                }
                if let Some(dir) = static_dir {
                    config.static_files.dir = Some(dir.clone());
                }
                if *watch_views {
                    config.views.watch = true;
                }
                if *no_metrics {
                    config.metrics.enabled = false;
                }
                Ok(config)
            }
            Commands::Render { data } | Commands::Check { data } => data.resolve(),
        }
    }
}

/// Execute a parsed command line.
///
/// # Errors
///
/// Any failure while loading, binding or rendering; `main` reports it and
/// exits non-zero.
pub fn run_cli(cli: Cli) -> Result<()> {
    let config = cli.command.resolve_config()?;
    match cli.command {
        Commands::Serve { .. } => serve(config),
        Commands::Render { .. } => {
            let html = render_users_page(&config)?;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
        Commands::Check { .. } => {
            let source = load_source(&config)?;
            let renderer = load_renderer(&config)?;
            let users = source.users()?;
            // Render too, so template errors that only show with data surface here.
            render_users_page(&config)?;
            println!("users: {} ({})", users.len(), source.path().display());
            println!("views: {}", renderer.view_names().join(", "));
            Ok(())
        }
    }
}

fn serve(config: AppConfig) -> Result<()> {
    let app = App::from_config(config)?;
    let handle = app
        .start()
        .with_context(|| format!("binding {}", app.config.http.addr))?;
    println!("roster listening on http://{}/users", handle.addr());
    wait_for_shutdown(handle)
}

#[cfg(unix)]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    let mut signals =
        signal_hook::iterator::Signals::new([SIGINT, SIGTERM]).context("installing signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown signal received");
    }
    handle.stop();
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server coroutine panicked: {e:?}"))
}
