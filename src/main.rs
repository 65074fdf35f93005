//! app-lifecycle demo server.
//!
//! Serves a small page, the client WebSocket endpoint and any configured
//! static directories, logging every lifecycle event.
//!
//! ```text
//! app-lifecycle --config app.toml --static /static=./public
//! curl -X POST http://127.0.0.1:8080/shutdown
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use app_lifecycle::config::{load_config, AppConfig, StaticFilesConfig};
use app_lifecycle::lifecycle::{signals, ReloadWatcher};
use app_lifecycle::observability::init_logging;
use app_lifecycle::{App, ClientHandler, HttpServer, LifecycleHandler, RuntimeContext};
use axum::http::StatusCode;
use axum::routing::{get, post};
use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "app-lifecycle")]
#[command(about = "Web application with lifecycle hooks and static file mounts", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,

    /// Enable auto-reload (restart the run cycle on file changes)
    #[arg(long)]
    reload: bool,

    /// Mount a static directory, as PATH=DIR (repeatable)
    #[arg(long = "static", value_name = "PATH=DIR", value_parser = parse_static)]
    static_files: Vec<StaticFilesConfig>,
}

fn parse_static(arg: &str) -> Result<StaticFilesConfig, String> {
    let (path, directory) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected PATH=DIR, got {arg:?}"))?;
    Ok(StaticFilesConfig {
        path: path.to_string(),
        directory: PathBuf::from(directory),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    config.reload.enabled |= cli.reload;
    config.static_files.extend(cli.static_files);

    init_logging(&config.observability)?;
    tracing::info!("app-lifecycle v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        reload = config.reload.enabled,
        static_mounts = config.static_files.len(),
        "Configuration loaded"
    );

    let ctx = Arc::new(RuntimeContext::new(config.reload.enabled));
    let mut app = App::new(ctx.clone());

    app.on_startup(LifecycleHandler::from_fn(|| tracing::info!("Startup handler ran")))?;
    app.on_shutdown(LifecycleHandler::from_async(|| async {
        tracing::info!("Shutdown handler ran");
    }));
    app.on_connect(ClientHandler::from_fn(|client| {
        tracing::info!(client_id = %client.id, user_agent = ?client.user_agent, "Client connected");
    }));
    app.on_disconnect(ClientHandler::from_fn(|client| {
        tracing::info!(client_id = %client.id, "Client disconnected");
    }));

    for mount in &config.static_files {
        app.add_static_files(&mount.path, &mount.directory)?;
    }

    let shutdown = app.shutdown_handle();
    app.route("/", get(|| async { "app-lifecycle is running\n" }))?;
    app.route(
        "/shutdown",
        post(move || {
            let shutdown = shutdown.clone();
            async move {
                match shutdown.shutdown().await {
                    Ok(()) => (StatusCode::ACCEPTED, "shutting down\n".to_string()),
                    Err(e) => (StatusCode::CONFLICT, format!("{e}\n")),
                }
            }
        }),
    )?;

    // Keep the watcher alive for the whole run.
    let (reloads, _watcher) = if config.reload.enabled {
        let (watcher, rx) = ReloadWatcher::new(&config.reload);
        (rx, Some(watcher.run()?))
    } else {
        (mpsc::unbounded_channel().1, None)
    };

    signals::install(ctx.clone());

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, app)?;
    server.run(listener, reloads).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
