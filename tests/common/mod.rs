//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use app_lifecycle::config::AppConfig;
use app_lifecycle::http::ServerError;
use app_lifecycle::{App, HttpServer, LifecycleHandler, RuntimeState};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Ordered log shared between handlers and assertions.
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Handler that appends `name` to `log` when invoked.
pub fn recorder(log: &EventLog, name: &str) -> LifecycleHandler {
    let log = log.clone();
    let name = name.to_string();
    LifecycleHandler::from_fn(move || log.lock().unwrap().push(name.clone()))
}

/// A server running on an ephemeral port.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub reload_tx: mpsc::UnboundedSender<()>,
    pub task: JoinHandle<Result<(), ServerError>>,
}

/// Bind an ephemeral port, spawn the server and wait until it is `Started`.
pub async fn start_server(app: App, config: AppConfig) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (reload_tx, reload_rx) = mpsc::unbounded_channel();

    let ctx = app.context().clone();
    let server = HttpServer::new(config, app).unwrap();
    let task = tokio::spawn(server.run(listener, reload_rx));

    wait_for_state(&ctx, RuntimeState::Started).await;
    RunningServer {
        addr,
        reload_tx,
        task,
    }
}

/// Poll `ctx` until it reaches `state`, failing after a few seconds.
pub async fn wait_for_state(ctx: &app_lifecycle::RuntimeContext, state: RuntimeState) {
    wait_until(|| ctx.state() == state).await;
}

/// Poll `cond` until it holds, failing after a few seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
