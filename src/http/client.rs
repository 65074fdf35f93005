//! Client connection endpoint.
//!
//! # Responsibilities
//! - Accept WebSocket upgrades from browser clients
//! - Assign each connection a `ClientHandle`
//! - Fire connect handlers on upgrade and disconnect handlers on close
//!
//! # Data Flow
//! ```text
//! GET {ws_path} (Upgrade: websocket)
//!     → ClientHandle { id, user_agent }
//!     → driver.client_connected
//!     → read frames until Close / error / server exit
//!     → driver.client_disconnected
//! ```
//!
//! # Design Decisions
//! - Incoming frames are drained, not interpreted; pings are answered by axum
//! - Server exit or teardown closes open clients so disconnect handlers still run

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, HeaderMap},
    response::Response,
    routing::get,
    Router,
};

use crate::lifecycle::{ClientHandle, LifecycleDriver};

/// Router serving the client endpoint at `ws_path`.
pub fn client_router(ws_path: &str, driver: LifecycleDriver) -> Router {
    Router::new()
        .route(ws_path, get(client_upgrade))
        .with_state(driver)
}

async fn client_upgrade(
    State(driver): State<LifecycleDriver>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let client = ClientHandle::new(user_agent);

    ws.on_upgrade(move |socket| client_session(socket, driver, client))
}

async fn client_session(mut socket: WebSocket, driver: LifecycleDriver, client: ClientHandle) {
    driver.client_connected(&client).await;

    let ctx = driver.context().clone();
    loop {
        tokio::select! {
            msg = socket.recv() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(client_id = %client.id, error = %e, "Client socket error");
                    break;
                }
            },
            _ = ctx.server().wait_for_exit() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            _ = ctx.wait_for_stopping() => {
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
        }
    }

    driver.client_disconnected(&client).await;
}
