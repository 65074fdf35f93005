//! End-to-end tests: handlers, shutdown and static files over a real socket.

use std::sync::Arc;
use std::time::Duration;

use app_lifecycle::config::AppConfig;
use app_lifecycle::{App, ClientHandler, LifecycleError, LifecycleHandler, RuntimeContext, RuntimeState};
use futures_util::SinkExt;
use tokio_tungstenite::tungstenite::Message;

mod common;

use common::{recorder, start_server, wait_for_state, wait_until, EventLog};

#[tokio::test]
async fn test_full_run_cycle_invokes_handlers_in_order() {
    let ctx = Arc::new(RuntimeContext::new(false));
    let app = App::new(ctx.clone());
    let log: EventLog = Default::default();

    for name in ["A", "B", "C"] {
        app.on_startup(recorder(&log, name)).unwrap();
    }
    app.on_shutdown(recorder(&log, "down-1"));
    app.on_shutdown(recorder(&log, "down-2"));

    let shutdown = app.shutdown_handle();
    let server = start_server(app, AppConfig::default()).await;

    assert_eq!(*log.lock().unwrap(), vec!["A", "B", "C"]);

    shutdown.shutdown().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .expect("server should stop")
        .unwrap()
        .unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["A", "B", "C", "down-1", "down-2"]);
    assert_eq!(ctx.state(), RuntimeState::Stopped);
}

#[tokio::test]
async fn test_startup_registration_rejected_while_serving() {
    let ctx = Arc::new(RuntimeContext::new(false));
    let app = App::new(ctx.clone());
    let log: EventLog = Default::default();
    app.on_startup(recorder(&log, "A")).unwrap();

    // A second facade over the same context stands in for late user code.
    let late = App::new(ctx.clone());
    let server = start_server(app, AppConfig::default()).await;

    assert_eq!(
        late.on_startup(recorder(&log, "D")),
        Err(LifecycleError::InvalidLifecyclePhase)
    );
    assert_eq!(ctx.handlers().counts().startup, 1);

    late.shutdown().await.unwrap();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_static_files_over_http() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("logo.svg"), "<svg/>").unwrap();

    let ctx = Arc::new(RuntimeContext::new(false));
    let mut app = App::new(ctx.clone());
    app.add_static_files("/static", dir.path()).unwrap();
    let shutdown = app.shutdown_handle();

    let server = start_server(app, AppConfig::default()).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .get(format!("http://{}/static/logo.svg", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "<svg/>");

    let res = client
        .get(format!("http://{}/static/other.svg", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    shutdown.shutdown().await.unwrap();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_websocket_client_fires_connect_and_disconnect() {
    let ctx = Arc::new(RuntimeContext::new(false));
    let app = App::new(ctx.clone());
    let log: EventLog = Default::default();

    let l = log.clone();
    app.on_connect(ClientHandler::from_fn(move |client| {
        l.lock().unwrap().push(format!("connect {}", client.id));
    }));
    app.on_connect(recorder(&log, "connect (no client)"));
    let l = log.clone();
    app.on_disconnect(ClientHandler::from_fn(move |client| {
        l.lock().unwrap().push(format!("disconnect {}", client.id));
    }));
    let shutdown = app.shutdown_handle();

    let server = start_server(app, AppConfig::default()).await;

    let url = format!("ws://{}/_app/ws", server.addr);
    let (mut socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    wait_until(|| log.lock().unwrap().len() == 2).await;

    socket.send(Message::Close(None)).await.unwrap();
    wait_until(|| log.lock().unwrap().len() == 3).await;

    let events = log.lock().unwrap().clone();
    let id = events[0].strip_prefix("connect ").unwrap().to_string();
    assert_eq!(events[1], "connect (no client)");
    assert_eq!(events[2], format!("disconnect {id}"));

    shutdown.shutdown().await.unwrap();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_open_clients_disconnect_on_shutdown() {
    let ctx = Arc::new(RuntimeContext::new(false));
    let app = App::new(ctx.clone());
    let log: EventLog = Default::default();
    app.on_disconnect(recorder(&log, "disconnect"));
    let shutdown = app.shutdown_handle();

    let server = start_server(app, AppConfig::default()).await;
    let url = format!("ws://{}/_app/ws", server.addr);
    let (_socket, _) = tokio_tungstenite::connect_async(url).await.unwrap();

    shutdown.shutdown().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .expect("server should stop")
        .unwrap()
        .unwrap();
    wait_until(|| log.lock().unwrap().len() == 1).await;
}

#[tokio::test]
async fn test_shutdown_rejected_with_reload_and_reload_restarts_cycle() {
    let ctx = Arc::new(RuntimeContext::new(true));
    let app = App::new(ctx.clone());
    let log: EventLog = Default::default();
    app.on_startup(recorder(&log, "up")).unwrap();
    app.on_shutdown(recorder(&log, "down"));

    let server = start_server(app, AppConfig::default()).await;

    let facade = App::new(ctx.clone());
    assert_eq!(
        facade.shutdown().await,
        Err(LifecycleError::UnsupportedOperation("shutdown()"))
    );
    assert!(!ctx.server().should_exit());

    server.reload_tx.send(()).unwrap();
    wait_until(|| log.lock().unwrap().len() == 3).await;
    wait_for_state(&ctx, RuntimeState::Started).await;
    assert_eq!(*log.lock().unwrap(), vec!["up", "down", "up"]);

    // Still serving on the same address after the restart.
    let res = reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
        .get(format!("http://{}/missing", server.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);

    // The supervisor itself (signals) may still end the run.
    ctx.server().request_exit();
    server.task.await.unwrap().unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["up", "down", "up", "down"]);
}

#[tokio::test]
async fn test_background_tasks_cancelled_at_shutdown() {
    let ctx = Arc::new(RuntimeContext::new(false));
    let app = App::new(ctx.clone());
    let log: EventLog = Default::default();

    let (c, l) = (ctx.clone(), log.clone());
    app.on_startup(LifecycleHandler::from_fn(move || {
        let l = l.clone();
        c.spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            l.lock().unwrap().push("background finished".into());
        });
    }))
    .unwrap();
    let shutdown = app.shutdown_handle();

    let server = start_server(app, AppConfig::default()).await;
    assert_eq!(ctx.background_task_count(), 1);

    shutdown.shutdown().await.unwrap();
    server.task.await.unwrap().unwrap();

    assert_eq!(ctx.background_task_count(), 0);
    assert!(log.lock().unwrap().is_empty());
}
