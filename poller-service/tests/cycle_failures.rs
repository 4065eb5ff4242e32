use std::time::Duration;

use axum::{routing::post, Json, Router};
use gdb_client::domain::SeriesId;
use gdb_client::GdbClient;
use poller_service::coordinator::{Coordinator, CycleError};
use poller_service::store::memory::MemoryStore;
use serde_json::json;

/// Login endpoint that accepts the request but returns a null token,
/// which is how the real API reports rejected credentials.
async fn spawn_null_token_server() -> String {
    let app = Router::new().route(
        "/login_check",
        post(|| async { Json(json!({ "token": null })) }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn rejected_credentials_surface_as_reauthentication_required() {
    let base_url = spawn_null_token_server().await;
    let client = GdbClient::with_base_url(
        base_url,
        "user@example.org".to_string(),
        "wrong-password".to_string(),
        None,
    );
    let mut coordinator = Coordinator::new(client, MemoryStore::new(), Duration::from_secs(1));

    let err = coordinator.run_cycle().await.unwrap_err();
    assert!(matches!(err, CycleError::Auth { .. }));
    assert!(err.to_string().contains("reauthentication required"));

    for id in SeriesId::ALL {
        assert!(coordinator.store().points(id).is_empty());
    }
}

#[tokio::test]
async fn failed_login_aborts_the_cycle_before_any_store_write() {
    // Nothing listens on the discard port, so login dies on transport.
    let client = GdbClient::with_base_url(
        "http://127.0.0.1:9".to_string(),
        "user@example.org".to_string(),
        "secret".to_string(),
        None,
    );
    let mut coordinator = Coordinator::new(client, MemoryStore::new(), Duration::from_secs(1));

    let err = coordinator.run_cycle().await.unwrap_err();
    assert!(matches!(err, CycleError::Transport { .. }));
    assert!(err.to_string().contains("authenticating"));

    for id in SeriesId::ALL {
        assert!(coordinator.store().points(id).is_empty());
    }
}
