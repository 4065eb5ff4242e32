use std::time::Duration;

use anyhow::Result;
use gdb_client::GdbClient;
use poller_service::{
    config::AppConfig, coordinator::Coordinator, metrics_server, observability,
    store::questdb::QuestDbStore,
};
use sqlx::postgres::PgPoolOptions;

fn build_client(cfg: &AppConfig) -> GdbClient {
    let account = &cfg.account;
    match &account.base_url {
        Some(base_url) => GdbClient::with_base_url(
            base_url.clone(),
            account.username.clone(),
            account.password.clone(),
            account.house.clone(),
        ),
        None => GdbClient::new(
            account.username.clone(),
            account.password.clone(),
            account.house.clone(),
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr);
    }

    let pool = PgPoolOptions::new()
        .max_connections(cfg.questdb.max_connections)
        .connect(&cfg.questdb.uri)
        .await?;
    let store = QuestDbStore::new(
        pool,
        cfg.store.max_retries,
        Duration::from_millis(cfg.store.retry_backoff_ms),
    );

    let client = build_client(&cfg);
    let interval = Duration::from_secs(cfg.poller.update_interval_hours * 3600);

    Coordinator::new(client, store, interval).run().await
}
