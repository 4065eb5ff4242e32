//! Run a single polling cycle and exit. Useful for the first import
//! (which backfills from January 1 of the previous year) and for
//! checking a deployment by hand.

use std::time::Duration;

use anyhow::{bail, Result};
use gdb_client::GdbClient;
use poller_service::{
    config::AppConfig, coordinator::Coordinator, observability, store::questdb::QuestDbStore,
};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(cfg.questdb.max_connections)
        .connect(&cfg.questdb.uri)
        .await?;
    let store = QuestDbStore::new(
        pool,
        cfg.store.max_retries,
        Duration::from_millis(cfg.store.retry_backoff_ms),
    );

    let account = &cfg.account;
    let client = match &account.base_url {
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
    };

    let interval = Duration::from_secs(cfg.poller.update_interval_hours * 3600);
    let mut coordinator = Coordinator::new(client, store, interval);

    match coordinator.run_cycle().await {
        Ok(outcome) => {
            println!("appended {} day(s) per series", outcome.appended_days);
            if let Some(total) = outcome.snapshot {
                println!(
                    "current bill: {:.1} kWh, {:.1} m3, {:.2} EUR",
                    total.energy_kwh, total.volume_m3, total.price_eur
                );
            }
            Ok(())
        }
        Err(e) => bail!("cycle failed: {e}"),
    }
}
