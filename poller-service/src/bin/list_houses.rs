//! List the houses linked to the configured account, for picking the
//! `[account] house` value at setup time.

use anyhow::Result;
use gdb_client::GdbClient;
use poller_service::{config::AppConfig, observability};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let account = &cfg.account;

    let mut client = match &account.base_url {
        Some(base_url) => GdbClient::with_base_url(
            base_url.clone(),
            account.username.clone(),
            account.password.clone(),
            None,
        ),
        None => GdbClient::new(account.username.clone(), account.password.clone(), None),
    };

    client.login().await?;
    let houses = client.list_houses().await?;

    if houses.is_empty() {
        println!("no houses linked to this account");
        return Ok(());
    }

    for house in houses {
        let marker = if house.selected { "*" } else { " " };
        println!(
            "{marker} {}  {}  [{} / {}]",
            house.remote_address_id,
            house.address_street,
            house.contract_type.category,
            house.contract_type.code,
        );
        if let Some(price_category) = &house.price_category {
            println!("      price category: {price_category}");
        }
        for (from, to) in &house.off_peak_times {
            println!("      off-peak: {from}-{to}");
        }
    }
    println!("(* = currently selected by the supplier)");

    Ok(())
}
