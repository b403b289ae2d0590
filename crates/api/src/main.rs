use std::time::Duration;

use anyhow::Context;

use estore_checkout::CheckoutService;
use estore_infra::{CheckoutConfig, Storefront};

const SEED_DEMO_VAR: &str = "ESTORE_SEED_DEMO";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    estore_observability::init();

    let config = CheckoutConfig::from_env().context("invalid storefront configuration")?;
    let bind_addr = config.bind_addr;
    let session_idle = config.session_idle;

    let storefront = Storefront::in_memory(config);
    if std::env::var(SEED_DEMO_VAR).map_or(true, |v| v != "0") {
        storefront
            .seed_demo_catalog()
            .context("failed to seed demo catalog")?;
    }

    spawn_session_sweeper(storefront.checkout.clone(), session_idle);
    let app = estore_api::app::build_app(storefront);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically drop sessions that have settled and gone quiet.
fn spawn_session_sweeper(checkout: CheckoutService, idle: Duration) {
    let period = (idle / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            checkout.evict_idle(idle);
        }
    });
}
