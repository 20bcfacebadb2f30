//! Storefront billing server.
//!
//! Reads configuration from `STOREFRONT_BILLING__*` environment variables
//! (and `.env` if present), then serves the billing API until Ctrl+C.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_billing::adapters::fulfillment::LoggingFulfillmentNotifier;
use storefront_billing::adapters::http::{router, BillingAppState};
use storefront_billing::adapters::stripe::StripeBillingAdapter;
use storefront_billing::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    // Initialize tracing; JSON lines in production, human-readable otherwise
    let (json_layer, pretty_layer) = if config.is_production() {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };
    let default_filter = config.server.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(json_layer)
        .with(pretty_layer)
        .init();

    config.validate()?;

    let billing = &config.billing;
    if billing.is_test_mode() {
        tracing::info!("Using Stripe test mode keys");
    }

    let backend = StripeBillingAdapter::new(billing.stripe_config())?;
    let catalog = billing.price_catalog();
    tracing::info!(prices = ?catalog.lookup_keys(), "Price catalog loaded");

    let verifier = billing.webhook_verifier();
    tracing::info!(tolerance_secs = verifier.tolerance_secs(), "Webhook verifier ready");

    let state = BillingAppState {
        backend: Arc::new(backend),
        catalog: Arc::new(catalog),
        verifier: Arc::new(verifier),
        fulfillment: Arc::new(LoggingFulfillmentNotifier::new()),
        add_on_name: billing.fulfillment_add_on.clone(),
        publishable_key: billing.stripe_publishable_key.clone(),
    };

    let app = router(
        state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(environment = ?config.server.environment, "Storefront billing listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
