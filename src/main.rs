use anyhow::Context;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cache;
mod config;
mod consumer;
mod domain;
mod http;
mod messaging;
mod metrics;
mod service;
mod store;
mod utils;

use cache::{BoundedCache, OrderCache};
use config::Config;
use consumer::OrderConsumer;
use domain::order::Order;
use messaging::KafkaSource;
use service::OrderService;
use store::{OrderRepository, PostgresOrderRepository};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_service=debug")),
        )
        .init();

    tracing::info!("🚀 Starting order service");

    // === 1. Configuration ===
    let config = Config::from_env().context("failed to load configuration")?;

    // === 2. Durable store ===
    tracing::info!(
        host = %config.database.host,
        port = config.database.port,
        database = %config.database.name,
        "Connecting to PostgreSQL"
    );
    let repo = Arc::new(
        PostgresOrderRepository::connect(&config.database)
            .await
            .context("failed to connect to PostgreSQL")?,
    );

    // === 3. Cache, metrics, service ===
    let cache: Arc<dyn OrderCache> = Arc::new(
        BoundedCache::<Arc<Order>>::new(config.cache.size).context("failed to create cache")?,
    );

    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!(
        "📊 Metrics registry created with {} metrics",
        metrics.registry().gather().len()
    );

    let service = Arc::new(OrderService::new(
        repo.clone() as Arc<dyn OrderRepository>,
        cache,
        metrics.clone(),
    ));

    match service.warm_up_cache().await {
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Cache warm-up failed, starting cold"),
    }

    // === 4. Metrics server ===
    let metrics_server = metrics::start_metrics_server(
        Arc::new(metrics.registry().clone()),
        config.metrics_port,
    )
    .context("failed to bind metrics server")?;
    let metrics_handle = metrics_server.handle();
    tokio::spawn(async move {
        if let Err(e) = metrics_server.await {
            tracing::error!(error = %e, "Metrics server error");
        }
    });

    // === 5. Consumption loop ===
    let source = KafkaSource::new(&config.kafka).context("failed to create Kafka consumer")?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut order_consumer = OrderConsumer::new(source, service.clone(), metrics.clone());
    let consumer_task = tokio::spawn(async move {
        order_consumer.run(shutdown_rx).await;
        order_consumer.state()
    });

    // === 6. HTTP read path ===
    let http_server = http::start_http_server(service, config.server.port)
        .context("failed to bind HTTP server")?;
    let http_handle = http_server.handle();
    let http_task = tokio::spawn(http_server);

    tracing::info!("✅ Order service running");

    wait_for_shutdown().await;
    tracing::info!("Shutdown requested");

    let _ = shutdown_tx.send(true);

    http_handle.stop(true).await;
    match http_task.await {
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server error"),
        Err(e) => tracing::error!(error = %e, "HTTP server task failed"),
        Ok(Ok(())) => {}
    }

    match consumer_task.await {
        Ok(state) => tracing::info!(state = ?state, "Consumer drained"),
        Err(e) => tracing::error!(error = %e, "Consumer task failed"),
    }

    metrics_handle.stop(true).await;
    repo.close().await;

    tracing::info!("👋 Order service stopped");
    Ok(())
}

/// Resolve on Ctrl-C, or on SIGTERM where available.
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
