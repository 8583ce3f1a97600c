// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use catalogsync::{
    config::OperatorConfig,
    constants::TOKIO_WORKER_THREADS,
    context::Context,
    controller::run_service_broker_controller,
    osbapi::BrokerClient,
    repositories::ServicePlanRepo,
    server::{self, ApiState},
    store::KubeStore,
};
use clap::Parser;
use kube::Client;
use std::sync::Arc;
use tracing::{debug, error, info};
use url::Url;

fn main() -> Result<()> {
    let config = OperatorConfig::parse();

    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("catalogsync-controller")
        .enable_all()
        .build()?;

    runtime.block_on(async_main(config))
}

/// Initialize logging.
///
/// Respects `RUST_LOG` (default `info`) and `RUST_LOG_FORMAT` (`json` or `text`).
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main(config: OperatorConfig) -> Result<()> {
    init_logging();

    info!("Starting service broker catalog controller");
    config.validate().context("invalid configuration")?;
    debug!(?config, "Configuration loaded");

    let client = Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;

    let store = KubeStore::new(client.clone(), config.field_manager.clone());
    let catalog_client =
        BrokerClient::new(config.catalog_timeout()).context("failed to build HTTP client")?;
    let ctx = Arc::new(Context::new(
        store.clone(),
        catalog_client,
        config.reconcile_settings(),
    ));

    let api_state = Arc::new(ApiState {
        plans: ServicePlanRepo::new(Arc::new(store), config.root_namespace.clone()),
        base_url: Url::parse(&config.api_base_url)?,
    });
    let router = server::router(api_state);

    // The controller and the server should never exit on their own
    tokio::select! {
        result = run_service_broker_controller(client, ctx, config.watch_namespace.clone()) => {
            error!("CRITICAL: ServiceBroker controller exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("ServiceBroker controller exited unexpectedly without error")
        }
        result = server::serve(config.metrics_bind_address, router) => {
            error!("CRITICAL: Metrics server exited unexpectedly: {:?}", result);
            result?;
            anyhow::bail!("Metrics server exited unexpectedly without error")
        }
        result = shutdown_signal() => {
            result?;
            info!("Shutdown signal received, stopping");
            Ok(())
        }
    }
}

async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}
