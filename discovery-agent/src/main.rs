mod api;
mod config;
mod service;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use anyhow::{Context, Result};
use service_discovery::{BrowserEvent, Discovery, Service};
use crate::config::Config;
use crate::service::StaticService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("discovery_agent=info,service_discovery=info"))
        )
        .init();

    tracing::info!("Starting discovery-agent");

    // Load config
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/etc/discovery-agent/agent.toml".to_string());

    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path))?;

    tracing::info!("Loaded config from {}", config_path);

    let discovery = Arc::new(
        Discovery::from_config(config.discovery.clone())
            .context("Failed to initialize mDNS discovery")?,
    );

    // Create cancellation token for graceful shutdown
    let cancel = CancellationToken::new();
    let mut service_handles = Vec::new();

    // Start each configured service, then announce it
    for service_config in &config.services {
        let service = Arc::new(StaticService::from_config(
            service_config,
            &config.discovery.service_type,
        )?);

        let start_service = service.clone();
        let start_cancel = cancel.clone();
        service_handles.push(tokio::spawn(async move {
            if let Err(e) = start_service.start(start_cancel).await {
                tracing::error!("Service {} failed: {}", start_service.id(), e);
            }
        }));

        discovery
            .register(service.as_ref())
            .await
            .with_context(|| format!("Failed to register service {}", service_config.id))?;
    }

    // Spawn mDNS browser task
    let browser_handle = if config.browse.enabled {
        let mut events = discovery
            .browse(cancel.clone())
            .context("Failed to start mDNS browser")?;
        Some(tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    BrowserEvent::Resolved(service) => tracing::info!(
                        instance = %service.instance_name,
                        port = service.port,
                        addresses = ?service.addresses,
                        "Discovered service"
                    ),
                    BrowserEvent::Removed(instance_name) => {
                        tracing::info!(instance = %instance_name, "Service went away")
                    }
                }
            }
        }))
    } else {
        None
    };

    // Build API router
    let app = api::routes::router(api::routes::AppState {
        discovery: discovery.clone(),
    });

    // Bind HTTP server
    let listener = tokio::net::TcpListener::bind(&config.api.listen)
        .await
        .with_context(|| format!("Failed to bind to {}", config.api.listen))?;

    tracing::info!("API listening on {}", config.api.listen);

    // Run server with graceful shutdown
    let server_cancel = cancel.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move { server_cancel.cancelled().await })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutdown signal received");

    // Trigger cancellation
    cancel.cancel();

    // Wait for all tasks to complete
    let _ = server_handle.await;
    if let Some(handle) = browser_handle {
        let _ = handle.await;
    }
    for handle in service_handles {
        let _ = handle.await;
    }

    // Withdraw announcements and stop the mDNS daemon
    if let Err(e) = discovery.shutdown().await {
        tracing::error!("Failed to shut down discovery: {}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
