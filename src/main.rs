#![deny(unused)]
//! RecordOps - bulk record lifecycle service
//!
//! Serves the administrative commands and the record import/fetch surface
//! over one record store and one file sweep strategy chosen by configuration.

use secrecy::ExposeSecret;
use std::sync::Arc;

use recordops_admin::{admin_router, AdminState};
use recordops_core::config::{AppConfig, StoreBackend};
use recordops_core::traits::RecordStore;
use recordops_governance::{
    AuditStore, FileAuditStore, InMemoryAuditStore, NoOpRbacConnector, RbacConnector,
    StaticTokenRbacConnector,
};
use recordops_store::{file_sweep_from_config, InMemoryRecordStore, JsonFileRecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    recordops_governance::configure_tracing(config.governance.json_logs)?;
    tracing::info!("Starting RecordOps v{}", env!("CARGO_PKG_VERSION"));

    // =========================================================================
    // Record store
    // =========================================================================
    let store: Arc<dyn RecordStore> = match config.store.backend {
        StoreBackend::Memory => {
            tracing::info!("Initializing In-Memory Record Store");
            Arc::new(InMemoryRecordStore::new())
        }
        StoreBackend::JsonFile => {
            tracing::info!(dir = %config.store.data_dir.display(), "Initializing JSON File Record Store");
            Arc::new(JsonFileRecordStore::new(config.store.data_dir.clone()))
        }
    };

    let files = file_sweep_from_config(store.clone(), &config.retention)?;
    tracing::info!(
        strategy = files.name(),
        path = ?files.file_store_path(),
        "File sweep strategy configured"
    );

    // =========================================================================
    // Governance
    // =========================================================================
    let metrics_handle = recordops_governance::setup_metrics_recorder()?;

    let audit_store: Arc<dyn AuditStore> = match &config.governance.audit_log_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Writing audit log to file");
            Arc::new(FileAuditStore::new(path.clone()))
        }
        None => Arc::new(InMemoryAuditStore::new()),
    };

    let rbac: Arc<dyn RbacConnector> = match &config.governance.admin_token {
        Some(token) if !token.expose_secret().is_empty() => {
            Arc::new(StaticTokenRbacConnector::new(token.clone()))
        }
        _ => {
            tracing::warn!("No admin token configured, using NoOpRbacConnector - NOT SUITABLE FOR PRODUCTION");
            Arc::new(NoOpRbacConnector)
        }
    };

    let state = AdminState::new(
        store,
        files,
        &config.store,
        &config.retention,
        audit_store,
        rbac,
    )
    .with_metrics(metrics_handle);

    // =========================================================================
    // Start the server
    // =========================================================================
    let app = admin_router(Arc::new(state));
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        addr = %addr,
        record_class = %config.store.record_class,
        file_store_class = %config.store.file_store_class,
        "RecordOps admin API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("RecordOps stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
