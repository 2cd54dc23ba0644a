#![deny(unused)]
//! Admin API for RecordOps.
//!
//! Provides endpoints for:
//! - The destructive administrative commands (`deleteAll`,
//!   `deleteFileStoreBeforeDate`)
//! - Fetch, count, CSV import and lifecycle status of the record collection
//! - File store listing
//! - Metrics and audit log queries

pub mod error;

use axum::{
    extract::{DefaultBodyLimit, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use recordops_core::{
    config::{RetentionConfig, StoreConfig},
    traits::{FileSweepStrategy, RecordStore},
    types::{Credential, DataRecord, FileStoreRecord},
    Error, LifecycleState, Result,
};
use recordops_governance::{
    track_files_deleted, track_records_deleted, track_records_imported, AuditEntry, AuditFilter,
    AuditOutcome, AuditStore, RbacConnector,
};
use recordops_store::{
    ClassPurger, ImportSummary, PaginatedFetcher, RecordManager, RetentionPurger,
};

pub use error::ApiError;

/// Largest accepted CSV upload.
const MAX_IMPORT_BYTES: usize = 64 * 1024 * 1024;

/// Admin API state.
pub struct AdminState {
    pub manager: RecordManager,
    pub purger: ClassPurger,
    pub retention: RetentionPurger,
    pub fetcher: PaginatedFetcher,
    pub file_store_class: String,
    pub audit_store: Arc<dyn AuditStore>,
    pub rbac: Arc<dyn RbacConnector>,
    pub metrics: Option<metrics_exporter_prometheus::PrometheusHandle>,
}

impl AdminState {
    /// Wire the record operations for one store and file sweep strategy.
    pub fn new(
        store: Arc<dyn RecordStore>,
        files: Arc<dyn FileSweepStrategy>,
        store_config: &StoreConfig,
        retention_config: &RetentionConfig,
        audit_store: Arc<dyn AuditStore>,
        rbac: Arc<dyn RbacConnector>,
    ) -> Self {
        Self {
            manager: RecordManager::new(
                store.clone(),
                store_config.record_class.clone(),
                store_config.record_fields.clone(),
            )
            .with_page_size(store_config.page_size),
            purger: ClassPurger::new(store.clone()),
            retention: RetentionPurger::new(store.clone(), files)
                .with_batch_size(retention_config.batch_size),
            fetcher: PaginatedFetcher::new(store).with_page_size(store_config.page_size),
            file_store_class: store_config.file_store_class.clone(),
            audit_store,
            rbac,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: metrics_exporter_prometheus::PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Append an audit entry. A failing audit store does not fail the command.
    async fn audit<T>(
        &self,
        credential: &Credential,
        action: &str,
        resource: &str,
        result: &Result<T>,
        metadata: Value,
    ) {
        let outcome = match result {
            Ok(_) => AuditOutcome::Success,
            Err(Error::Unauthenticated(_)) => AuditOutcome::Denied,
            Err(e) => AuditOutcome::Error(e.to_string()),
        };
        let user = credential.user_id.as_deref().unwrap_or("anonymous");
        let entry = AuditEntry::new(user, action, resource, outcome).with_metadata(metadata);

        if let Err(e) = self.audit_store.log(entry).await {
            tracing::warn!(action, resource, error = %e, "Failed to write audit entry");
        }
    }
}

/// Success payload of an administrative command.
#[derive(Serialize)]
struct CommandResponse<T> {
    status: &'static str,
    #[serde(flatten)]
    body: T,
}

impl<T> CommandResponse<T> {
    fn success(body: T) -> Json<Self> {
        Json(Self {
            status: "success",
            body,
        })
    }
}

/// Lifecycle snapshot with the derived upload percentage.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    #[serde(flatten)]
    state: LifecycleState,
    progress_percentage: u8,
}

impl From<LifecycleState> for StatusResponse {
    fn from(state: LifecycleState) -> Self {
        Self {
            progress_percentage: state.progress_percentage(),
            state,
        }
    }
}

/// Query parameters for audit endpoint.
#[derive(Deserialize)]
pub struct AuditQuery {
    pub user_id: Option<String>,
    pub action: Option<String>,
    pub resource: Option<String>,
    pub limit: Option<usize>,
}

/// Required string parameter of a command body.
fn required_str<'a>(body: &'a Value, name: &str) -> Result<&'a str> {
    body.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            Error::invalid_request(format!(
                "Parameter \"{}\" is required and must be a string.",
                name
            ))
        })
}

/// Optional string parameter of a command body.
fn optional_str<'a>(body: &'a Value, name: &str) -> Result<Option<&'a str>> {
    match body.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(Error::invalid_request(format!(
            "Parameter \"{}\" must be a string.",
            name
        ))),
    }
}

/// Authentication middleware.
///
/// Resolves the bearer token into a [`Credential`] for the handlers.
async fn auth_middleware(
    State(state): State<Arc<AdminState>>,
    mut req: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| Error::unauthenticated("missing bearer token"))?;

    let roles = state.rbac.validate(token).await?;
    req.extensions_mut().insert(roles.credential());
    Ok(next.run(req).await)
}

/// Health check endpoint (public).
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Run a command on its own task so it settles even if the client goes away.
async fn detached<T, F>(command: F) -> Result<T>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    tokio::spawn(command)
        .await
        .unwrap_or_else(|e| Err(Error::internal(format!("Command task failed: {}", e))))
}

/// Delete every object of a class.
async fn delete_all(
    State(state): State<Arc<AdminState>>,
    Extension(credential): Extension<Credential>,
    Json(body): Json<Value>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let class_name = required_str(&body, "className")?.to_string();

    let report = detached(async move {
        let result = state.purger.purge(&credential, &class_name).await;
        state
            .audit(&credential, "deleteAll", &class_name, &result, body)
            .await;
        let report = result?;
        track_records_deleted(&report.class_name, report.deleted_objects);
        Ok(report)
    })
    .await?;

    Ok(CommandResponse::success(report))
}

/// Delete records and stored files older than a date.
async fn delete_file_store_before_date(
    State(state): State<Arc<AdminState>>,
    Extension(credential): Extension<Credential>,
    Json(body): Json<Value>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let before_date = required_str(&body, "beforeDate")?.to_string();
    let class_name = optional_str(&body, "className")?
        .unwrap_or(state.file_store_class.as_str())
        .to_string();

    let report = detached(async move {
        let result = state
            .retention
            .purge_before(&credential, &before_date, &class_name)
            .await;
        state
            .audit(&credential, "deleteFileStoreBeforeDate", &class_name, &result, body)
            .await;
        let report = result?;
        track_records_deleted(&class_name, report.deleted_records);
        track_files_deleted(state.retention.strategy_name(), report.deleted_files);
        Ok(report)
    })
    .await?;

    Ok(CommandResponse::success(report))
}

/// All records of the managed collection, projected onto its fields.
async fn list_records(
    State(state): State<Arc<AdminState>>,
    Extension(credential): Extension<Credential>,
) -> std::result::Result<Json<Vec<DataRecord>>, ApiError> {
    Ok(Json(state.manager.fetch_all(&credential).await?))
}

/// Refresh the record count and return the lifecycle state.
async fn count_records(
    State(state): State<Arc<AdminState>>,
    Extension(credential): Extension<Credential>,
) -> std::result::Result<Json<StatusResponse>, ApiError> {
    state.manager.refresh_count(&credential).await?;
    Ok(Json(state.manager.state().into()))
}

/// Replace the managed collection with an uploaded CSV file.
async fn import_records(
    State(state): State<Arc<AdminState>>,
    Extension(credential): Extension<Credential>,
    csv_text: String,
) -> std::result::Result<Json<ImportSummary>, ApiError> {
    let summary = detached(async move {
        let class_name = state.manager.class_name().to_string();
        let result = state.manager.replace_all(&credential, &csv_text).await;
        let metadata = match &result {
            Ok(summary) => serde_json::json!({
                "previousCount": summary.previous_count,
                "newCount": summary.new_count,
            }),
            Err(_) => Value::Null,
        };
        state
            .audit(&credential, "import", &class_name, &result, metadata)
            .await;
        let summary = result?;
        track_records_deleted(&class_name, summary.previous_count);
        track_records_imported(&class_name, summary.new_count);
        Ok(summary)
    })
    .await?;

    Ok(Json(summary))
}

/// File store records, oldest first.
async fn list_files(
    State(state): State<Arc<AdminState>>,
    Extension(credential): Extension<Credential>,
) -> std::result::Result<Json<Vec<FileStoreRecord>>, ApiError> {
    let files = state
        .fetcher
        .fetch_all_files(&credential, &state.file_store_class)
        .await?;
    Ok(Json(files))
}

/// Current lifecycle snapshot.
async fn get_status(State(state): State<Arc<AdminState>>) -> Json<StatusResponse> {
    Json(state.manager.state().into())
}

/// Query audit logs.
async fn get_audit(
    State(state): State<Arc<AdminState>>,
    Query(query): Query<AuditQuery>,
) -> std::result::Result<Json<Vec<AuditEntry>>, ApiError> {
    let filter = AuditFilter {
        user_id: query.user_id,
        action: query.action,
        resource: query.resource,
        limit: query.limit,
    };

    Ok(Json(state.audit_store.query(filter).await?))
}

/// Prometheus exposition.
async fn get_metrics(State(state): State<Arc<AdminState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

/// Build the admin API router.
pub fn admin_router(state: Arc<AdminState>) -> Router {
    let api_routes = Router::new()
        .route("/functions/deleteAll", post(delete_all))
        .route(
            "/functions/deleteFileStoreBeforeDate",
            post(delete_file_store_before_date),
        )
        .route("/records", get(list_records))
        .route("/records/count", get(count_records))
        .route(
            "/records/import",
            post(import_records).layer(DefaultBodyLimit::max(MAX_IMPORT_BYTES)),
        )
        .route("/files", get(list_files))
        .route("/status", get(get_status))
        .route("/metrics", get(get_metrics))
        .route("/audit", get(get_audit))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(api_routes)
        .route("/health", get(health)) // Public health check
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
