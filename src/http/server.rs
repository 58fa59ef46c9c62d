//! HTTP API server for the gadget store catalog.
//!
//! Every handler goes through one `Mutex<CatalogApi>`, so an insert and the save
//! that follows it happen under a single lock.

use crate::{
    api::catalog_api::{CatalogApi, CatalogStats, EntityAttributes},
    core::EntityKind,
    error::CatalogError,
    querying::results::ResultTable,
    registry::query_registry::NamedQuery,
    sources::{relational_importer::ImportSummary, relational_source::ImportBatch},
};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Path, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Request to register a named query
#[derive(Debug, Deserialize)]
pub struct RegisterQueryRequest {
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub query: String,
}

/// Response after registering a query
#[derive(Debug, Serialize)]
pub struct RegisterQueryResponse {
    pub key: String,
    pub title: String,
    pub registered_at: u64,
    pub message: String,
}

/// Response for listing queries
#[derive(Debug, Serialize)]
pub struct ListQueriesResponse {
    pub queries: Vec<NamedQuery>,
    pub total: usize,
}

/// Ad-hoc query text
#[derive(Debug, Deserialize)]
pub struct RunQueryRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct InsertEntityRequest {
    pub kind: EntityKind,
    pub id: String,
    #[serde(flatten)]
    pub attributes: EntityAttributes,
}

#[derive(Debug, Deserialize)]
pub struct InsertRelationshipRequest {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

#[derive(Debug, Serialize)]
pub struct EntityListResponse {
    pub kind: EntityKind,
    pub ids: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: String,
    pub stats: CatalogStats,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Shared application state
pub struct AppState {
    pub catalog: Arc<Mutex<CatalogApi>>,
}

/// Custom error type for API errors
#[derive(Debug)]
pub enum ApiError {
    Catalog(CatalogError),
    BadRequest(String),
    /// A request body that is not valid JSON or does not fit the payload type
    Rejected(JsonRejection),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Catalog(e) => (status_for(&e), e.to_string()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Rejected(rejection) => (rejection.status(), rejection.body_text()),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected(rejection)
    }
}

/// `Json` extractor whose rejections use the `{"error": ..}` body of every other
/// failure instead of axum's plain-text one.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

fn status_for(err: &CatalogError) -> StatusCode {
    match err {
        CatalogError::UnknownQuery(_) => StatusCode::NOT_FOUND,
        CatalogError::StoreIo { .. } | CatalogError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        CatalogError::Parse { .. }
        | CatalogError::Unsupported(_)
        | CatalogError::QuerySyntax(_)
        | CatalogError::UnboundProjectionVariable(_)
        | CatalogError::InvalidEntity(_)
        | CatalogError::InvalidLiteral { .. }
        | CatalogError::Import(_) => StatusCode::BAD_REQUEST,
    }
}

fn lock(state: &AppState) -> Result<MutexGuard<'_, CatalogApi>, ApiError> {
    state.catalog.lock().map_err(|_| ApiError::InternalError("catalog lock poisoned".to_string()))
}

/// Create the HTTP server with all routes
pub fn create_server(catalog: Arc<Mutex<CatalogApi>>) -> Router {
    let state = Arc::new(AppState { catalog });

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/queries", get(list_queries).post(register_query))
        .route("/api/queries/:key/results", get(run_named_query))
        .route("/api/query", post(run_query))
        .route("/api/entities", post(insert_entity))
        .route("/api/entities/:kind", get(list_entities))
        .route("/api/relationships", post(insert_relationship))
        .route("/api/import", post(bulk_import))
        .route("/api/export", get(export_turtle))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, ApiError> {
    let stats = lock(&state)?.stats();
    Ok(Json(HealthResponse { message: "Gadget store API is running".to_string(), stats }))
}

/// GET /api/queries - List named queries in registration order
async fn list_queries(State(state): State<Arc<AppState>>) -> Result<Json<ListQueriesResponse>, ApiError> {
    let queries = lock(&state)?.named_queries().to_vec();
    let total = queries.len();
    Ok(Json(ListQueriesResponse { queries, total }))
}

/// POST /api/queries - Register or replace a named query
async fn register_query(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<RegisterQueryRequest>,
) -> Result<Json<RegisterQueryResponse>, ApiError> {
    let named =
        lock(&state)?.register_query(&payload.key, &payload.title, &payload.description, &payload.query)?;
    Ok(Json(RegisterQueryResponse {
        key: named.key,
        title: named.title,
        registered_at: named.registered_at,
        message: "Query registered successfully".to_string(),
    }))
}

/// GET /api/queries/:key/results - Evaluate a named query
async fn run_named_query(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<ResultTable>, ApiError> {
    Ok(Json(lock(&state)?.run_named_query(&key)?))
}

/// POST /api/query - Evaluate ad-hoc query text
async fn run_query(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<RunQueryRequest>,
) -> Result<Json<ResultTable>, ApiError> {
    Ok(Json(lock(&state)?.run_query_text(&payload.query)?))
}

/// POST /api/entities - Insert a product, brand, category, customer or order
async fn insert_entity(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<InsertEntityRequest>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    lock(&state)?.insert_entity(payload.kind, &payload.id, &payload.attributes)?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse { message: format!("{} {} added", payload.kind, payload.id.trim()) }),
    ))
}

/// POST /api/relationships - Link two entities
async fn insert_relationship(
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<InsertRelationshipRequest>,
) -> Result<(StatusCode, Json<SuccessResponse>), ApiError> {
    lock(&state)?.insert_relationship(&payload.subject, &payload.predicate, &payload.object)?;
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse {
            message: format!("{} {} {} added", payload.subject, payload.predicate, payload.object),
        }),
    ))
}

/// GET /api/entities/:kind - Ids of every entity of one kind
async fn list_entities(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<EntityListResponse>, ApiError> {
    let kind: EntityKind = kind.parse().map_err(ApiError::BadRequest)?;
    let ids = lock(&state)?.list_entities(kind);
    let total = ids.len();
    Ok(Json(EntityListResponse { kind, ids, total }))
}

/// POST /api/import - Bulk import a relational batch
async fn bulk_import(
    State(state): State<Arc<AppState>>,
    JsonBody(batch): JsonBody<ImportBatch>,
) -> Result<Json<ImportSummary>, ApiError> {
    Ok(Json(lock(&state)?.bulk_import(&batch)?))
}

/// GET /api/export - The store as Turtle
async fn export_turtle(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let body = lock(&state)?.export_turtle()?;
    Ok(([(header::CONTENT_TYPE, "text/turtle; charset=utf-8")], body).into_response())
}

/// Start the HTTP server on the specified address
pub async fn start_server(addr: &str, catalog: Arc<Mutex<CatalogApi>>) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_server(catalog);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Gadget store HTTP API listening on http://{}", addr);
    info!("  GET    /health                    - Health check and statistics");
    info!("  GET    /api/queries               - List named queries");
    info!("  POST   /api/queries               - Register a named query");
    info!("  GET    /api/queries/:key/results  - Run a named query");
    info!("  POST   /api/query                 - Run ad-hoc query text");
    info!("  POST   /api/entities              - Insert an entity");
    info!("  GET    /api/entities/:kind        - List entity ids of one kind");
    info!("  POST   /api/relationships         - Link two entities");
    info!("  POST   /api/import                - Bulk import a relational batch");
    info!("  GET    /api/export                - Export the store as Turtle");

    axum::serve(listener, app).await?;

    Ok(())
}
