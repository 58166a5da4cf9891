// Academic records HTTP routes (students, teachers, courses, enrollments)
//
// Every route requires authentication. Reads are open to all roles; writes are
// gated per collection by `access::policy_for`.

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use uuid::Uuid;

use super::access::policy_for;
use super::common::ListResponse;
use crate::auth::jwt::TokenService;
use crate::auth::middleware::{authenticate, restrict};
use crate::error::{ApiError, ApiJson, ApiPath, ApiQuery};
use crate::services::records::{ListOrder, RecordService};
use crate::storage::{RecordKind, RecordRow};

/// Per-collection state
#[derive(Clone)]
pub struct RecordsState {
    pub kind: RecordKind,
    pub service: Arc<RecordService>,
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// "name", "date" or "students"; `search` is accepted as an alias
    #[serde(alias = "search")]
    pub sort: Option<String>,
}

/// A record as returned to clients: document fields plus server-managed fields
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(flatten)]
    pub data: Map<String, JsonValue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RecordRow> for RecordResponse {
    fn from(row: RecordRow) -> Self {
        Self {
            id: row.id,
            account_id: row.account_id,
            data: row.data,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Create record routes for every collection
pub fn routes(service: Arc<RecordService>, tokens: Arc<TokenService>) -> Router {
    let router = RecordKind::ALL
        .into_iter()
        .fold(Router::new(), |router, kind| {
            router.merge(collection(kind, service.clone()))
        });

    router.route_layer(middleware::from_fn_with_state(tokens, authenticate))
}

fn collection(kind: RecordKind, service: Arc<RecordService>) -> Router {
    let policy = policy_for(kind);
    let base = format!("/api/{}", kind.as_str());

    Router::new()
        .route(
            &base,
            get(list_records).merge(restrict(post(create_record), policy.create)),
        )
        .route(
            &format!("{}/:id", base),
            get(get_record)
                .merge(restrict(put(update_record).patch(update_record), policy.update))
                .merge(restrict(delete(delete_record), policy.delete)),
        )
        .with_state(RecordsState { kind, service })
}

/// GET /api/{kind}?sort= - List records
pub async fn list_records(
    State(state): State<RecordsState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<ListResponse<RecordResponse>>, ApiError> {
    let order = ListOrder::parse(query.sort.as_deref());
    let rows = state.service.list(state.kind, order).await?;
    let items: Vec<RecordResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(items.into()))
}

/// GET /api/{kind}/:id - Get a record
pub async fn get_record(
    State(state): State<RecordsState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<RecordResponse>, ApiError> {
    let row = state.service.get(state.kind, id).await?;
    Ok(Json(row.into()))
}

/// POST /api/{kind} - Create a record
pub async fn create_record(
    State(state): State<RecordsState>,
    ApiJson(body): ApiJson<Map<String, JsonValue>>,
) -> Result<(StatusCode, Json<RecordResponse>), ApiError> {
    let row = state.service.create(state.kind, body).await?;
    Ok((StatusCode::CREATED, Json(row.into())))
}

/// PUT/PATCH /api/{kind}/:id - Merge fields into a record
pub async fn update_record(
    State(state): State<RecordsState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<Map<String, JsonValue>>,
) -> Result<Json<RecordResponse>, ApiError> {
    let row = state.service.update(state.kind, id, body).await?;
    Ok(Json(row.into()))
}

/// DELETE /api/{kind}/:id - Delete a record
pub async fn delete_record(
    State(state): State<RecordsState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.service.delete(state.kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
