use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::{Html, Json},
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::logic::{parse_payload, Repository};
use crate::model::{Entity, Id};
use crate::store::traits::Store;
use crate::view::{render_page, Collections, PageQuery};

pub type AppState<S> = Arc<S>;

pub type ApiResult<T> = Result<T, ApiError>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Body of a successful write. Deletes carry no `data`.
#[derive(Debug, Serialize)]
pub struct WriteResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> WriteResponse<T> {
    fn with_data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

fn parse_id<E: Entity>(raw: &str) -> ApiResult<Id> {
    raw.parse().map_err(|_| ApiError::InvalidId {
        entity: E::descriptor().label,
        raw: raw.to_string(),
    })
}

pub async fn list_records<S: Store, E: Entity>(
    State(store): State<AppState<S>>,
) -> ApiResult<Json<Vec<E>>> {
    let rows = Repository::<S, E>::new(&store).list().await?;
    Ok(Json(rows))
}

pub async fn get_record<S: Store, E: Entity>(
    State(store): State<AppState<S>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<E>> {
    let id = parse_id::<E>(&raw_id)?;
    let row = Repository::<S, E>::new(&store).get(id).await?;
    Ok(Json(row))
}

pub async fn create_record<S: Store, E: Entity>(
    State(store): State<AppState<S>>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<WriteResponse<E>>)> {
    let draft = parse_payload::<E::Draft>(&body)?;
    let created = Repository::<S, E>::new(&store).create(draft).await?;
    Ok((StatusCode::CREATED, Json(WriteResponse::with_data(created))))
}

pub async fn update_record<S: Store, E: Entity>(
    State(store): State<AppState<S>>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<WriteResponse<E>>> {
    let id = parse_id::<E>(&raw_id)?;
    let patch = parse_payload::<E::Patch>(&body)?;
    let updated = Repository::<S, E>::new(&store).update(id, patch).await?;
    Ok(Json(WriteResponse::with_data(updated)))
}

pub async fn delete_record<S: Store, E: Entity>(
    State(store): State<AppState<S>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<WriteResponse<()>>> {
    let id = parse_id::<E>(&raw_id)?;
    Repository::<S, E>::new(&store).delete(id).await?;
    Ok(Json(WriteResponse {
        success: true,
        data: None,
    }))
}

/// PUT or DELETE on a collection path.
pub async fn missing_id<E: Entity>() -> ApiError {
    ApiError::MissingId(E::descriptor().label)
}

pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}

/// The CRM page, served for every path outside the API.
pub async fn crm_page<S: Store>(
    State(store): State<AppState<S>>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Html<String>> {
    let data = Collections::load(&*store, query.tab()).await?;
    Ok(Html(render_page(&query, &data)))
}
