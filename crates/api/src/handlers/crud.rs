//! Generic CRUD handlers
//!
//! Every resource is served by the same handlers, instantiated per entity
//! in the router. Extracting [`RequestContext`] authenticates the request.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use labdesk_common::{
    auth::RequestContext,
    db::{DetailOptions, Expand, KeyOf, ListQuery, Page},
    errors::{AppError, Result},
};
use sea_orm::{ActiveModelBehavior, ActiveModelTrait, IntoActiveModel};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::AppState;

/// Body of a successful create, update or delete
#[derive(Debug, Serialize)]
pub struct MutationResponse<T> {
    pub message: String,
    pub resource: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

fn bad_query(rejection: QueryRejection) -> AppError {
    AppError::Validation {
        message: rejection.body_text(),
        field: None,
    }
}

fn bad_path(rejection: PathRejection) -> AppError {
    AppError::InvalidFormat {
        message: rejection.body_text(),
    }
}

fn bad_body(rejection: JsonRejection) -> AppError {
    AppError::Validation {
        message: rejection.body_text(),
        field: None,
    }
}

/// `GET /` - one page of rows
pub async fn list<E>(
    State(state): State<AppState>,
    ctx: RequestContext,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
    filter: std::result::Result<Query<E::Filter>, QueryRejection>,
) -> Result<Json<Page<E::Model>>>
where
    E: Expand,
    E::Model: Serialize + Sync,
{
    let Query(query) = query.map_err(bad_query)?;
    let Query(filter) = filter.map_err(bad_query)?;

    debug!(
        request_id = %ctx.request_id,
        resource = E::LABEL,
        page = query.page,
        limit = query.limit,
        "List request"
    );

    let page = state.repo.list::<E>(&query, &filter).await?;
    Ok(Json(page))
}

/// `GET /all` - every row, for dropdowns
pub async fn all<E>(
    State(state): State<AppState>,
    _ctx: RequestContext,
    filter: std::result::Result<Query<E::Filter>, QueryRejection>,
) -> Result<Json<Vec<E::Model>>>
where
    E: Expand,
    E::Model: Serialize + Sync,
{
    let Query(filter) = filter.map_err(bad_query)?;
    let rows = state.repo.all::<E>(&filter).await?;
    Ok(Json(rows))
}

/// `GET /{key}` - detail view, expanded with `includeAssociations=true`
pub async fn detail<E>(
    State(state): State<AppState>,
    _ctx: RequestContext,
    key: std::result::Result<Path<KeyOf<E>>, PathRejection>,
    options: std::result::Result<Query<DetailOptions>, QueryRejection>,
) -> Result<Json<Value>>
where
    E: Expand,
    KeyOf<E>: Clone + DeserializeOwned,
{
    let Path(key) = key.map_err(bad_path)?;
    let Query(options) = options.map_err(bad_query)?;

    let detail = state.repo.detail::<E>(key, options).await?;
    Ok(Json(detail))
}

/// `POST /` - create a row
pub async fn create<E>(
    State(state): State<AppState>,
    ctx: RequestContext,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<MutationResponse<E::Model>>)>
where
    E: Expand,
    E::Model: Serialize + IntoActiveModel<E::ActiveModel> + Clone + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    KeyOf<E>: Clone,
{
    let Json(body) = body.map_err(bad_body)?;
    let model = state.repo.create::<E>(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(MutationResponse {
            message: ctx.locale.created(E::LABEL),
            resource: E::LABEL,
            data: Some(model),
        }),
    ))
}

/// `PUT /{key}` - partial update of a row
pub async fn update<E>(
    State(state): State<AppState>,
    ctx: RequestContext,
    key: std::result::Result<Path<KeyOf<E>>, PathRejection>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<MutationResponse<E::Model>>>
where
    E: Expand,
    E::Model: Serialize + IntoActiveModel<E::ActiveModel> + Clone + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    KeyOf<E>: Clone + DeserializeOwned,
{
    let Path(key) = key.map_err(bad_path)?;
    let Json(body) = body.map_err(bad_body)?;
    let model = state.repo.update::<E>(key, body).await?;

    Ok(Json(MutationResponse {
        message: ctx.locale.updated(E::LABEL),
        resource: E::LABEL,
        data: Some(model),
    }))
}

/// `DELETE /{key}` - delete a row
pub async fn delete<E>(
    State(state): State<AppState>,
    ctx: RequestContext,
    key: std::result::Result<Path<KeyOf<E>>, PathRejection>,
) -> Result<Json<MutationResponse<()>>>
where
    E: Expand,
    KeyOf<E>: Clone + DeserializeOwned,
{
    let Path(key) = key.map_err(bad_path)?;
    state.repo.delete::<E>(key).await?;

    Ok(Json(MutationResponse {
        message: ctx.locale.deleted(E::LABEL),
        resource: E::LABEL,
        data: None,
    }))
}
