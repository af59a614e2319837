use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use super::attribute;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::path::AppPath;
use crate::models::attribute::{
    AttributeListQuery, AttributePatchRequest, AttributeRequest, AttributeResponse,
};
use crate::repository::attribute::TagKind;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/tags",
    tag = "Tags",
    operation_id = "listTags",
    summary = "List own tags",
    description = "Returns the caller's tags ordered by name, then id, both descending. With `assigned_only=1` only tags used by at least one recipe are returned, each once.",
    params(AttributeListQuery),
    responses(
        (status = 200, description = "List of tags", body = Vec<AttributeResponse>),
        (status = 400, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_tags(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AttributeListQuery>,
) -> Result<Json<Vec<AttributeResponse>>, AppError> {
    attribute::list::<TagKind>(&state.db, auth_user.user_id, &query).await
}

#[utoipa::path(
    post,
    path = "/tags",
    tag = "Tags",
    operation_id = "createTag",
    summary = "Create a tag",
    description = "Creates a tag owned by the caller. Names need not be unique.",
    request_body = AttributeRequest,
    responses(
        (status = 201, description = "Tag created", body = AttributeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<AttributeRequest>,
) -> Result<impl IntoResponse, AppError> {
    attribute::create::<TagKind>(&state.db, auth_user.user_id, payload).await
}

#[utoipa::path(
    get,
    path = "/tags/{id}",
    tag = "Tags",
    operation_id = "getTag",
    summary = "Get a tag by ID",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag", body = AttributeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn get_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<AttributeResponse>, AppError> {
    attribute::retrieve::<TagKind>(&state.db, auth_user.user_id, id).await
}

#[utoipa::path(
    put,
    path = "/tags/{id}",
    tag = "Tags",
    operation_id = "replaceTag",
    summary = "Replace a tag",
    params(("id" = i32, Path, description = "Tag ID")),
    request_body = AttributeRequest,
    responses(
        (status = 200, description = "Tag updated", body = AttributeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn replace_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<AttributeRequest>,
) -> Result<Json<AttributeResponse>, AppError> {
    attribute::replace::<TagKind>(&state.db, auth_user.user_id, id, payload).await
}

#[utoipa::path(
    patch,
    path = "/tags/{id}",
    tag = "Tags",
    operation_id = "updateTag",
    summary = "Update a tag",
    description = "An empty body returns the tag unchanged.",
    params(("id" = i32, Path, description = "Tag ID")),
    request_body = AttributePatchRequest,
    responses(
        (status = 200, description = "Tag updated", body = AttributeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn update_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<AttributePatchRequest>,
) -> Result<Json<AttributeResponse>, AppError> {
    attribute::update::<TagKind>(&state.db, auth_user.user_id, id, payload).await
}

#[utoipa::path(
    delete,
    path = "/tags/{id}",
    tag = "Tags",
    operation_id = "deleteTag",
    summary = "Delete a tag",
    description = "Deletes the tag and unlinks it from every recipe.",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 204, description = "Tag deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn delete_tag(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    attribute::delete::<TagKind>(&state.db, auth_user.user_id, id).await
}
