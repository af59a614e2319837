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
use crate::repository::attribute::IngredientKind;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/ingredients",
    tag = "Ingredients",
    operation_id = "listIngredients",
    summary = "List own ingredients",
    description = "Returns the caller's ingredients ordered by name, then id, both descending. With `assigned_only=1` only ingredients used by at least one recipe are returned, each once.",
    params(AttributeListQuery),
    responses(
        (status = 200, description = "List of ingredients", body = Vec<AttributeResponse>),
        (status = 400, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_ingredients(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AttributeListQuery>,
) -> Result<Json<Vec<AttributeResponse>>, AppError> {
    attribute::list::<IngredientKind>(&state.db, auth_user.user_id, &query).await
}

#[utoipa::path(
    post,
    path = "/ingredients",
    tag = "Ingredients",
    operation_id = "createIngredient",
    summary = "Create an ingredient",
    description = "Creates an ingredient owned by the caller. Names need not be unique.",
    request_body = AttributeRequest,
    responses(
        (status = 201, description = "Ingredient created", body = AttributeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn create_ingredient(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<AttributeRequest>,
) -> Result<impl IntoResponse, AppError> {
    attribute::create::<IngredientKind>(&state.db, auth_user.user_id, payload).await
}

#[utoipa::path(
    get,
    path = "/ingredients/{id}",
    tag = "Ingredients",
    operation_id = "getIngredient",
    summary = "Get an ingredient by ID",
    params(("id" = i32, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Ingredient", body = AttributeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn get_ingredient(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<AttributeResponse>, AppError> {
    attribute::retrieve::<IngredientKind>(&state.db, auth_user.user_id, id).await
}

#[utoipa::path(
    put,
    path = "/ingredients/{id}",
    tag = "Ingredients",
    operation_id = "replaceIngredient",
    summary = "Replace an ingredient",
    params(("id" = i32, Path, description = "Ingredient ID")),
    request_body = AttributeRequest,
    responses(
        (status = 200, description = "Ingredient updated", body = AttributeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn replace_ingredient(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<AttributeRequest>,
) -> Result<Json<AttributeResponse>, AppError> {
    attribute::replace::<IngredientKind>(&state.db, auth_user.user_id, id, payload).await
}

#[utoipa::path(
    patch,
    path = "/ingredients/{id}",
    tag = "Ingredients",
    operation_id = "updateIngredient",
    summary = "Update an ingredient",
    description = "An empty body returns the ingredient unchanged.",
    params(("id" = i32, Path, description = "Ingredient ID")),
    request_body = AttributePatchRequest,
    responses(
        (status = 200, description = "Ingredient updated", body = AttributeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn update_ingredient(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<AttributePatchRequest>,
) -> Result<Json<AttributeResponse>, AppError> {
    attribute::update::<IngredientKind>(&state.db, auth_user.user_id, id, payload).await
}

#[utoipa::path(
    delete,
    path = "/ingredients/{id}",
    tag = "Ingredients",
    operation_id = "deleteIngredient",
    summary = "Delete an ingredient",
    description = "Deletes the ingredient and unlinks it from every recipe.",
    params(("id" = i32, Path, description = "Ingredient ID")),
    responses(
        (status = 204, description = "Ingredient deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Ingredient not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn delete_ingredient(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    attribute::delete::<IngredientKind>(&state.db, auth_user.user_id, id).await
}
