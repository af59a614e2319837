use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::path::AppPath;
use crate::models::admin::{AdminCreateUserRequest, AdminUpdateUserRequest, AdminUserResponse};
use crate::repository::account::AccountStore;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/users",
    tag = "Admin",
    operation_id = "adminListUsers",
    summary = "List all accounts",
    description = "Returns every account ordered by id. Staff only.",
    responses(
        (status = 200, description = "List of accounts", body = Vec<AdminUserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminUserResponse>>, AppError> {
    auth_user.require_staff()?;

    let users = AccountStore::new(&state.db)
        .list()
        .await?
        .into_iter()
        .map(AdminUserResponse::from)
        .collect();

    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Admin",
    operation_id = "adminCreateUser",
    summary = "Create an account",
    description = "Creates an account, optionally with staff rights. Staff only.",
    request_body = AdminCreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = AdminUserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(email = %payload.email))]
pub async fn create_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<AdminCreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_staff()?;
    let extra = payload.validate()?;

    let account = AccountStore::new(&state.db)
        .create(&payload.email, &payload.password, extra)
        .await?;

    tracing::info!(
        created_by = auth_user.user_id,
        user_id = account.id,
        "Account created by staff"
    );
    Ok((StatusCode::CREATED, Json(AdminUserResponse::from(account))))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Admin",
    operation_id = "adminGetUser",
    summary = "Get an account by ID",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account details", body = AdminUserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<AdminUserResponse>, AppError> {
    auth_user.require_staff()?;

    let account = AccountStore::new(&state.db).find(id).await?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "Admin",
    operation_id = "adminUpdateUser",
    summary = "Update an account",
    description = "Changes name, active flag or staff flag. Deactivated accounts can no longer obtain or use tokens. Staff only.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = AdminUpdateUserRequest,
    responses(
        (status = 200, description = "Account updated", body = AdminUserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<AdminUpdateUserRequest>,
) -> Result<Json<AdminUserResponse>, AppError> {
    auth_user.require_staff()?;
    let update = payload.into_update()?;

    let account = AccountStore::new(&state.db)
        .update_profile(id, update)
        .await?;
    Ok(Json(account.into()))
}
