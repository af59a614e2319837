use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::user::{
    CreateUserRequest, ReplaceMeRequest, TokenRequest, TokenResponse, UpdateMeRequest,
    UserResponse,
};
use crate::repository::account::AccountStore;
use crate::state::AppState;
use crate::utils::jwt;

#[utoipa::path(
    post,
    path = "/create",
    tag = "User",
    operation_id = "createUser",
    summary = "Register a new account",
    description = "Creates an account. The email is stored lower-cased and must not be taken; the password must be at least 5 characters and is never returned.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let extra = payload.validate()?;

    let account = AccountStore::new(&state.db)
        .create(&payload.email, &payload.password, extra)
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(account))))
}

#[utoipa::path(
    post,
    path = "/token",
    tag = "User",
    operation_id = "createToken",
    summary = "Issue an auth token",
    description = "Exchanges email and password for a bearer token. Unknown email, wrong password and inactive accounts all produce the same error.",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Bad credentials (INVALID_CREDENTIALS) or malformed body (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn create_token(
    State(state): State<AppState>,
    AppJson(payload): AppJson<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required.".into(),
        ));
    }

    let account = AccountStore::new(&state.db)
        .authenticate(&payload.email, &payload.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let token = jwt::sign(
        account.id,
        &account.email,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_days,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(TokenResponse { token }))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "User",
    operation_id = "getMe",
    summary = "Get the authenticated account",
    responses(
        (status = 200, description = "Own profile", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let account = AccountStore::new(&state.db).find(auth_user.user_id).await?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    put,
    path = "/me",
    tag = "User",
    operation_id = "replaceMe",
    summary = "Replace the authenticated account's profile",
    description = "Sets email, password and name. Email and password are required; an omitted name becomes empty.",
    request_body = ReplaceMeRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn replace_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ReplaceMeRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let update = payload.into_update()?;
    let account = AccountStore::new(&state.db)
        .update_profile(auth_user.user_id, update)
        .await?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "User",
    operation_id = "updateMe",
    summary = "Update the authenticated account's profile",
    description = "Partially updates email, password or name. A new password is re-hashed.",
    request_body = UpdateMeRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateMeRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let update = payload.into_update()?;
    let account = AccountStore::new(&state.db)
        .update_profile(auth_user.user_id, update)
        .await?;
    Ok(Json(account.into()))
}
