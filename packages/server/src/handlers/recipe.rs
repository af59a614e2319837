use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::instrument;

use crate::config::MediaConfig;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::multipart::AppMultipart;
use crate::extractors::path::AppPath;
use crate::models::recipe::*;
use crate::repository::recipe::RecipeRepo;
use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Body limit for the image upload route.
pub fn upload_body_limit(config: &MediaConfig) -> DefaultBodyLimit {
    let limit = usize::try_from(config.max_image_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);
    DefaultBodyLimit::max(limit)
}

#[utoipa::path(
    get,
    path = "/recipes",
    tag = "Recipes",
    operation_id = "listRecipes",
    summary = "List own recipes",
    description = "Returns the caller's recipes, newest first, with tags and ingredients as id lists. `tags` and `ingredients` take comma-separated ids; a recipe matches a list if it has any of the ids, and both lists must match when given.",
    params(RecipeListQuery),
    responses(
        (status = 200, description = "List of recipes", body = Vec<RecipeResponse>),
        (status = 400, description = "Invalid filter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_recipes(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let filter = query.to_filter()?;
    let records = RecipeRepo::new(&state.db)
        .list(auth_user.user_id, &filter)
        .await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/recipes",
    tag = "Recipes",
    operation_id = "createRecipe",
    summary = "Create a recipe",
    description = "Creates a recipe owned by the caller. `tags` and `ingredients` are ids of existing rows; duplicates collapse.",
    request_body = RecipeRequest,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, title = %payload.title))]
pub async fn create_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RecipeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new = payload.into_new()?;
    let record = RecipeRepo::new(&state.db)
        .create(auth_user.user_id, new)
        .await?;
    Ok((StatusCode::CREATED, Json(RecipeResponse::from(record))))
}

#[utoipa::path(
    get,
    path = "/recipes/{id}",
    tag = "Recipes",
    operation_id = "getRecipe",
    summary = "Get a recipe by ID",
    description = "Returns the detail form, with tags and ingredients as `{id, name}` objects.",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe details", body = RecipeDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn get_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<RecipeDetailResponse>, AppError> {
    let detail = RecipeRepo::new(&state.db)
        .detail(auth_user.user_id, id)
        .await?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    put,
    path = "/recipes/{id}",
    tag = "Recipes",
    operation_id = "replaceRecipe",
    summary = "Replace a recipe",
    description = "Replaces every field. `title`, `time_minutes` and `price` are required; omitted `tags` or `ingredients` clear the links and an omitted `link` becomes empty.",
    params(("id" = i32, Path, description = "Recipe ID")),
    request_body = RecipeRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn replace_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<RecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    let changes = payload.into_changes()?;
    let record = RecipeRepo::new(&state.db)
        .update(auth_user.user_id, id, changes)
        .await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    patch,
    path = "/recipes/{id}",
    tag = "Recipes",
    operation_id = "updateRecipe",
    summary = "Update a recipe",
    description = "Only provided fields are modified. A provided `tags` or `ingredients` list replaces the current links; omitted lists keep them.",
    params(("id" = i32, Path, description = "Recipe ID")),
    request_body = RecipePatchRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, id))]
pub async fn update_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<RecipePatchRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    let changes = payload.into_changes()?;
    let record = RecipeRepo::new(&state.db)
        .update(auth_user.user_id, id, changes)
        .await?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    delete,
    path = "/recipes/{id}",
    tag = "Recipes",
    operation_id = "deleteRecipe",
    summary = "Delete a recipe",
    description = "Deletes the recipe, its tag and ingredient links and its image file.",
    params(("id" = i32, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, id))]
pub async fn delete_recipe(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<StatusCode, AppError> {
    RecipeRepo::new(&state.db)
        .delete(&*state.media, auth_user.user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/recipes/{id}/upload-image",
    tag = "Recipes",
    operation_id = "uploadRecipeImage",
    summary = "Upload a recipe image",
    description = "Stores the `image` multipart field as the recipe's image, replacing any previous one. The payload must decode as an image and a file name extension, if present, must belong to the decoded format; on failure the current image is kept.",
    params(("id" = i32, Path, description = "Recipe ID")),
    request_body(content_type = "multipart/form-data", description = "Multipart form with an `image` file field"),
    responses(
        (status = 200, description = "Image stored", body = RecipeImageResponse),
        (status = 400, description = "Missing or invalid image (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Recipe not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Image changed by a concurrent upload (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id, id))]
pub async fn upload_recipe_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppMultipart(mut multipart): AppMultipart,
) -> Result<Json<RecipeImageResponse>, AppError> {
    let mut upload: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() == Some("image") {
            let file_name = field.file_name().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read image: {e}")))?;
            upload = Some((file_name, data.to_vec()));
        }
    }

    let (file_name, data) =
        upload.ok_or_else(|| AppError::Validation("Missing 'image' field".into()))?;

    let recipe = RecipeRepo::new(&state.db)
        .attach_image(
            &*state.media,
            auth_user.user_id,
            id,
            data,
            file_name.as_deref(),
        )
        .await?;

    Ok(Json(recipe.into()))
}
