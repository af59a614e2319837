use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::Response;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::path::AppPath;
use crate::repository::recipe::RECIPE_IMAGE_DIR;
use crate::state::AppState;
use crate::utils::filename::validate_flat_filename;

#[utoipa::path(
    get,
    path = "/uploads/recipe/{file}",
    tag = "Media",
    operation_id = "getRecipeImage",
    summary = "Download a recipe image",
    description = "Serves an uploaded recipe image. Public, like a static media mount; file names are random.",
    params(("file" = String, Path, description = "Stored file name")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_recipe_image(
    State(state): State<AppState>,
    AppPath(file): AppPath<String>,
) -> Result<Response, AppError> {
    let file = validate_flat_filename(&file).map_err(|e| {
        tracing::debug!(error = %e, "Rejected media file name");
        AppError::NotFound(format!("File '{file}' not found"))
    })?;

    let path = format!("{RECIPE_IMAGE_DIR}/{file}");
    let reader = state.media.get_stream(&path).await?;
    let mime = mime_guess::from_path(file).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
