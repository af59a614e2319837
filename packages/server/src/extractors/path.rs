use axum::extract::{FromRequestParts, Path, rejection::PathRejection};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// A `Path<T>` wrapper whose rejections become `AppError::NotFound`.
///
/// An id segment that does not parse (`/recipes/abc`, or one outside the
/// `i32` range) cannot name an existing row, so it gets the same JSON 404 as
/// an unknown id.
pub struct AppPath<T>(pub T);

impl<S, T> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(AppPath(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "Rejected path parameters");
                Err(not_found(&rejection))
            }
        }
    }
}

fn not_found(rejection: &PathRejection) -> AppError {
    match rejection {
        PathRejection::FailedToDeserializePathParams(_) => AppError::NotFound("Not found".into()),
        _ => AppError::Internal(rejection.body_text()),
    }
}
