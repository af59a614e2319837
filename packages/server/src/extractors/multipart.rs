use axum::extract::{FromRequest, Multipart, Request};

use crate::error::AppError;

/// A `Multipart` wrapper that reports a missing or malformed multipart
/// `Content-Type` as `AppError::Validation`.
pub struct AppMultipart(pub Multipart);

impl<S> FromRequest<S> for AppMultipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Multipart::from_request(req, state).await {
            Ok(multipart) => Ok(AppMultipart(multipart)),
            Err(rejection) => {
                tracing::debug!(status = %rejection.status(), "Rejected multipart body");
                Err(AppError::Validation(format!(
                    "Expected a multipart/form-data body: {}",
                    rejection.body_text()
                )))
            }
        }
    }
}
