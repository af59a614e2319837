use image::ImageFormat;

use crate::error::AppError;
use crate::utils::filename::upload_extension;

/// A payload that decoded successfully as an image.
#[derive(Debug)]
pub struct CheckedImage {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

impl CheckedImage {
    /// Canonical file extension for the detected format.
    pub fn extension(&self) -> Option<&'static str> {
        self.format.extensions_str().first().copied()
    }

    /// Extension to store the upload under.
    ///
    /// A client file name without an extension gets the canonical one. An
    /// extension that does not belong to the decoded format is rejected, so
    /// the stored name can never imply a non-image content type.
    pub fn storage_extension(&self, file_name: Option<&str>) -> Result<Option<&'static str>, AppError> {
        let Some(requested) = file_name.and_then(upload_extension) else {
            return Ok(self.extension());
        };

        let allowed = self.format.extensions_str();
        allowed
            .iter()
            .find(|ext| ext.eq_ignore_ascii_case(requested.trim()))
            .map(|ext| Some(*ext))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "File extension \"{requested}\" is not allowed. Allowed extensions are: {}.",
                    allowed.join(", ")
                ))
            })
    }
}

/// Decode `data` fully to make sure it is a real image, not just something
/// with an image-like header.
pub fn check_image(data: &[u8]) -> Result<CheckedImage, AppError> {
    let invalid = || {
        AppError::Validation(
            "Upload a valid image. The file you uploaded was either not an image or a corrupted image."
                .into(),
        )
    };

    if data.is_empty() {
        return Err(AppError::Validation("The submitted file is empty.".into()));
    }

    let format = image::guess_format(data).map_err(|_| invalid())?;
    let decoded = image::load_from_memory_with_format(data, format).map_err(|_| invalid())?;

    Ok(CheckedImage {
        format,
        width: decoded.width(),
        height: decoded.height(),
    })
}
