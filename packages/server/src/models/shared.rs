use crate::error::AppError;

/// Longest accepted name, title or email, in characters.
pub const MAX_TEXT_LEN: usize = 255;

/// Validate a trimmed, non-empty text field (1-255 Unicode characters) and
/// return it trimmed.
pub fn validate_text(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "{field} must be 1-{MAX_TEXT_LEN} characters"
        )));
    }
    Ok(value.to_string())
}

/// Parse a comma-separated list of integer ids (`"1,2,3"`).
///
/// Blank items are skipped so `""` and `"1,"` are accepted; anything else
/// that is not an integer is a validation error.
pub fn parse_id_list(param: &str, raw: &str) -> Result<Vec<i32>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i32>().map_err(|_| {
                AppError::Validation(format!("{param}: '{s}' is not a valid id"))
            })
        })
        .collect()
}

/// Parse a boolean query flag. Accepts `1`/`0` and `true`/`false`.
pub fn parse_flag(param: &str, raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" | "" => Ok(false),
        _ => Err(AppError::Validation(format!(
            "{param} must be one of: 0, 1, true, false"
        ))),
    }
}
