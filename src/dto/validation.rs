//! Validation helpers for DTOs.

use validator::ValidationError;

/// Prefix every accepted winner photo must start with.
pub const IMAGE_DATA_URL_PREFIX: &str = "data:image/";

/// Validates that a winner photo is an inline image data URL.
///
/// ```ignore
/// validate_image_data_url("data:image/png;base64,iVBO") // Ok
/// validate_image_data_url("https://cdn.test/p.png")    // Err - not a data URL
/// validate_image_data_url("data:image/png")            // Err - no payload
/// ```
pub fn validate_image_data_url(value: &str) -> Result<(), ValidationError> {
    if !value.starts_with(IMAGE_DATA_URL_PREFIX) {
        let mut err = ValidationError::new("image_data_url_prefix");
        err.message = Some("Must be an image data URL".into());
        return Err(err);
    }

    if !value.contains(',') {
        let mut err = ValidationError::new("image_data_url_payload");
        err.message = Some("Must be an image data URL".into());
        return Err(err);
    }

    Ok(())
}

/// Normalise a letter payload to a single uppercase A-Z character.
///
/// Returns `None` for anything else: empty strings, digits, punctuation, several characters.
pub fn normalize_letter(raw: &str) -> Option<char> {
    let mut chars = raw.trim().chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() || !letter.is_ascii_uppercase() {
        return None;
    }
    Some(letter)
}
