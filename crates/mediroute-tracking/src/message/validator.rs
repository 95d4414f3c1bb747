//! Inbound payload validation rules.

use mediroute_core::error::AppError;

/// Maximum allowed raw frame size in bytes.
const MAX_MESSAGE_SIZE: usize = 65_536;

/// Maximum allowed identifier length.
const MAX_ID_LENGTH: usize = 128;

/// Validates a raw inbound frame before parsing.
pub fn validate_raw(raw: &str) -> Result<(), AppError> {
    if raw.len() > MAX_MESSAGE_SIZE {
        return Err(AppError::validation(format!(
            "Message exceeds maximum size of {MAX_MESSAGE_SIZE} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::validation("Empty message"));
    }

    Ok(())
}

/// Validates an opaque unit/facility/transport identifier.
pub fn validate_id(id: &str) -> Result<(), AppError> {
    if id.is_empty() || id.len() > MAX_ID_LENGTH {
        return Err(AppError::validation("Invalid identifier length"));
    }

    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(AppError::validation(
            "Identifier contains invalid characters",
        ));
    }

    Ok(())
}

/// Validates a coordinate pair.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), AppError> {
    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(AppError::validation("Coordinates must be finite numbers"));
    }

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::validation(format!(
            "Latitude {latitude} out of range [-90, 90]"
        )));
    }

    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::validation(format!(
            "Longitude {longitude} out of range [-180, 180]"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_frame_limits() {
        assert!(validate_raw("{}").is_ok());
        assert!(validate_raw("   ").is_err());
        assert!(validate_raw(&"x".repeat(MAX_MESSAGE_SIZE + 1)).is_err());
    }

    #[test]
    fn test_id_charset() {
        assert!(validate_id("AMB-042").is_ok());
        assert!(validate_id("unit_7.b").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("drop table;").is_err());
    }

    #[test]
    fn test_coordinate_ranges() {
        assert!(validate_coordinates(48.2, 16.37).is_ok());
        assert!(validate_coordinates(90.0, 180.0).is_ok());
        assert!(validate_coordinates(90.1, 0.0).is_err());
        assert!(validate_coordinates(0.0, -180.5).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }
}
