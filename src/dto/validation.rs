//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::clock::parse_hhmm;

/// Validates that a duration string is well-formed `HH:MM` with minutes below 60.
///
/// Hours may exceed 24 so long rentals stay expressible.
pub fn validate_duration(value: &str) -> Result<(), ValidationError> {
    if parse_hhmm(value).is_none() {
        let mut err = ValidationError::new("duration_format");
        err.message = Some(format!("Duration must be `HH:MM` with minutes below 60 (got `{value}`)").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_duration_valid() {
        assert!(validate_duration("00:00").is_ok());
        assert!(validate_duration("01:30").is_ok());
        assert!(validate_duration("36:30").is_ok());
    }

    #[test]
    fn test_validate_duration_invalid() {
        assert!(validate_duration("").is_err());
        assert!(validate_duration("90").is_err()); // no separator
        assert!(validate_duration("01:75").is_err()); // minutes overflow
        assert!(validate_duration("1:5").is_err()); // minutes not two digits
        assert!(validate_duration("aa:bb").is_err());
    }
}
