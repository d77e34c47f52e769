//! Bounds validation utilities

use crate::error::{Error, Result};
use crate::limits::{MAX_TIMESTAMP, MIN_TIMESTAMP};

/// Check if timestamp is within acceptable bounds
pub(crate) fn validate_timestamp_bounds(value: i64) -> Result<()> {
    if !(MIN_TIMESTAMP..=MAX_TIMESTAMP).contains(&value) {
        return Err(Error::TimestampOutOfBounds {
            value,
            min: MIN_TIMESTAMP,
            max: MAX_TIMESTAMP,
        });
    }
    Ok(())
}

/// Apply leeway to a timestamp with overflow protection
pub(crate) fn apply_leeway(timestamp: i64, leeway_seconds: u64, add: bool) -> Result<i64> {
    let leeway = i64::try_from(leeway_seconds).map_err(|_| Error::TimestampOverflow)?;
    if add {
        timestamp.checked_add(leeway)
    } else {
        timestamp.checked_sub(leeway)
    }
    .ok_or(Error::TimestampOverflow)
}

/// Validate string field size
pub(crate) fn validate_field_size(field: &str, value: &str, max: usize) -> Result<()> {
    if value.len() > max {
        return Err(Error::FormatInvalidJson(format!(
            "field '{field}' too long: {} bytes (maximum: {max} bytes)",
            value.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_bounds() {
        assert!(validate_timestamp_bounds(0).is_ok());
        assert!(validate_timestamp_bounds(MAX_TIMESTAMP).is_ok());
        assert!(matches!(
            validate_timestamp_bounds(-1),
            Err(Error::TimestampOutOfBounds { .. })
        ));
        assert!(validate_timestamp_bounds(MAX_TIMESTAMP + 1).is_err());
    }

    #[test]
    fn test_apply_leeway_overflow() {
        assert_eq!(apply_leeway(100, 60, true).unwrap(), 160);
        assert_eq!(apply_leeway(100, 60, false).unwrap(), 40);
        assert!(matches!(
            apply_leeway(i64::MAX, 1, true),
            Err(Error::TimestampOverflow)
        ));
        assert!(matches!(
            apply_leeway(0, u64::MAX, true),
            Err(Error::TimestampOverflow)
        ));
    }

    #[test]
    fn test_validate_field_size() {
        assert!(validate_field_size("kid", "short", 16).is_ok());
        assert!(validate_field_size("kid", &"x".repeat(17), 16).is_err());
    }
}
