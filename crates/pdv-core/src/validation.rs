//! # Validation Module
//!
//! Input validation helpers shared by the API boundary. All checks here
//! run before any side effect; a request that fails validation leaves
//! no trace in storage.

use uuid::Uuid;

use crate::error::ValidationError;
use crate::money::Money;
use crate::MAX_ITEM_QUANTITY;

/// Maximum length for free-text name fields.
pub const MAX_NAME_LENGTH: usize = 120;

/// Result type for validation functions.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validation
// =============================================================================

/// Validates that a string is a well-formed UUID and returns it normalized
/// (lowercase hyphenated).
pub fn validate_uuid(field: &str, value: &str) -> ValidationResult<String> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    let parsed = Uuid::parse_str(value.trim()).map_err(|e| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: e.to_string(),
    })?;
    Ok(parsed.to_string())
}

/// Validates an optional identifier, passing `None` through untouched.
pub fn validate_optional_uuid(field: &str, value: Option<&str>) -> ValidationResult<Option<String>> {
    match value {
        Some(v) => Ok(Some(validate_uuid(field, v)?)),
        None => Ok(None),
    }
}

// =============================================================================
// Amount Validation
// =============================================================================

/// Converts a decimal amount in reais (as received on the wire) to Money,
/// rejecting non-finite values and more than two fraction digits' worth of
/// precision drift.
pub fn validate_amount_reais(field: &str, value: f64) -> ValidationResult<Money> {
    if !value.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    // Round half away from zero to the nearest centavo
    let centavos = (value * 100.0).round() as i64;
    Ok(Money::from_centavos(centavos))
}

/// As [`validate_amount_reais`], but additionally requires a strictly
/// positive result.
pub fn validate_positive_amount_reais(field: &str, value: f64) -> ValidationResult<Money> {
    let money = validate_amount_reais(field, value)?;
    if !money.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(money)
}

// =============================================================================
// Quantity and Text Validation
// =============================================================================

/// Validates an item quantity: positive and within the per-line cap.
pub fn validate_quantity(field: &str, value: i64) -> ValidationResult<i64> {
    if value <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    if value > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(value)
}

/// Validates a required free-text field, trimming surrounding whitespace.
pub fn validate_name(field: &str, value: &str) -> ValidationResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(trimmed.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_uuid() {
        let id = validate_uuid("id_produto", "550E8400-E29B-41D4-A716-446655440000").unwrap();
        assert_eq!(id, "550e8400-e29b-41d4-a716-446655440000");

        assert!(validate_uuid("id_produto", "not-a-uuid").is_err());
        assert!(validate_uuid("id_produto", "").is_err());
        assert!(validate_uuid("id_produto", "   ").is_err());
    }

    #[test]
    fn test_validate_optional_uuid() {
        assert_eq!(validate_optional_uuid("id_cliente", None).unwrap(), None);
        assert!(validate_optional_uuid("id_cliente", Some("bad")).is_err());
    }

    #[test]
    fn test_validate_amount_reais() {
        assert_eq!(
            validate_amount_reais("valor", 10.99).unwrap().centavos(),
            1099
        );
        assert_eq!(validate_amount_reais("valor", 0.0).unwrap().centavos(), 0);
        // Float noise rounds to the nearest centavo
        assert_eq!(
            validate_amount_reais("valor", 0.1 + 0.2).unwrap().centavos(),
            30
        );
        assert!(validate_amount_reais("valor", f64::NAN).is_err());
        assert!(validate_amount_reais("valor", f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_positive_amount() {
        assert!(validate_positive_amount_reais("valor", 0.0).is_err());
        assert!(validate_positive_amount_reais("valor", -5.0).is_err());
        assert_eq!(
            validate_positive_amount_reais("valor", 5.0)
                .unwrap()
                .centavos(),
            500
        );
    }

    #[test]
    fn test_validate_quantity() {
        assert_eq!(validate_quantity("quantidade", 3).unwrap(), 3);
        assert!(validate_quantity("quantidade", 0).is_err());
        assert!(validate_quantity("quantidade", -1).is_err());
        assert!(validate_quantity("quantidade", MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("nome", "  Arroz 5kg  ").unwrap(), "Arroz 5kg");
        assert!(validate_name("nome", "   ").is_err());
        assert!(validate_name("nome", &"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }
}
