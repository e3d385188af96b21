//! # Validation Module
//!
//! Field validators shared by the ledgers.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Flow                                    │
//! │                                                                         │
//! │  Form input (PurchaseInput, OrderInput, ...)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  let mut errors = ValidationErrors::new();                             │
//! │  errors.check(validate_alphanumeric_id("Purchase ID", &id));           │
//! │  errors.check(validate_positive_number("Quantity", qty));              │
//! │  errors.check(validate_not_future("Date", date, today));               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  errors.into_result()?  ◄── every failing field reported at once      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  key checks ──► stock checks ──► mutation                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each validator checks ONE field and returns the error for that field.
//! Patterns are matched by hand over ASCII classes; see each function for the
//! exact rule.

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Non-empty after trimming.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Record identifiers: `^[a-zA-Z0-9]+$`.
///
/// ```rust
/// use harvest_core::validation::validate_alphanumeric_id;
///
/// assert!(validate_alphanumeric_id("Purchase ID", "P001").is_ok());
/// assert!(validate_alphanumeric_id("Purchase ID", "P-001").is_err());
/// assert!(validate_alphanumeric_id("Purchase ID", "").is_err());
/// ```
pub fn validate_alphanumeric_id(field: &str, value: &str) -> ValidationResult<()> {
    validate_required(field, value)?;

    if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters and numbers".to_string(),
        });
    }
    Ok(())
}

/// Names and raw categories: `^[a-zA-Z\s]+$`.
pub fn validate_letters_and_spaces(field: &str, value: &str) -> ValidationResult<()> {
    validate_required(field, value)?;

    if !value
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c.is_whitespace())
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters and spaces".to_string(),
        });
    }
    Ok(())
}

/// Phone numbers: `^[0-9+\-]{7,15}$`.
///
/// ## User Workflow
/// ```text
/// Farmer form / order form
///      │
///      ▼
/// "+254-700-123456" ──► 7..=15 chars of digits, '+', '-' ──► OK
/// "0700 123 456"    ──► contains spaces                    ──► InvalidFormat
/// "12345"           ──► too short                          ──► InvalidFormat
/// ```
pub fn validate_phone(field: &str, value: &str) -> ValidationResult<()> {
    validate_required(field, value)?;

    let len = value.chars().count();
    let charset_ok = value
        .chars()
        .all(|c| c.is_ascii_digit() || c == '+' || c == '-');

    if !charset_ok || !(7..=15).contains(&len) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be 7-15 digits, '+' or '-'".to_string(),
        });
    }
    Ok(())
}

/// Email: `^[^@\s]+@[^@\s]+\.[^@\s]+$`.
///
/// Exactly one `@`, no whitespace, and a domain with a dot that has text on
/// both sides.
pub fn validate_email(field: &str, value: &str) -> ValidationResult<()> {
    validate_required(field, value)?;

    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid email address".to_string(),
    };

    if value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let has_inner_dot = domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len());
    if !has_inner_dot {
        return Err(invalid());
    }
    Ok(())
}

/// Minimum length after trimming.
pub fn validate_min_length(field: &str, value: &str, min: usize) -> ValidationResult<()> {
    validate_required(field, value)?;

    if value.trim().chars().count() < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Present, finite and strictly positive.
///
/// `None` stands for a form field that did not parse as a number.
pub fn validate_positive_number(field: &str, value: Option<f64>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::NotANumber {
            field: field.to_string(),
        }),
        Some(v) if v <= 0.0 => Err(ValidationError::MustBePositive {
            field: field.to_string(),
        }),
        Some(_) => Ok(()),
        None => Err(ValidationError::NotANumber {
            field: field.to_string(),
        }),
    }
}

/// Present, finite and zero or greater.
pub fn validate_non_negative_number(field: &str, value: Option<f64>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::NotANumber {
            field: field.to_string(),
        }),
        Some(v) if v < 0.0 => Err(ValidationError::Negative {
            field: field.to_string(),
        }),
        Some(_) => Ok(()),
        None => Err(ValidationError::NotANumber {
            field: field.to_string(),
        }),
    }
}

/// Whole-unit quantities (packaged units, order quantities).
pub fn validate_positive_units(field: &str, value: Option<i64>) -> ValidationResult<()> {
    match value {
        Some(v) if v > 0 => Ok(()),
        Some(_) => Err(ValidationError::MustBePositive {
            field: field.to_string(),
        }),
        None => Err(ValidationError::NotANumber {
            field: field.to_string(),
        }),
    }
}

/// Prices must be strictly positive.
pub fn validate_price(field: &str, value: Option<Money>) -> ValidationResult<()> {
    match value {
        Some(price) if price.is_positive() => Ok(()),
        Some(_) => Err(ValidationError::MustBePositive {
            field: field.to_string(),
        }),
        None => Err(ValidationError::NotANumber {
            field: field.to_string(),
        }),
    }
}

/// Tax rate percent in `0..=100`.
pub fn validate_tax_rate_percent(value: f64) -> ValidationResult<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: "Tax rate".to_string(),
            min: 0.0,
            max: 100.0,
        });
    }
    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Required date that is today or earlier.
pub fn validate_not_future(
    field: &str,
    value: Option<NaiveDate>,
    today: NaiveDate,
) -> ValidationResult<()> {
    match value {
        None => Err(ValidationError::Required {
            field: field.to_string(),
        }),
        Some(date) if date > today => Err(ValidationError::InFuture {
            field: field.to_string(),
        }),
        Some(_) => Ok(()),
    }
}

/// Optional date that, when present, is today or later.
pub fn validate_not_past(
    field: &str,
    value: Option<NaiveDate>,
    today: NaiveDate,
) -> ValidationResult<()> {
    match value {
        Some(date) if date < today => Err(ValidationError::InPast {
            field: field.to_string(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_validate_alphanumeric_id() {
        assert!(validate_alphanumeric_id("ID", "F001").is_ok());
        assert!(validate_alphanumeric_id("ID", "abc123XYZ").is_ok());

        assert!(validate_alphanumeric_id("ID", "").is_err());
        assert!(validate_alphanumeric_id("ID", "   ").is_err());
        assert!(validate_alphanumeric_id("ID", "F 001").is_err());
        assert!(validate_alphanumeric_id("ID", "F_001").is_err());
    }

    #[test]
    fn test_validate_letters_and_spaces() {
        assert!(validate_letters_and_spaces("Customer name", "Jane Wanjiku").is_ok());
        assert!(validate_letters_and_spaces("Customer name", "Jane2").is_err());
        assert!(validate_letters_and_spaces("Customer name", "").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("Phone", "0712345678").is_ok());
        assert!(validate_phone("Phone", "+254-712-345").is_ok());
        assert!(validate_phone("Phone", "1234567").is_ok());

        assert!(validate_phone("Phone", "123456").is_err());
        assert!(validate_phone("Phone", "1234567890123456").is_err());
        assert!(validate_phone("Phone", "0712 345 678").is_err());
        assert!(validate_phone("Phone", "07123abc").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("Email", "grower@farm.co").is_ok());
        assert!(validate_email("Email", "a@b.c").is_ok());

        assert!(validate_email("Email", "grower.farm.co").is_err());
        assert!(validate_email("Email", "a@b@c.d").is_err());
        assert!(validate_email("Email", "@farm.co").is_err());
        assert!(validate_email("Email", "grower@farm").is_err());
        assert!(validate_email("Email", "grower@.co").is_err());
        assert!(validate_email("Email", "grower@farm.").is_err());
        assert!(validate_email("Email", "grow er@farm.co").is_err());
    }

    #[test]
    fn test_validate_numbers() {
        assert!(validate_positive_number("Quantity", Some(0.5)).is_ok());
        assert_eq!(
            validate_positive_number("Quantity", Some(0.0)),
            Err(ValidationError::MustBePositive {
                field: "Quantity".to_string()
            })
        );
        assert_eq!(
            validate_positive_number("Quantity", None),
            Err(ValidationError::NotANumber {
                field: "Quantity".to_string()
            })
        );
        assert!(validate_positive_number("Quantity", Some(f64::NAN)).is_err());

        assert!(validate_non_negative_number("Reorder level", Some(0.0)).is_ok());
        assert!(validate_non_negative_number("Reorder level", Some(-1.0)).is_err());

        assert!(validate_positive_units("Quantity", Some(1)).is_ok());
        assert!(validate_positive_units("Quantity", Some(0)).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price("Price", Some(Money::from_cents(1))).is_ok());
        assert!(validate_price("Price", Some(Money::zero())).is_err());
        assert!(validate_price("Price", None).is_err());
    }

    #[test]
    fn test_validate_tax_rate_percent() {
        assert!(validate_tax_rate_percent(0.0).is_ok());
        assert!(validate_tax_rate_percent(100.0).is_ok());
        assert!(validate_tax_rate_percent(100.5).is_err());
        assert!(validate_tax_rate_percent(-1.0).is_err());
    }

    #[test]
    fn test_date_validators() {
        let today = day(2024, 6, 15);

        assert!(validate_not_future("Date", Some(today), today).is_ok());
        assert!(validate_not_future("Date", Some(day(2024, 6, 16)), today).is_err());
        assert!(validate_not_future("Date", None, today).is_err());

        assert!(validate_not_past("Restock date", None, today).is_ok());
        assert!(validate_not_past("Restock date", Some(today), today).is_ok());
        assert!(validate_not_past("Restock date", Some(day(2024, 6, 14)), today).is_err());
    }
}
