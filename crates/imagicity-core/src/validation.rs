//! # Validation Module
//!
//! Form-level input validation for Imagicity.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Browser form                                                 │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Line item rules (qty > 0, discount 0-100%)                        │
//! │  └── Identifier formats (GSTIN, state code, UUID)                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: GST engine                                                   │
//! │  └── Rejects negative amounts/rates (CoreError::InvalidArgument)       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  ├── UNIQUE invoice numbers                                            │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The computation engine does NOT call these validators; it only rejects
//! what it cannot compute. Callers validate before handing lines over.
//!
//! ## Usage
//! ```rust
//! use imagicity_core::validation::{validate_gstin, validate_quantity};
//! use rust_decimal::Decimal;
//!
//! validate_gstin("29ABCDE1234F1Z5").unwrap();
//! validate_quantity(Decimal::new(15, 1)).unwrap(); // 1.5 hours
//! ```

use rust_decimal::Decimal;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{DiscountType, LineItem, NumberingConfig, TaxRate};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted line description.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Longest accepted numbering prefix.
pub const MAX_PREFIX_LEN: usize = 12;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a line description.
///
/// ## Rules
/// - Must not be empty
/// - At most 500 characters
pub fn validate_description(description: &str) -> ValidationResult<()> {
    let description = description.trim();

    if description.is_empty() {
        return Err(ValidationError::Required {
            field: "description".to_string(),
        });
    }

    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok(())
}

/// Validates an invoice number prefix.
///
/// ## Rules
/// - Must not be empty
/// - At most 12 characters
/// - Letters, digits, hyphens and slashes only (the characters GST allows
///   in a document serial number)
///
/// ## Example
/// ```rust
/// use imagicity_core::validation::validate_prefix;
///
/// assert!(validate_prefix("IMAGI").is_ok());
/// assert!(validate_prefix("INV/").is_ok());
/// assert!(validate_prefix("").is_err());
/// assert!(validate_prefix("HAS SPACE").is_err());
/// ```
pub fn validate_prefix(prefix: &str) -> ValidationResult<()> {
    if prefix.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "prefix".to_string(),
        });
    }

    if prefix.chars().count() > MAX_PREFIX_LEN {
        return Err(ValidationError::TooLong {
            field: "prefix".to_string(),
            max: MAX_PREFIX_LEN,
        });
    }

    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '/')
    {
        return Err(ValidationError::InvalidFormat {
            field: "prefix".to_string(),
            reason: "must contain only letters, numbers, hyphens, and slashes".to_string(),
        });
    }

    Ok(())
}

/// Validates a two-digit GST state code ("01" through "99", not "00").
pub fn validate_state_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "state_code".to_string(),
        });
    }

    if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_digit()) || code == "00" {
        return Err(ValidationError::InvalidFormat {
            field: "state_code".to_string(),
            reason: "must be a two-digit GST state code".to_string(),
        });
    }

    Ok(())
}

/// Validates a GSTIN (GST identification number).
///
/// ## Layout
/// ```text
/// 29 ABCDE1234F 1 Z 5
/// │  │          │ │ └── check character
/// │  │          │ └──── always 'Z'
/// │  │          └────── entity number (1-9, A-Z)
/// │  └───────────────── PAN of the holder
/// └──────────────────── state code
/// ```
///
/// The check character is not verified.
///
/// ## Example
/// ```rust
/// use imagicity_core::validation::validate_gstin;
///
/// assert!(validate_gstin("29ABCDE1234F1Z5").is_ok());
/// assert!(validate_gstin("29ABCDE1234F1X5").is_err());
/// ```
pub fn validate_gstin(gstin: &str) -> ValidationResult<()> {
    let gstin = gstin.trim();

    if gstin.is_empty() {
        return Err(ValidationError::Required {
            field: "gstin".to_string(),
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: "gstin".to_string(),
        reason: reason.to_string(),
    };

    let bytes = gstin.as_bytes();
    if bytes.len() != 15 {
        return Err(invalid("must be 15 characters"));
    }

    validate_state_code(&gstin[..2]).map_err(|_| invalid("must start with a state code"))?;

    let pan_ok = bytes[2..7].iter().all(u8::is_ascii_uppercase)
        && bytes[7..11].iter().all(u8::is_ascii_digit)
        && bytes[11].is_ascii_uppercase();
    if !pan_ok {
        return Err(invalid("characters 3-12 must be a PAN"));
    }

    let entity = bytes[12];
    if !(entity.is_ascii_uppercase() || (b'1'..=b'9').contains(&entity)) {
        return Err(invalid("entity number must be 1-9 or A-Z"));
    }

    if bytes[13] != b'Z' {
        return Err(invalid("14th character must be Z"));
    }

    if !(bytes[14].is_ascii_uppercase() || bytes[14].is_ascii_digit()) {
        return Err(invalid("check character must be alphanumeric"));
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0); fractions are fine
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Invoice form: edit qty                                                 │
/// │                                                                         │
/// │  User enters quantity: 0                                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(0) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       │                                                                 │
/// │       └── OK → InvoiceDraft::update_line                               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: Decimal) -> ValidationResult<()> {
    if qty <= Decimal::ZERO {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (complimentary lines).
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit_price".to_string(),
        });
    }

    Ok(())
}

/// Validates a discount against its type.
///
/// ## Rules
/// - Never negative
/// - Percent discounts are at most 100
/// - A fixed per-unit discount may not exceed the unit price, otherwise the
///   taxable base goes negative
pub fn validate_discount(
    discount_type: Option<DiscountType>,
    value: Decimal,
    unit_price: Money,
) -> ValidationResult<()> {
    if value < Decimal::ZERO {
        return Err(ValidationError::MustNotBeNegative {
            field: "discount".to_string(),
        });
    }

    match discount_type {
        Some(DiscountType::PercentOfLine) if value > Decimal::ONE_HUNDRED => {
            Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: Decimal::ZERO,
                max: Decimal::ONE_HUNDRED,
            })
        }
        Some(DiscountType::FixedAmountPerUnit) if value > unit_price.amount() => {
            Err(ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: Decimal::ZERO,
                max: unit_price.amount(),
            })
        }
        _ => Ok(()),
    }
}

/// Validates a GST rate.
///
/// ## Rules
/// - Between 0 and 100 percent; the usual slabs are 0/5/12/18/28 but other
///   rates (cess-inclusive, 3% on gold) are accepted
pub fn validate_tax_rate(rate: TaxRate) -> ValidationResult<()> {
    let percent = rate.percent();
    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: Decimal::ZERO,
            max: Decimal::ONE_HUNDRED,
        });
    }

    Ok(())
}

/// Validates a payment amount.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Cannot pay zero or negative amounts
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if amount.is_zero() || amount.is_negative() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a counter value (must be ≥ 1).
pub fn validate_next_number(next_number: u32) -> ValidationResult<()> {
    if next_number == 0 {
        return Err(ValidationError::MustBePositive {
            field: "next_number".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates every user-entered field of a line.
///
/// Derived tax fields are ignored; they are overwritten on recalculation.
pub fn validate_line_item(line: &LineItem) -> ValidationResult<()> {
    validate_description(&line.description)?;
    validate_quantity(line.quantity)?;
    validate_unit_price(line.unit_price)?;
    validate_discount(line.discount_type, line.discount_value, line.unit_price)?;
    validate_tax_rate(line.tax_rate)?;
    Ok(())
}

/// Validates a numbering settings update.
pub fn validate_numbering(config: &NumberingConfig) -> ValidationResult<()> {
    validate_prefix(&config.prefix)?;
    validate_next_number(config.next_number)
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use imagicity_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResetPolicy;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_description() {
        assert!(validate_description("Brand identity retainer").is_ok());
        assert!(validate_description("").is_err());
        assert!(validate_description("   ").is_err());
        assert!(validate_description(&"A".repeat(501)).is_err());
    }

    #[test]
    fn test_validate_prefix() {
        assert!(validate_prefix("IMAGI").is_ok());
        assert!(validate_prefix("INV-").is_ok());
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("WAY-TOO-LONG-PREFIX").is_err());
        assert!(validate_prefix("IN V").is_err());
    }

    #[test]
    fn test_validate_state_code() {
        assert!(validate_state_code("29").is_ok());
        assert!(validate_state_code("07").is_ok());
        assert!(validate_state_code("00").is_err());
        assert!(validate_state_code("2").is_err());
        assert!(validate_state_code("KA").is_err());
        assert!(validate_state_code("").is_err());
    }

    #[test]
    fn test_validate_gstin() {
        assert!(validate_gstin("29ABCDE1234F1Z5").is_ok());
        assert!(validate_gstin("27AAPFU0939F1ZV").is_ok());

        assert!(validate_gstin("").is_err());
        assert!(validate_gstin("29ABCDE1234F1Z").is_err());
        assert!(validate_gstin("00ABCDE1234F1Z5").is_err());
        assert!(validate_gstin("29abcde1234f1z5").is_err());
        assert!(validate_gstin("29ABCDE1234F0Z5").is_err());
        assert!(validate_gstin("29ABCDE1234F1Y5").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(dec!(1)).is_ok());
        assert!(validate_quantity(dec!(0.25)).is_ok());

        assert!(validate_quantity(dec!(0)).is_err());
        assert!(validate_quantity(dec!(-1)).is_err());
    }

    #[test]
    fn test_validate_discount() {
        let price = Money::from_rupees(400);

        assert!(validate_discount(None, dec!(0), price).is_ok());
        assert!(validate_discount(Some(DiscountType::PercentOfLine), dec!(100), price).is_ok());
        assert!(validate_discount(Some(DiscountType::PercentOfLine), dec!(101), price).is_err());
        assert!(validate_discount(Some(DiscountType::FixedAmountPerUnit), dec!(400), price).is_ok());
        assert!(validate_discount(Some(DiscountType::FixedAmountPerUnit), dec!(500), price).is_err());
        assert!(validate_discount(Some(DiscountType::PercentOfLine), dec!(-1), price).is_err());
    }

    #[test]
    fn test_validate_tax_rate() {
        assert!(validate_tax_rate(TaxRate::zero()).is_ok());
        assert!(validate_tax_rate(TaxRate::from_percent(28)).is_ok());
        assert!(validate_tax_rate(TaxRate::new(dec!(3))).is_ok());
        assert!(validate_tax_rate(TaxRate::new(dec!(-1))).is_err());
        assert!(validate_tax_rate(TaxRate::from_percent(101)).is_err());
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount(Money::from_rupees(1)).is_ok());
        assert!(validate_payment_amount(Money::zero()).is_err());
        assert!(validate_payment_amount(Money::from_rupees(-5)).is_err());
    }

    #[test]
    fn test_validate_line_item() {
        let line = LineItem::new("Logo design", dec!(1), Money::from_rupees(12000));
        assert!(validate_line_item(&line).is_ok());

        let bad = LineItem::new("", dec!(1), Money::from_rupees(12000));
        assert!(matches!(
            validate_line_item(&bad),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_numbering() {
        let mut config = NumberingConfig {
            prefix: "IMAGI".to_string(),
            next_number: 1,
            reset_policy: ResetPolicy::Never,
        };
        assert!(validate_numbering(&config).is_ok());

        config.next_number = 0;
        assert!(validate_numbering(&config).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
