//! Field checks shared by request payloads.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use validator::ValidationError;

/// Largest value a `DECIMAL(10, 2)` price column holds.
pub const MAX_PRICE: Decimal = dec!(99999999.99);
/// Largest value a `DECIMAL(12, 2)` total column holds.
pub const MAX_TOTAL: Decimal = dec!(9999999999.99);

/// Philippine mobile numbers, local (`09XXXXXXXXX`) or international (`+63 9XX XXX XXXX`).
static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\+63 ?9\d{2} ?\d{3} ?\d{4}|09\d{9})$").expect("phone pattern compiles")
});

pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    if PHONE_PATTERN.is_match(value.trim()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("Enter a valid mobile number (09XXXXXXXXX or +63 9XX XXX XXXX).".into());
        Err(err)
    }
}

/// Rewrites a mobile number as `+63 XXX XXX XXXX`.
///
/// Anything that does not reduce to ten national digits is returned as given.
pub fn normalize_phone(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    let national = if let Some(rest) = digits.strip_prefix("63") {
        rest
    } else if let Some(rest) = digits.strip_prefix('0') {
        rest
    } else {
        digits.as_str()
    };

    if national.len() < 10 {
        return value.to_string();
    }
    let n = &national[..10];
    format!("+63 {} {} {}", &n[..3], &n[3..6], &n[6..])
}

fn too_large(limit: Decimal) -> ValidationError {
    let mut err = ValidationError::new("too_large");
    err.message = Some(format!("Must not exceed {}.", limit).into());
    err
}

/// Price between zero and [`MAX_PRICE`].
pub fn non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Must not be negative.".into());
        return Err(err);
    }
    if *value > MAX_PRICE {
        return Err(too_large(MAX_PRICE));
    }
    Ok(())
}

/// Amount above zero and at most [`MAX_TOTAL`].
pub fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut err = ValidationError::new("positive");
        err.message = Some("Must be greater than zero.".into());
        return Err(err);
    }
    if *value > MAX_TOTAL {
        return Err(too_large(MAX_TOTAL));
    }
    Ok(())
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("This field may not be blank.".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("09171234567", "+63 917 123 4567")]
    #[case("+63 917 123 4567", "+63 917 123 4567")]
    #[case("+639171234567", "+63 917 123 4567")]
    #[case("12345", "12345")]
    fn phone_numbers_normalize(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_phone(raw), expected);
    }

    #[rstest]
    #[case("09171234567", true)]
    #[case("+63 917 123 4567", true)]
    #[case("+639171234567", true)]
    #[case("08171234567", false)]
    #[case("0917123456", false)]
    #[case("not a phone", false)]
    fn phone_numbers_validate(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(validate_phone(raw).is_ok(), ok);
    }

    #[test]
    fn decimal_checks() {
        assert!(non_negative(&dec!(0)).is_ok());
        assert!(non_negative(&dec!(-0.01)).is_err());
        assert!(positive(&dec!(0.01)).is_ok());
        assert!(positive(&dec!(0)).is_err());
    }

    #[test]
    fn amounts_are_capped_at_column_size() {
        assert!(non_negative(&MAX_PRICE).is_ok());
        assert!(non_negative(&dec!(100000000.00)).is_err());
        assert!(non_negative(&dec!(50000000000000000000000000000)).is_err());
        assert!(positive(&MAX_TOTAL).is_ok());
        assert!(positive(&dec!(10000000000.00)).is_err());
    }
}
