//! # Barcodes
//!
//! EAN-13 check digits and in-store codes.
//!
//! In-store products get a code in the `200` prefix range, which GS1
//! reserves for internal use:
//!
//! ```text
//!   2 0 0 │ 0 0 0 0 0 0 0 4 2 │ 8
//!   ──┬── │ ────────┬──────── │ ┬
//!  prefix │   9-digit sequence │ check digit
//! ```

use crate::error::ValidationError;

/// GS1 prefix for in-store numbering.
pub const IN_STORE_PREFIX: &str = "200";

/// Largest sequence that fits in the 9 digits after the prefix.
pub const MAX_IN_STORE_SEQUENCE: u64 = 999_999_999;

/// Computes the EAN-13 check digit for the first 12 digits.
///
/// Digits at even positions weigh 1, odd positions weigh 3.
///
/// ```rust
/// use freedom_core::barcode::ean13_check_digit;
///
/// assert_eq!(ean13_check_digit("400638133393").unwrap(), 1);
/// ```
pub fn ean13_check_digit(first_twelve: &str) -> Result<u8, ValidationError> {
    let digits = digits_of(first_twelve)?;
    if digits.len() != 12 {
        return Err(invalid("expected 12 digits before the check digit"));
    }

    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| u32::from(*d) * if i % 2 == 0 { 1 } else { 3 })
        .sum();

    Ok(((10 - (sum % 10)) % 10) as u8)
}

/// Checks that `code` is 13 digits with a correct check digit.
pub fn validate_ean13(code: &str) -> Result<(), ValidationError> {
    if code.len() != 13 {
        return Err(invalid("EAN-13 must be 13 digits"));
    }

    let digits = digits_of(code)?;
    let expected = ean13_check_digit(&code[..12])?;
    if digits[12] != expected {
        return Err(invalid("check digit does not match"));
    }
    Ok(())
}

/// Builds the in-store EAN-13 for a sequence number.
///
/// ```rust
/// use freedom_core::barcode::{in_store_ean13, validate_ean13};
///
/// let code = in_store_ean13(42).unwrap();
/// assert!(code.starts_with("200000000042"));
/// assert!(validate_ean13(&code).is_ok());
/// ```
pub fn in_store_ean13(sequence: u64) -> Result<String, ValidationError> {
    if sequence > MAX_IN_STORE_SEQUENCE {
        return Err(ValidationError::OutOfRange {
            field: "barcode sequence".to_string(),
            min: 0,
            max: MAX_IN_STORE_SEQUENCE as i64,
        });
    }

    let body = format!("{}{:09}", IN_STORE_PREFIX, sequence);
    let check = ean13_check_digit(&body)?;
    Ok(format!("{}{}", body, check))
}

/// True when `code` is a valid in-store EAN-13.
pub fn is_in_store(code: &str) -> bool {
    code.starts_with(IN_STORE_PREFIX) && validate_ean13(code).is_ok()
}

fn digits_of(s: &str) -> Result<Vec<u8>, ValidationError> {
    s.chars()
        .map(|c| {
            c.to_digit(10)
                .map(|d| d as u8)
                .ok_or_else(|| invalid("must contain only digits"))
        })
        .collect()
}

fn invalid(reason: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: "barcode".to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_check_digits() {
        assert_eq!(ean13_check_digit("400638133393").unwrap(), 1);
        assert_eq!(ean13_check_digit("590123412345").unwrap(), 7);
        assert_eq!(ean13_check_digit("200000000000").unwrap(), 8);
    }

    #[test]
    fn test_validate_ean13() {
        assert!(validate_ean13("4006381333931").is_ok());
        assert!(validate_ean13("4006381333932").is_err());
        assert!(validate_ean13("400638133393").is_err());
        assert!(validate_ean13("40063813339X1").is_err());
    }

    #[test]
    fn test_in_store_codes() {
        let code = in_store_ean13(1).unwrap();
        assert_eq!(code.len(), 13);
        assert!(code.starts_with("200000000001"));
        assert!(is_in_store(&code));

        assert!(!is_in_store("4006381333931"));
        assert!(in_store_ean13(MAX_IN_STORE_SEQUENCE + 1).is_err());
    }
}
