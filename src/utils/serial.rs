use std::sync::LazyLock;

use regex::Regex;

/// Length of a full (encoded) serial number after trimming.
pub const FULL_SERIAL_LENGTH: usize = 54;

/// Length of the short serial number, dash included.
pub const SERIAL_LENGTH: usize = 11;

static SERIAL_FORMAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{7}-[0-9]{3}$").expect("static regex is valid"));

/// Extract the short serial number from a full serial number.
///
/// Only full serials that are exactly 54 characters long after trimming are
/// derivable; the result is their trailing 11 characters, unchanged.
pub fn extract_serial_number(full_serial_number: &str) -> Option<String> {
    let trimmed = full_serial_number.trim();
    let len = trimmed.chars().count();
    if len != FULL_SERIAL_LENGTH {
        return None;
    }
    Some(trimmed.chars().skip(len - SERIAL_LENGTH).collect())
}

pub fn is_valid_full_serial_length(full_serial_number: &str) -> bool {
    full_serial_number.trim().chars().count() == FULL_SERIAL_LENGTH
}

/// Check the short serial format: 7 digits, a dash, 3 digits (e.g. `1234567-123`).
pub fn is_valid_serial_format(serial_number: &str) -> bool {
    SERIAL_FORMAT_RE.is_match(serial_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn full_serial(suffix: &str) -> String {
        format!("{}{}", "0".repeat(FULL_SERIAL_LENGTH - suffix.len()), suffix)
    }

    #[test]
    fn test_extracts_trailing_eleven_characters() {
        let full = full_serial("1234567-890");
        assert_eq!(extract_serial_number(&full).as_deref(), Some("1234567-890"));
    }

    #[test]
    fn test_extraction_trims_surrounding_whitespace() {
        let full = format!("  {}\n", full_serial("7654321-012"));
        assert_eq!(extract_serial_number(&full).as_deref(), Some("7654321-012"));
        assert!(is_valid_full_serial_length(&full));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("1234567-890")]
    fn test_short_inputs_are_not_derivable(#[case] input: &str) {
        assert_eq!(extract_serial_number(input), None);
        assert!(!is_valid_full_serial_length(input));
    }

    #[test]
    fn test_off_by_one_lengths_are_rejected() {
        let short = "9".repeat(FULL_SERIAL_LENGTH - 1);
        let long = "9".repeat(FULL_SERIAL_LENGTH + 1);
        assert_eq!(extract_serial_number(&short), None);
        assert_eq!(extract_serial_number(&long), None);
    }

    #[test]
    fn test_extracted_value_always_has_serial_length() {
        for suffix in ["abcdefghijk", "0000000-000", "__________x"] {
            let extracted = extract_serial_number(&full_serial(suffix)).unwrap();
            assert_eq!(extracted.chars().count(), SERIAL_LENGTH);
            assert_eq!(extracted, suffix);
        }
    }

    #[rstest]
    #[case("1234567-123", true)]
    #[case("0000000-000", true)]
    #[case("", false)]
    #[case("123456-123", false)]
    #[case("12345678-123", false)]
    #[case("1234567123", false)]
    #[case("1234567-12a", false)]
    #[case(" 1234567-123", false)]
    #[case("1234567-123\n", false)]
    fn test_serial_format(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_valid_serial_format(input), expected);
    }
}
