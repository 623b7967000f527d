// File: logveil-core/src/validators.rs
//! Programmatic validation for candidate matches.
//!
//! Some built-in detectors are broad on purpose (any 13-19 digit run can be a
//! card number). These checks run on each regex match and drop candidates that
//! are structurally impossible, which keeps order ids and timestamps readable.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;
use std::collections::HashSet;
use once_cell::sync::Lazy;

/// Validates an SSN of the form `XXX-XX-XXXX` against the structural rules of
/// the US Social Security Administration (no 000/666/9xx area, no zero group
/// or serial).
pub fn is_valid_ssn_programmatically(ssn: &str) -> bool {
    let mut parts = ssn.split('-');

    let (Some(area), Some(group), Some(serial), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    if area.len() != 3 || group.len() != 2 || serial.len() != 4 {
        return false;
    }

    let Some(area_num) = area.parse::<u16>().ok() else { return false; };
    let Some(group_num) = group.parse::<u8>().ok() else { return false; };
    let Some(serial_num) = serial.parse::<u16>().ok() else { return false; };

    let invalid_area = (area_num == 0) || (area_num == 666) || (area_num >= 900);
    let invalid_group = group_num == 0;
    let invalid_serial = serial_num == 0;

    !(invalid_area || invalid_group || invalid_serial)
}

static INVALID_NINO_PREFIXES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set = HashSet::new();
    set.extend(["BG", "GB", "KN", "NK", "NT", "TN", "ZZ"]);
    set
});

static INVALID_NINO_PREFIX_CHARS: Lazy<HashSet<char>> = Lazy::new(|| {
    let mut set = HashSet::new();
    set.extend(['D', 'F', 'I', 'Q', 'U', 'V']);
    set
});

static VALID_NINO_SUFFIX_CHARS: Lazy<HashSet<char>> = Lazy::new(|| {
    let mut set = HashSet::new();
    set.extend(['A', 'B', 'C', 'D']);
    set
});

/// Validates a UK National Insurance Number (`AA######A`, spaces allowed)
/// against the HMRC prefix and suffix rules.
pub fn is_valid_uk_nino_programmatically(nino: &str) -> bool {
    const NINO_LENGTH: usize = 9;

    let nino_normalized: Cow<str> = if nino.chars().any(|c: char| c.is_ascii_lowercase()) {
        Cow::Owned(nino.to_uppercase())
    } else {
        Cow::Borrowed(nino)
    };

    let compact = nino_normalized.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    if compact.len() != NINO_LENGTH {
        return false;
    }

    let mut chars = compact.chars();
    let (Some(first), Some(second)) = (chars.next(), chars.next()) else { return false; };
    if !first.is_ascii_alphabetic() || !second.is_ascii_alphabetic() {
        return false;
    }
    if INVALID_NINO_PREFIXES.contains(&compact[0..2]) {
        return false;
    }
    if INVALID_NINO_PREFIX_CHARS.contains(&first) || INVALID_NINO_PREFIX_CHARS.contains(&second) || second == 'O' {
        return false;
    }
    if !chars.by_ref().take(6).all(|c| c.is_ascii_digit()) {
        return false;
    }
    let Some(suffix) = chars.next() else { return false; };
    VALID_NINO_SUFFIX_CHARS.contains(&suffix) && chars.next().is_none()
}

/// Mod-10 checksum over a string of ASCII digits.
pub fn is_valid_luhn(num_str: &str) -> bool {
    let mut sum = 0;
    let mut alternate = false;

    for c in num_str.chars().rev() {
        let Some(mut digit) = c.to_digit(10) else { return false; };

        if alternate {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
        alternate = !alternate;
    }

    sum % 10 == 0
}

/// Strips separators from a candidate card number and checks its length
/// (13-19 digits) and Luhn checksum.
pub fn is_valid_credit_card_programmatically(cc_number: &str) -> bool {
    let digits: String = cc_number.chars().filter(|c| c.is_ascii_digit()).collect();
    if !(13..=19).contains(&digits.len()) {
        return false;
    }
    is_valid_luhn(&digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssn_rules() {
        assert!(is_valid_ssn_programmatically("123-45-6789"));
        assert!(!is_valid_ssn_programmatically("000-45-6789"));
        assert!(!is_valid_ssn_programmatically("666-45-6789"));
        assert!(!is_valid_ssn_programmatically("123-00-6789"));
        assert!(!is_valid_ssn_programmatically("123-45-0000"));
        assert!(!is_valid_ssn_programmatically("123456789"));
    }

    #[test]
    fn test_luhn() {
        assert!(is_valid_luhn("4111111111111111"));
        assert!(!is_valid_luhn("4111111111111112"));
        assert!(!is_valid_luhn("41x1"));
    }

    #[test]
    fn test_credit_card_with_separators() {
        assert!(is_valid_credit_card_programmatically("4111 1111 1111 1111"));
        assert!(is_valid_credit_card_programmatically("5500-0000-0000-0004"));
        assert!(!is_valid_credit_card_programmatically("1234"));
    }

    #[test]
    fn test_uk_nino() {
        assert!(is_valid_uk_nino_programmatically("AB 12 34 56 C"));
        assert!(is_valid_uk_nino_programmatically("ab123456c"));
        assert!(!is_valid_uk_nino_programmatically("BG123456C"));
        assert!(!is_valid_uk_nino_programmatically("DA123456C"));
        assert!(!is_valid_uk_nino_programmatically("AB123456E"));
    }
}
