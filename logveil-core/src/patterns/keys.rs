//! keys.rs - Field-name heuristic.
//!
//! Decides whether a value must be redacted purely because of the key it is
//! stored under, independent of what the value looks like.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashSet;

use once_cell::sync::Lazy;

// Matched as substrings of the compacted key ("userPassword" -> "userpassword").
static SENSITIVE_TERMS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "password",
        "passwd",
        "passphrase",
        "secret",
        "token",
        "apikey",
        "accesskey",
        "privatekey",
        "signingkey",
        "encryptionkey",
        "credential",
        "authorization",
        "cookie",
        "sessionid",
        "sessionkey",
        "connectionstring",
        "creditcard",
        "cardnumber",
        "phone",
        "mobile",
        "telephone",
        "cellphone",
    ]
});

// Too short to match as substrings ("hotel", "spinner"); must be a whole segment.
static SENSITIVE_SEGMENTS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut set = HashSet::new();
    set.extend(["pwd", "pass", "pin", "tel", "ssn", "cvv", "cvc", "otp", "auth", "dsn", "cell"]);
    set
});

/// Splits a key on punctuation, whitespace and camelCase boundaries, lowercasing
/// each segment.
fn segments(key: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in key.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Returns true when `key` names a field whose value should never be logged.
pub fn is_sensitive_key(key: &str) -> bool {
    if key.is_empty() {
        return false;
    }
    let parts = segments(key);
    if parts.iter().any(|p| SENSITIVE_SEGMENTS.contains(p.as_str())) {
        return true;
    }
    let compact: String = parts.concat();
    SENSITIVE_TERMS.iter().any(|term| compact.contains(term))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segments_split_camel_and_snake() {
        assert_eq!(segments("userPhoneNumber"), vec!["user", "phone", "number"]);
        assert_eq!(segments("api_key"), vec!["api", "key"]);
        assert_eq!(segments("X-Auth-Token"), vec!["x", "auth", "token"]);
        assert_eq!(segments("HTTPStatus"), vec!["httpstatus"]);
    }

    #[test]
    fn test_sensitive_keys() {
        for key in [
            "password", "PASSWORD", "db_password", "apiKey", "api_key", "x-api-key",
            "access_token", "client_secret", "Authorization", "phone", "mobile", "tel",
            "telNo", "mobile_number", "ssn", "pin", "credentials", "session_id", "set-cookie",
        ] {
            assert!(is_sensitive_key(key), "expected '{}' to be sensitive", key);
        }
    }

    #[test]
    fn test_non_sensitive_keys() {
        for key in ["username", "hotel", "spinner", "author", "order_id", "message", "", "level"] {
            assert!(!is_sensitive_key(key), "expected '{}' to pass", key);
        }
    }
}
