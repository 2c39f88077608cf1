//! # Input Validation
//!
//! Pre-flight checks shared by the proxy handlers. Everything here is a pure
//! function: a failed check becomes a structured 400 response in the handler,
//! never an error escaping to the transport layer, and nothing is forwarded
//! upstream until the request passes.

use lazy_regex::regex_is_match;
use serde_json::Value;

/// Wallet address: `0x` followed by 1–64 hex characters.
pub fn is_wallet_address(value: &str) -> bool {
    regex_is_match!(r"^0x[a-fA-F0-9]{1,64}$", value)
}

/// Avatar/image URLs must be absolute http(s) URLs.
pub fn is_http_url(value: &str) -> bool {
    regex_is_match!(r"^https?://.+", value)
}

/// Username rules for profile updates, applied to the trimmed value.
///
/// Returns the client-facing message on failure so the handler can emit it
/// verbatim.
pub fn validate_username(raw: &str) -> Result<(), &'static str> {
    let trimmed = raw.trim();

    if trimmed.len() < 3 || trimmed.len() > 30 {
        return Err("Username must be between 3 and 30 characters");
    }

    if !regex_is_match!(r"^[a-zA-Z0-9_\-]+$", trimmed) {
        return Err("Username can only contain letters, numbers, hyphens, and underscores");
    }

    Ok(())
}

/// Parse a bet amount from either a JSON number or a numeric string.
///
/// Strings parse leniently: the longest numeric prefix wins, so `"1.5x"`
/// parses as 1.5 and only strings with no leading number are rejected.
pub fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_float_prefix(text.trim()),
        _ => None,
    }
}

fn parse_float_prefix(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let mut seen_digit = false;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {
                seen_digit = true;
                end += 1;
            }
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }

    if !seen_digit {
        return None;
    }

    // Exponent is only committed when digits follow it ("1e" parses as 1).
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > digits_start {
            end = exp_end;
        }
    }

    text[..end].parse().ok()
}

/// Required-field presence in the sense the dashboard's consumers expect:
/// missing, `null`, `false`, `0`, and `""` all count as absent.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wallet_address_accepts_short_and_full_length() {
        assert!(is_wallet_address("0xa"));
        assert!(is_wallet_address("0xAbCdEf0123456789"));
        assert!(is_wallet_address(&format!("0x{}", "f".repeat(64))));
    }

    #[test]
    fn wallet_address_rejects_malformed_values() {
        assert!(!is_wallet_address(""));
        assert!(!is_wallet_address("0x"));
        assert!(!is_wallet_address("abc123"));
        assert!(!is_wallet_address("0xZZ"));
        assert!(!is_wallet_address(&format!("0x{}", "f".repeat(65))));
        assert!(!is_wallet_address("0x123 "));
    }

    #[test]
    fn http_url_requires_scheme_and_host() {
        assert!(is_http_url("http://example.com/a.png"));
        assert!(is_http_url("https://cdn.lenzu.io/avatar.svg"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("example.com/a.png"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url(" https://example.com"));
    }

    #[test]
    fn username_boundaries() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"a".repeat(30)).is_ok());
        assert!(validate_username(&"a".repeat(31)).is_err());
    }

    #[test]
    fn username_is_trimmed_before_checks() {
        assert!(validate_username("  alice_01  ").is_ok());
        assert!(validate_username("  ab  ").is_err());
    }

    #[test]
    fn username_charset() {
        assert!(validate_username("user_name-01").is_ok());
        assert_eq!(
            validate_username("user name"),
            Err("Username can only contain letters, numbers, hyphens, and underscores")
        );
        assert!(validate_username("user!").is_err());
    }

    #[test]
    fn amount_parses_numbers_and_numeric_strings() {
        assert_eq!(parse_amount(&json!(1.5)), Some(1.5));
        assert_eq!(parse_amount(&json!("0.01")), Some(0.01));
        assert_eq!(parse_amount(&json!("0")), Some(0.0));
        assert_eq!(parse_amount(&json!("-5")), Some(-5.0));
        assert_eq!(parse_amount(&json!("abc")), None);
        assert_eq!(parse_amount(&json!(true)), None);
    }

    #[test]
    fn amount_strings_parse_by_numeric_prefix() {
        assert_eq!(parse_amount(&json!("1.5x")), Some(1.5));
        assert_eq!(parse_amount(&json!(" 2.5 ETH ")), Some(2.5));
        assert_eq!(parse_amount(&json!(".5")), Some(0.5));
        assert_eq!(parse_amount(&json!("1e2")), Some(100.0));
        assert_eq!(parse_amount(&json!("1e")), Some(1.0));
        assert_eq!(parse_amount(&json!("-1.5abc")), Some(-1.5));
        assert_eq!(parse_amount(&json!("x1")), None);
        assert_eq!(parse_amount(&json!(".")), None);
        assert_eq!(parse_amount(&json!("-")), None);
    }

    #[test]
    fn presence_follows_truthiness() {
        assert!(is_present(Some(&json!("x"))));
        assert!(is_present(Some(&json!(1))));
        assert!(is_present(Some(&json!({"a": 1}))));
        assert!(!is_present(None));
        assert!(!is_present(Some(&json!(null))));
        assert!(!is_present(Some(&json!(""))));
        assert!(!is_present(Some(&json!(0))));
        assert!(!is_present(Some(&json!(false))));
    }
}
