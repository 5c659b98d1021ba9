//! Syntax checks for short codes and destination URLs.

use url::Url;

pub const MIN_CODE_LEN: usize = 6;
pub const MAX_CODE_LEN: usize = 8;

/// Codes that would be shadowed by fixed routes on the redirect listener.
pub const RESERVED_CODES: &[&str] = &["healthz"];

/// True iff `code` is 6 to 8 ASCII letters or digits.
pub fn is_valid_code(code: &str) -> bool {
    (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&code.len())
        && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// True iff `s` parses as an absolute URL with an `http` or `https` scheme.
pub fn is_valid_url(s: &str) -> bool {
    match Url::parse(s) {
        // The parser lowercases the scheme.
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

pub fn is_reserved_code(code: &str) -> bool {
    RESERVED_CODES.contains(&code)
}
