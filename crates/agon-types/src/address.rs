//! Agent address helpers.
//!
//! Agents are identified by their on-chain wallet address. Addresses compare
//! case-insensitively, so canonical room names and registry keys always use
//! the lowercase form.

/// Returns true if `s` looks like a 0x-prefixed hex address.
///
/// The chain is the authority on address validity. This check only keeps
/// obviously malformed senders out of the real-time layer.
pub fn is_address(s: &str) -> bool {
    let rest = match s.strip_prefix("0x") {
        Some(rest) => rest,
        None => return false,
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_hexdigit())
}

/// Lowercases an address for canonical comparisons and room names.
pub fn normalize_address(s: &str) -> String {
    s.to_ascii_lowercase()
}

/// Shortens an address for display, e.g. `0x1234...cdef`.
///
/// Inputs that are too short to shorten (or not plain ASCII) are returned
/// unchanged.
pub fn short_display(s: &str) -> String {
    if !s.is_ascii() || s.len() <= 10 {
        return s.to_string();
    }
    format!("{}...{}", &s[..6], &s[s.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_address_accepts_hex() {
        assert!(is_address("0xabc123"));
        assert!(is_address("0xABCDEF0123456789"));
        assert!(is_address("0x0"));
    }

    #[test]
    fn test_is_address_rejects_malformed() {
        assert!(!is_address(""));
        assert!(!is_address("0x"));
        assert!(!is_address("abc123"));
        assert!(!is_address("0xzz"));
        assert!(!is_address("0x12 34"));
        assert!(!is_address("1x1234"));
    }

    #[test]
    fn test_normalize_address_lowercases() {
        assert_eq!(normalize_address("0xAbCd12"), "0xabcd12");
        assert_eq!(normalize_address("0xabcd12"), "0xabcd12");
    }

    #[test]
    fn test_short_display() {
        assert_eq!(
            short_display("0x1234567890abcdef1234567890abcdef12345678"),
            "0x1234...5678"
        );
        assert_eq!(short_display("0xABCDEF0123456789"), "0xABCD...6789");
        // Short inputs pass through untouched.
        assert_eq!(short_display("0xabc123"), "0xabc123");
    }
}
