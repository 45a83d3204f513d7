//! Name canonicalization and comparison keys.

/// Reserved header label of the players column.
pub const HEADER_SENTINEL: &str = "name";

/// Trim and collapse internal whitespace runs to a single space.
///
/// Blank input yields an empty string.
pub fn canonicalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical form, lower-cased. Two names with the same key are the same player.
pub fn compare_key(raw: &str) -> String {
    canonicalize(raw).to_lowercase()
}

pub fn is_header_sentinel(raw: &str) -> bool {
    compare_key(raw) == HEADER_SENTINEL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_trims_and_collapses() {
        assert_eq!(canonicalize("  Amari \t  Cooper\n"), "Amari Cooper");
        assert_eq!(canonicalize("Cole"), "Cole");
    }

    #[test]
    fn canonicalize_blank_is_empty() {
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("   \t "), "");
    }

    #[test]
    fn compare_key_folds_case() {
        assert_eq!(compare_key("cole "), compare_key("Cole"));
        assert_eq!(compare_key(" CeeDee   LAMB"), "ceedee lamb");
    }

    #[test]
    fn header_sentinel_detection() {
        assert!(is_header_sentinel("name"));
        assert!(is_header_sentinel("  NAME "));
        assert!(!is_header_sentinel("names"));
        assert!(!is_header_sentinel("player name"));
        assert!(!is_header_sentinel(""));
    }
}
