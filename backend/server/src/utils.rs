use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Trims a display name and collapses internal runs of whitespace.
pub fn normalize_name(input: &str) -> String {
    WHITESPACE.replace_all(input.trim(), " ").into_owned()
}

/// Durable voter identity: the participant name folded the same way the
/// roster compares names.
pub fn voter_key(name: &str) -> String {
    normalize_name(name).to_lowercase()
}

pub fn same_name(a: &str, b: &str) -> bool {
    voter_key(a) == voter_key(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_name("  Ana   García "), "Ana García");
        assert_eq!(normalize_name("Ana\tGarcía"), "Ana García");
        assert_eq!(normalize_name("   "), "");
    }

    #[test]
    fn test_voter_key() {
        assert_eq!(voter_key("Ana"), "ana");
        assert_eq!(voter_key(" ANA  García"), "ana garcía");
    }

    #[test]
    fn test_same_name() {
        assert!(same_name("Ana", "ana"));
        assert!(same_name("Ana  Maria", " ana maria"));
        assert!(!same_name("Ana", "Anabel"));
    }
}
