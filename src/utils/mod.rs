//! Utility functions and helpers.

pub mod http;
pub mod url;

/// Split a free-text query into uppercase search tokens.
pub fn search_tokens(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_uppercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_tokens() {
        assert_eq!(search_tokens("  foo\tBar "), vec!["FOO", "BAR"]);
        assert!(search_tokens("   ").is_empty());
    }
}
