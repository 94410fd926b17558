//! Admin search queries

use crate::{Error, Result};

/// Shortest query the admin search accepts
pub const MIN_QUERY_LEN: usize = 3;

/// Most rows a search returns
pub const SEARCH_LIMIT: u32 = 20;

/// A trimmed search query of acceptable length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.chars().count() < MIN_QUERY_LEN {
            return Err(Error::QueryTooShort { min: MIN_QUERY_LEN });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substring pattern for `LIKE ... ESCAPE '\'`
    pub fn like_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.0.len() + 2);
        pattern.push('%');
        for c in self.0.chars() {
            if matches!(c, '\\' | '%' | '_') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_queries_rejected() {
        assert!(matches!(SearchQuery::parse("ab"), Err(Error::QueryTooShort { min: 3 })));
        assert!(SearchQuery::parse("  ab  ").is_err());
        assert!(SearchQuery::parse("").is_err());
    }

    #[test]
    fn test_query_trimmed() {
        assert_eq!(SearchQuery::parse("  acme ").unwrap().as_str(), "acme");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        let q = SearchQuery::parse("50%_off\\").unwrap();
        assert_eq!(q.like_pattern(), "%50\\%\\_off\\\\%");
    }
}
