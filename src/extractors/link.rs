//! Reference-link extraction.

use super::FieldExtractor;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Scheme followed by any run of non-whitespace; no further URL validation
    static ref REFERENCE_LINK: Regex = Regex::new(r"https?://\S+").unwrap();
}

/// Returns the leftmost `http(s)://` link verbatim
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkExtractor;

impl LinkExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FieldExtractor for LinkExtractor {
    type Output = Option<String>;

    fn extract(&self, text: &str) -> Option<String> {
        REFERENCE_LINK.find(text).map(|m| m.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leftmost_link() {
        let text = "See http://first.example/a and https://second.example/b";
        assert_eq!(LinkExtractor::new().extract(text), Some("http://first.example/a".to_string()));
    }

    #[test]
    fn test_link_kept_verbatim() {
        // Trailing punctuation is part of the non-whitespace run
        let text = "report: https://qb.example.com/report/1?x=2, thanks";
        assert_eq!(
            LinkExtractor::new().extract(text),
            Some("https://qb.example.com/report/1?x=2,".to_string())
        );
    }

    #[test]
    fn test_no_link() {
        assert_eq!(LinkExtractor::new().extract("ftp://files.example and www.example.com"), None);
        assert_eq!(LinkExtractor::new().extract("https:// nothing"), None);
    }
}
