//! Reference-identifier extraction.

use super::FieldExtractor;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Exactly eight hex digits bounded by word boundaries on both sides
    static ref REFERENCE_ID: Regex = Regex::new(r"\b[0-9a-fA-F]{8}\b").unwrap();
}

/// Returns the leftmost standalone 8-digit hex token verbatim
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifierExtractor;

impl IdentifierExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FieldExtractor for IdentifierExtractor {
    type Output = Option<String>;

    fn extract(&self, text: &str) -> Option<String> {
        REFERENCE_ID.find(text).map(|m| m.as_str().to_string())
    }
}
