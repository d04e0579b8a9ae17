//! Field extractors for recognized report text.
//!
//! Four independent extractors each read the same text and produce one field:
//! - Error message: sentence filter plus dependency-style span isolation
//! - Reference link: first `http(s)://` URL
//! - Reference id: first standalone 8-digit hex token
//! - Product: best fuzzy alias match with a fallback
//!
//! The extractors hold no per-call state, so running them in any order over
//! the same text gives the same record.

pub mod error_message;
pub mod identifier;
pub mod link;
pub mod product;

pub use error_message::ErrorMessageExtractor;
pub use identifier::IdentifierExtractor;
pub use link::LinkExtractor;
pub use product::ProductExtractor;

use crate::config::ExtractionConfig;
use crate::types::ExtractedRecord;
use tracing::debug;

/// Trait for a single-field extractor
pub trait FieldExtractor: Send + Sync {
    type Output;

    /// Extract the field from one tick's recognized text
    fn extract(&self, text: &str) -> Self::Output;
}

/// The four extractors run against every tick
pub struct FieldExtractors {
    error_message: ErrorMessageExtractor,
    link: LinkExtractor,
    identifier: IdentifierExtractor,
    product: ProductExtractor,
}

impl FieldExtractors {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            error_message: ErrorMessageExtractor::new(),
            link: LinkExtractor::new(),
            identifier: IdentifierExtractor::new(),
            product: ProductExtractor::new(config.product_threshold),
        }
    }

    /// Build from individually configured extractors
    pub fn with_extractors(
        error_message: ErrorMessageExtractor,
        link: LinkExtractor,
        identifier: IdentifierExtractor,
        product: ProductExtractor,
    ) -> Self {
        Self {
            error_message,
            link,
            identifier,
            product,
        }
    }

    /// Run all four extractors over the text
    pub fn extract(&self, text: &str) -> ExtractedRecord {
        let record = ExtractedRecord {
            error_message: self.error_message.extract(text),
            reference_link: self.link.extract(text),
            reference_id: self.identifier.extract(text),
            product: self.product.extract(text),
        };

        debug!(
            "Extracted: error={:?} link={:?} id={:?} product={} (score {}{})",
            record.error_message,
            record.reference_link,
            record.reference_id,
            record.product.product,
            record.product.score,
            if record.product.is_fallback { ", fallback" } else { "" }
        );

        record
    }
}

impl Default for FieldExtractors {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductKind;

    const REPORT: &str = "A build error occurred: null pointer in module X. \
        See https://qb.example.com/report/1 ref a1b2c3d4 for rainbow six lite build.";

    #[test]
    fn test_full_report() {
        let record = FieldExtractors::default().extract(REPORT);

        assert_eq!(
            record.error_message.as_deref(),
            Some("error occurred: null pointer in module X")
        );
        assert_eq!(record.reference_link.as_deref(), Some("https://qb.example.com/report/1"));
        assert_eq!(record.reference_id.as_deref(), Some("a1b2c3d4"));
        assert_eq!(record.product.product, ProductKind::R6Lite);
        assert!(!record.product.is_fallback);
        assert!(record.is_complete());
    }

    #[test]
    fn test_report_without_keyword_is_incomplete() {
        let text = "Build finished. See https://qb.example.com/report/2 ref deadbeef for xdefiant.";
        let record = FieldExtractors::default().extract(text);

        assert!(record.error_message.is_none());
        assert_eq!(record.reference_id.as_deref(), Some("deadbeef"));
        assert_eq!(record.product.product, ProductKind::Xdefiant);
        assert!(!record.is_complete());
    }

    #[test]
    fn test_issue_only_report_is_incomplete() {
        let text = "Known issue with shader cache. See https://qb.example.com/r/9 ref deadbeef";
        let record = FieldExtractors::default().extract(text);

        assert!(record.error_message.is_none());
        assert!(record.reference_link.is_some());
        assert!(record.reference_id.is_some());
        assert!(!record.is_complete());
    }

    #[test]
    fn test_with_extractors_uses_given_product_threshold() {
        // No score can exceed 100, so every report falls back
        let extractors = FieldExtractors::with_extractors(
            ErrorMessageExtractor::new(),
            LinkExtractor::new(),
            IdentifierExtractor::new(),
            ProductExtractor::new(100),
        );
        let record = extractors.extract(REPORT);

        assert_eq!(record.product.product, ProductKind::R6Full);
        assert_eq!(record.product.score, 100);
        assert!(record.product.is_fallback);
        assert!(record.is_complete());
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let extractors = FieldExtractors::default();
        assert_eq!(extractors.extract(REPORT), extractors.extract(REPORT));
    }

    #[test]
    fn test_empty_text() {
        let record = FieldExtractors::default().extract("");
        assert!(record.error_message.is_none());
        assert!(record.reference_link.is_none());
        assert!(record.reference_id.is_none());
        assert_eq!(record.product.product, ProductKind::R6Full);
        assert!(record.product.is_fallback);
    }
}
