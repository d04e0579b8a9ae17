//! Product extraction via fuzzy alias matching.

use super::FieldExtractor;
use crate::text::{FuzzyMatcher, PartialRatio};
use crate::types::{ProductKind, ProductMatch};
use std::sync::Arc;

/// Picks the product whose alias best matches the text.
///
/// Every alias of every product is scored against the lower-cased text and
/// the single best (product, score) pair is kept; earlier aliases win ties.
/// A best score at or below the threshold resolves to [`ProductKind::FALLBACK`].
pub struct ProductExtractor {
    matcher: Arc<dyn FuzzyMatcher>,
    threshold: u8,
}

impl ProductExtractor {
    pub fn new(threshold: u8) -> Self {
        Self::with_matcher(Arc::new(PartialRatio::new()), threshold)
    }

    pub fn with_matcher(matcher: Arc<dyn FuzzyMatcher>, threshold: u8) -> Self {
        Self { matcher, threshold }
    }
}

impl FieldExtractor for ProductExtractor {
    type Output = ProductMatch;

    fn extract(&self, text: &str) -> ProductMatch {
        let text = text.to_lowercase();
        let mut best = (ProductKind::FALLBACK, 0u8);

        for product in ProductKind::ALL {
            for alias in product.aliases() {
                let score = self.matcher.partial_score(alias, &text);
                if score > best.1 {
                    best = (product, score);
                }
            }
        }

        if best.1 > self.threshold {
            ProductMatch {
                product: best.0,
                score: best.1,
                is_fallback: false,
            }
        } else {
            ProductMatch {
                product: ProductKind::FALLBACK,
                score: best.1,
                is_fallback: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Matcher returning a fixed score for one alias and zero otherwise
    struct FixedMatcher {
        alias: &'static str,
        score: u8,
    }

    impl FuzzyMatcher for FixedMatcher {
        fn partial_score(&self, needle: &str, _haystack: &str) -> u8 {
            if needle == self.alias {
                self.score
            } else {
                0
            }
        }
    }

    #[test]
    fn test_exact_alias_wins() {
        let extractor = ProductExtractor::new(70);
        assert_eq!(extractor.extract("for Rainbow Six Lite build").product, ProductKind::R6Lite);
        assert_eq!(extractor.extract("XDefiant nightly").product, ProductKind::Xdefiant);
        assert_eq!(extractor.extract("R6 Full candidate").product, ProductKind::R6Full);
    }

    #[test]
    fn test_low_confidence_falls_back() {
        let extractor = ProductExtractor::with_matcher(
            Arc::new(FixedMatcher { alias: "xdefiant", score: 70 }),
            70,
        );
        let result = extractor.extract("anything");
        assert_eq!(result.product, ProductKind::R6Full);
        assert_eq!(result.score, 70);
        assert!(result.is_fallback);
    }

    #[test]
    fn test_score_above_threshold_is_kept() {
        let extractor = ProductExtractor::with_matcher(
            Arc::new(FixedMatcher { alias: "defiant", score: 71 }),
            70,
        );
        let result = extractor.extract("anything");
        assert_eq!(result.product, ProductKind::Xdefiant);
        assert!(!result.is_fallback);
    }

    #[test]
    fn test_always_resolves_to_a_product() {
        let extractor = ProductExtractor::new(70);
        for text in ["", "zzzz", "error occurred", "https://qb.example.com/1 a1b2c3d4"] {
            let result = extractor.extract(text);
            assert!(ProductKind::ALL.contains(&result.product));
        }
    }

    #[test]
    fn test_alias_at_end_of_text() {
        let result = ProductExtractor::new(70).extract("build failed in toolkit");
        assert_eq!(result.product, ProductKind::R6Lite);
        assert_eq!(result.score, 75);
        assert!(!result.is_fallback);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let extractor = ProductExtractor::new(70);
        assert_eq!(extractor.extract("RAINBOW LITE").product, ProductKind::R6Lite);
    }
}
