//! Error-message extraction.

use super::FieldExtractor;
use crate::text::{DependencyParser, HeuristicParser, RuleSegmenter, SentenceSegmenter};
use std::sync::Arc;
use tracing::trace;

const ERROR_KEYWORD: &str = "error";
const ISSUE_KEYWORD: &str = "issue";

/// Pulls the error message out of report text.
///
/// Sentences mentioning "error" or "issue" are kept and the first one that
/// mentions "error" is used. Reports with only "issue" sentences yield no
/// message. The message is the span governed by "error", or the whole
/// sentence if no span can be isolated.
pub struct ErrorMessageExtractor {
    segmenter: Arc<dyn SentenceSegmenter>,
    parser: Arc<dyn DependencyParser>,
}

impl ErrorMessageExtractor {
    pub fn new() -> Self {
        Self::with_services(Arc::new(RuleSegmenter::new()), Arc::new(HeuristicParser::new()))
    }

    pub fn with_services(segmenter: Arc<dyn SentenceSegmenter>, parser: Arc<dyn DependencyParser>) -> Self {
        Self { segmenter, parser }
    }

    fn isolate(&self, sentence: &str, keyword: &str) -> String {
        match self.parser.governed_span(sentence, keyword) {
            Some(span) if !sentence[span.clone()].trim().is_empty() => {
                sentence[span].trim().to_string()
            }
            _ => {
                trace!("No subtree for {:?}, using whole sentence", keyword);
                sentence.to_string()
            }
        }
    }
}

impl Default for ErrorMessageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for ErrorMessageExtractor {
    type Output = Option<String>;

    fn extract(&self, text: &str) -> Option<String> {
        let candidates: Vec<(&str, String)> = self
            .segmenter
            .segment(text)
            .into_iter()
            .map(|s| (s.text, s.text.to_lowercase()))
            .filter(|(_, lower)| lower.contains(ERROR_KEYWORD) || lower.contains(ISSUE_KEYWORD))
            .collect();

        let (sentence, _) = candidates.iter().find(|(_, lower)| lower.contains(ERROR_KEYWORD))?;
        Some(self.isolate(sentence, ERROR_KEYWORD))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Range;

    /// Parser that never isolates anything
    struct NoSpanParser;

    impl DependencyParser for NoSpanParser {
        fn governed_span(&self, _sentence: &str, _keyword: &str) -> Option<Range<usize>> {
            None
        }
    }

    #[test]
    fn test_no_keyword_returns_none() {
        let extractor = ErrorMessageExtractor::new();
        assert_eq!(extractor.extract("Build finished in 4m 12s. All green."), None);
        assert_eq!(extractor.extract(""), None);
    }

    #[test]
    fn test_case_insensitive_keyword() {
        let extractor = ErrorMessageExtractor::new();
        assert_eq!(
            extractor.extract("[12:00:01] FATAL ERROR: out of memory"),
            Some("ERROR: out of memory".to_string())
        );
    }

    #[test]
    fn test_error_sentence_preferred_over_issue_sentence() {
        let extractor = ErrorMessageExtractor::new();
        let text = "Known issue with cache. Linker error in module Y.";
        assert_eq!(extractor.extract(text), Some("error in module Y".to_string()));
    }

    #[test]
    fn test_issue_only_report_has_no_message() {
        let extractor = ErrorMessageExtractor::new();
        let text = "Known issue with shader cache. See https://qb.example.com/r/9 ref deadbeef";
        assert_eq!(extractor.extract(text), None);
    }

    #[test]
    fn test_first_error_sentence_wins() {
        let extractor = ErrorMessageExtractor::new();
        let text = "First error here. Second error there.";
        assert_eq!(extractor.extract(text), Some("error here".to_string()));
    }

    #[test]
    fn test_falls_back_to_whole_sentence() {
        let extractor =
            ErrorMessageExtractor::with_services(Arc::new(RuleSegmenter::new()), Arc::new(NoSpanParser));
        assert_eq!(
            extractor.extract("Noise. A build error occurred."),
            Some("A build error occurred.".to_string())
        );
    }
}
