//! Rule-based sentence segmentation for OCR output.

use std::ops::Range;

/// A sentence and its byte span in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence<'a> {
    pub text: &'a str,
    pub span: Range<usize>,
}

/// Splits text into sentences
pub trait SentenceSegmenter: Send + Sync {
    fn segment<'a>(&self, text: &'a str) -> Vec<Sentence<'a>>;
}

/// Segmenter driven by punctuation and line layout.
///
/// A sentence ends at `.`, `!` or `?` when followed by whitespace or the end
/// of the text, at a blank line, and at a single line break unless the next
/// line starts with a lowercase letter (a wrapped line).
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSegmenter;

impl RuleSegmenter {
    pub fn new() -> Self {
        Self
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

impl SentenceSegmenter for RuleSegmenter {
    fn segment<'a>(&self, text: &'a str) -> Vec<Sentence<'a>> {
        let mut sentences = Vec::new();
        let mut start = 0;
        let mut chars = text.char_indices().peekable();

        while let Some((idx, c)) = chars.next() {
            let end = if is_terminal(c) {
                match chars.peek() {
                    // Runs like "?!" or "..." end on their last character
                    Some(&(_, next)) if is_terminal(next) => None,
                    Some(&(_, next)) if next.is_whitespace() => Some(idx + c.len_utf8()),
                    None => Some(idx + c.len_utf8()),
                    _ => None,
                }
            } else if c == '\n' {
                let rest = &text[idx + 1..];
                let wrapped = rest
                    .trim_start_matches([' ', '\t', '\r'])
                    .chars()
                    .next()
                    .map(|next| next.is_lowercase())
                    .unwrap_or(false);
                if wrapped {
                    None
                } else {
                    Some(idx)
                }
            } else {
                None
            };

            if let Some(end) = end {
                push_trimmed(text, start..end, &mut sentences);
                start = end;
            }
        }

        push_trimmed(text, start..text.len(), &mut sentences);
        sentences
    }
}

fn push_trimmed<'a>(text: &'a str, span: Range<usize>, out: &mut Vec<Sentence<'a>>) {
    let raw = &text[span.clone()];
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    let offset = raw.len() - raw.trim_start().len();
    let start = span.start + offset;
    out.push(Sentence {
        text: trimmed,
        span: start..start + trimmed.len(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<&str> {
        RuleSegmenter::new().segment(input).into_iter().map(|s| s.text).collect()
    }

    #[test]
    fn test_splits_on_terminal_punctuation() {
        assert_eq!(
            texts("A build error occurred. See the log! Why?"),
            vec!["A build error occurred.", "See the log!", "Why?"]
        );
    }

    #[test]
    fn test_keeps_urls_and_decimals_intact() {
        assert_eq!(
            texts("See https://qb.example.com/report/1 for v1.5 details. Done"),
            vec!["See https://qb.example.com/report/1 for v1.5 details.", "Done"]
        );
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(
            texts("Status: Failed\nError: linker failed\n  with code 3\n\nRetry later"),
            vec!["Status: Failed", "Error: linker failed\n  with code 3", "Retry later"]
        );
    }

    #[test]
    fn test_punctuation_runs() {
        assert_eq!(texts("Wait... what?! Ok"), vec!["Wait...", "what?!", "Ok"]);
    }

    #[test]
    fn test_spans_point_into_source() {
        let input = "  first one.   second one ";
        for sentence in RuleSegmenter::new().segment(input) {
            assert_eq!(&input[sentence.span.clone()], sentence.text);
        }
    }

    #[test]
    fn test_empty_text() {
        assert!(texts("").is_empty());
        assert!(texts(" \n\n ").is_empty());
    }
}
