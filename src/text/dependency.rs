//! Dependency-style span isolation.
//!
//! OCR lines often carry boilerplate in front of the interesting part, e.g.
//! `12:03:11 [build] ERROR: linker exited with code 3`. The parser finds the
//! keyword token and returns the span it governs: the token itself plus its
//! complements up to the end of its clause, without trailing punctuation.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Punct,
}

/// A token and its byte span in the sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub span: Range<usize>,
    pub kind: TokenKind,
}

/// Finds the span of a sentence governed by a keyword
pub trait DependencyParser: Send + Sync {
    /// Byte range of the keyword's subtree within `sentence`, or None when the
    /// keyword does not head any token
    fn governed_span(&self, sentence: &str, keyword: &str) -> Option<Range<usize>>;
}

/// Parser based on token shapes and clause punctuation
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicParser;

const LEADING_PUNCT: &[char] = &['(', '[', '{', '"', '\'', '<', '*', '#'];
const TRAILING_PUNCT: &[char] = &[
    '.', ',', ':', ';', '!', '?', ')', ']', '}', '"', '\'', '>', '*',
];
/// Tokens that close the clause a keyword belongs to
const CLAUSE_BREAKS: &[&str] = &[";", "|", "•"];
/// Punctuation dropped from the end of a span
const SPAN_TRIM: &[&str] = &[".", ",", ":", ";", "!", "?", "-"];

impl HeuristicParser {
    pub fn new() -> Self {
        Self
    }

    /// Split a sentence into word and punctuation tokens.
    ///
    /// Whitespace separates chunks; leading and trailing punctuation is peeled
    /// off each chunk so `"occurred:"` yields `occurred` and `:` while
    /// `12:03:11` and URLs stay whole.
    pub fn tokenize<'a>(&self, sentence: &'a str) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();

        for (chunk_start, chunk) in split_whitespace_indices(sentence) {
            let mut lo = 0;
            let mut hi = chunk.len();

            let mut leading = Vec::new();
            for (i, c) in chunk.char_indices() {
                if !LEADING_PUNCT.contains(&c) || i + c.len_utf8() >= hi {
                    break;
                }
                leading.push(i..i + c.len_utf8());
                lo = i + c.len_utf8();
            }

            let mut trailing = Vec::new();
            for (i, c) in chunk[lo..].char_indices().rev() {
                let abs = lo + i;
                if !TRAILING_PUNCT.contains(&c) || abs <= lo {
                    break;
                }
                trailing.push(abs..abs + c.len_utf8());
                hi = abs;
            }

            for range in leading {
                tokens.push(token(sentence, chunk_start, range, TokenKind::Punct));
            }
            if lo < hi {
                let kind = if chunk[lo..hi].chars().any(char::is_alphanumeric) {
                    TokenKind::Word
                } else {
                    TokenKind::Punct
                };
                tokens.push(token(sentence, chunk_start, lo..hi, kind));
            }
            for range in trailing.into_iter().rev() {
                tokens.push(token(sentence, chunk_start, range, TokenKind::Punct));
            }
        }

        tokens
    }
}

fn token(sentence: &str, base: usize, range: Range<usize>, kind: TokenKind) -> Token<'_> {
    let span = base + range.start..base + range.end;
    Token {
        text: &sentence[span.clone()],
        span,
        kind,
    }
}

fn split_whitespace_indices(text: &str) -> impl Iterator<Item = (usize, &str)> + '_ {
    text.split(char::is_whitespace)
        .filter(|chunk| !chunk.is_empty())
        .map(move |chunk| (chunk.as_ptr() as usize - text.as_ptr() as usize, chunk))
}

impl DependencyParser for HeuristicParser {
    fn governed_span(&self, sentence: &str, keyword: &str) -> Option<Range<usize>> {
        let keyword = keyword.to_lowercase();
        let tokens = self.tokenize(sentence);

        let head = tokens
            .iter()
            .position(|t| t.kind == TokenKind::Word && t.text.to_lowercase().contains(&keyword))?;

        let mut last = head;
        for (i, tok) in tokens.iter().enumerate().skip(head + 1) {
            if tok.kind == TokenKind::Punct && CLAUSE_BREAKS.contains(&tok.text) {
                break;
            }
            last = i;
        }

        while last > head && tokens[last].kind == TokenKind::Punct && SPAN_TRIM.contains(&tokens[last].text) {
            last -= 1;
        }

        Some(tokens[head].span.start..tokens[last].span.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isolate<'a>(sentence: &'a str, keyword: &str) -> Option<&'a str> {
        HeuristicParser::new()
            .governed_span(sentence, keyword)
            .map(|span| &sentence[span])
    }

    #[test]
    fn test_tokenize_peels_punctuation() {
        let parser = HeuristicParser::new();
        let tokens: Vec<_> = parser
            .tokenize("(build) error occurred: null.")
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(tokens, vec!["(", "build", ")", "error", "occurred", ":", "null", "."]);
    }

    #[test]
    fn test_tokenize_keeps_timestamps_and_urls() {
        let parser = HeuristicParser::new();
        let tokens: Vec<_> = parser
            .tokenize("12:03:11 see https://qb.example.com/report/1.")
            .into_iter()
            .map(|t| t.text)
            .collect();
        assert_eq!(tokens, vec!["12:03:11", "see", "https://qb.example.com/report/1", "."]);
    }

    #[test]
    fn test_subtree_trims_leading_boilerplate() {
        assert_eq!(
            isolate("A build error occurred: null pointer in module X.", "error"),
            Some("error occurred: null pointer in module X")
        );
        assert_eq!(
            isolate("12:03:11 [build] ERROR: linker exited with code 3", "error"),
            Some("ERROR: linker exited with code 3")
        );
    }

    #[test]
    fn test_subtree_stops_at_clause_break() {
        assert_eq!(
            isolate("Step 4 error: missing asset; retrying in 5s", "error"),
            Some("error: missing asset")
        );
    }

    #[test]
    fn test_keyword_inside_longer_token() {
        assert_eq!(isolate("Found 3 errors in shader cache", "error"), Some("errors in shader cache"));
    }

    #[test]
    fn test_keyword_alone() {
        assert_eq!(isolate("Unknown error.", "error"), Some("error"));
    }

    #[test]
    fn test_missing_keyword() {
        assert_eq!(isolate("Everything passed", "error"), None);
    }
}
