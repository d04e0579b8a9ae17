//! Text-understanding services used by the field extractors.
//!
//! Each service is a plain value object that holds no per-call state, so the
//! extractors can share one instance across ticks and tests can swap in their
//! own implementation:
//! - [`SentenceSegmenter`]: splits recognized text into sentences
//! - [`DependencyParser`]: isolates the span governed by a keyword token
//! - [`FuzzyMatcher`]: scores how well a short alias appears inside a text

pub mod dependency;
pub mod fuzzy;
pub mod sentences;

pub use dependency::{DependencyParser, HeuristicParser, Token, TokenKind};
pub use fuzzy::{FuzzyMatcher, PartialRatio};
pub use sentences::{RuleSegmenter, Sentence, SentenceSegmenter};
