//! Core types used throughout the scanner.
//!
//! This module defines the capture region, the per-tick extraction record,
//! the product enumeration, the composite message and the events the
//! capture worker sends back to its controller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Screen rectangle sampled on every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl Default for CaptureRegion {
    fn default() -> Self {
        Self::new(350, 200, 1000, 300)
    }
}

/// Products a report can belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductKind {
    R6Full,
    R6Lite,
    Xdefiant,
}

impl ProductKind {
    /// All products in alias-table order
    pub const ALL: [ProductKind; 3] = [ProductKind::R6Full, ProductKind::R6Lite, ProductKind::Xdefiant];

    /// Fallback used when no alias matches confidently
    pub const FALLBACK: ProductKind = ProductKind::R6Full;

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::R6Full => "R6 Full",
            ProductKind::R6Lite => "R6 Lite",
            ProductKind::Xdefiant => "XDefiant",
        }
    }

    /// Textual aliases that identify this product in a report
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            ProductKind::R6Full => &["r6 full", "rainbow six full", "rainbow full"],
            ProductKind::R6Lite => &["r6 lite", "rainbow six lite", "rainbow lite", "lite"],
            ProductKind::Xdefiant => &["xdefiant", "xd", "defiant"],
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of product matching, including how confident it was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMatch {
    pub product: ProductKind,
    /// Best fuzzy score seen across all aliases (0-100)
    pub score: u8,
    /// True when no alias cleared the threshold and the fallback was used
    pub is_fallback: bool,
}

/// Fields extracted from a single tick's recognized text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub error_message: Option<String>,
    pub reference_link: Option<String>,
    pub reference_id: Option<String>,
    pub product: ProductMatch,
}

impl ExtractedRecord {
    /// A record is complete once every optional field was found in the same tick.
    /// The product always resolves, so it never gates completion.
    pub fn is_complete(&self) -> bool {
        is_complete(
            self.error_message.as_deref(),
            self.reference_link.as_deref(),
            self.reference_id.as_deref(),
        )
    }
}

/// Completion detector over the raw extractor outputs
pub fn is_complete(error_message: Option<&str>, reference_link: Option<&str>, reference_id: Option<&str>) -> bool {
    error_message.is_some() && reference_link.is_some() && reference_id.is_some()
}

/// Final message handed to the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeMessage {
    pub product: ProductKind,
    pub browser_link: String,
    pub reference_link: String,
    pub error_message: String,
    pub reference_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl CompositeMessage {
    /// Assemble a message from a complete record. Returns None if any field is missing.
    pub fn assemble(record: &ExtractedRecord, browser_link: String) -> Option<Self> {
        Some(Self {
            product: record.product.product,
            browser_link,
            reference_link: record.reference_link.clone()?,
            error_message: record.error_message.clone()?,
            reference_id: record.reference_id.clone()?,
            created_at: chrono::Utc::now(),
        })
    }

    /// Command text pasted into the ticketing tool
    pub fn text(&self) -> String {
        format!(
            "/qbissue product: {} ticket_link: {} qb_link: {} issue: {} qb_id: {}",
            self.product, self.browser_link, self.reference_link, self.error_message, self.reference_id
        )
    }
}

impl fmt::Display for CompositeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Lifecycle of the capture worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Idle,
    Running,
    Stopping,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Idle => "idle",
            WorkerState::Running => "running",
            WorkerState::Stopping => "stopping",
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            WorkerState::Idle => 0,
            WorkerState::Running => 1,
            WorkerState::Stopping => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => WorkerState::Running,
            2 => WorkerState::Stopping,
            _ => WorkerState::Idle,
        }
    }
}

/// Signals sent from the capture worker to its controller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ScanEvent {
    /// Worker changed state
    State(WorkerState),
    /// A complete report was correlated with a browser URL
    Result(CompositeMessage),
    /// Human-readable completion notice
    Notify(String),
    /// A complete record was found but no browser URL could be read
    ResolverFailed(ExtractedRecord),
}

/// Errors raised while grabbing a frame
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Capture region is empty")]
    EmptyRegion,

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    #[error("Screen capture is not supported on this platform")]
    Unsupported,
}

/// Errors raised by the text recognizer
#[derive(Debug, thiserror::Error)]
pub enum RecognitionError {
    #[error("OCR engine not found: {0}")]
    EngineNotFound(String),

    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("Recognition timed out after {0}s")]
    Timeout(u64),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by window automation and clipboard access
#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    #[error("No supported browser window found")]
    NoBrowserWindow,

    #[error("Automation failed: {0}")]
    AutomationFailed(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("UI automation is not supported on this platform")]
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(error: Option<&str>, link: Option<&str>, id: Option<&str>) -> ExtractedRecord {
        ExtractedRecord {
            error_message: error.map(String::from),
            reference_link: link.map(String::from),
            reference_id: id.map(String::from),
            product: ProductMatch {
                product: ProductKind::R6Lite,
                score: 100,
                is_fallback: false,
            },
        }
    }

    #[test]
    fn test_default_region() {
        assert_eq!(CaptureRegion::default(), CaptureRegion::new(350, 200, 1000, 300));
        assert!(!CaptureRegion::default().is_empty());
        assert!(CaptureRegion::new(0, 0, 0, 10).is_empty());
    }

    #[test]
    fn test_product_as_str() {
        assert_eq!(ProductKind::R6Full.as_str(), "R6 Full");
        assert_eq!(ProductKind::R6Lite.as_str(), "R6 Lite");
        assert_eq!(ProductKind::Xdefiant.to_string(), "XDefiant");
    }

    #[test]
    fn test_completion_requires_all_three_fields() {
        assert!(record(Some("error x"), Some("https://a"), Some("a1b2c3d4")).is_complete());
        assert!(!record(None, Some("https://a"), Some("a1b2c3d4")).is_complete());
        assert!(!record(Some("error x"), None, Some("a1b2c3d4")).is_complete());
        assert!(!record(Some("error x"), Some("https://a"), None).is_complete());
        assert!(!is_complete(None, None, None));
    }

    #[test]
    fn test_completion_ignores_product_fallback() {
        let mut rec = record(Some("error x"), Some("https://a"), Some("a1b2c3d4"));
        rec.product = ProductMatch {
            product: ProductKind::FALLBACK,
            score: 0,
            is_fallback: true,
        };
        assert!(rec.is_complete());
    }

    #[test]
    fn test_composite_message_format() {
        let rec = record(Some("error occurred: boom"), Some("https://qb/1"), Some("a1b2c3d4"));
        let message = CompositeMessage::assemble(&rec, "https://tickets/42".to_string()).unwrap();
        assert_eq!(
            message.text(),
            "/qbissue product: R6 Lite ticket_link: https://tickets/42 qb_link: https://qb/1 \
             issue: error occurred: boom qb_id: a1b2c3d4"
        );
    }

    #[test]
    fn test_composite_message_requires_complete_record() {
        let rec = record(Some("error"), None, Some("a1b2c3d4"));
        assert!(CompositeMessage::assemble(&rec, "https://tickets/42".to_string()).is_none());
    }

    #[test]
    fn test_worker_state_round_trip() {
        for state in [WorkerState::Idle, WorkerState::Running, WorkerState::Stopping] {
            assert_eq!(WorkerState::from_u8(state.as_u8()), state);
        }
    }
}
