//! QB Scanner - Screen-region report scanner
//!
//! Watches a fixed region of the screen for a build/error report, reads it
//! with OCR and pulls four fields out of the recognized text:
//!
//! - **Error message**: the clause governed by the first "error" (or "issue")
//! - **Reference link**: the first `http(s)://` URL
//! - **Reference id**: the first standalone 8-digit hex token
//! - **Product**: fuzzy-matched against known product aliases
//!
//! # Architecture
//!
//! A single capture loop polls the region on a fixed cadence. The first tick
//! that yields all fields at once triggers browser URL resolution, after
//! which a `/qbissue` command line is emitted and the loop stops itself.

pub mod browser;
pub mod capture;
pub mod config;
pub mod extractors;
pub mod recognizer;
pub mod scanner;
pub mod text;
pub mod types;

// Re-export commonly used types
pub use browser::{BrowserUrlResolver, ClipboardReader, DesktopWindow, SystemClipboard, WindowAutomation};
pub use capture::{CaptureService, RawFrame, ScreenGrabber};
pub use config::Config;
pub use extractors::FieldExtractors;
pub use recognizer::{TesseractRecognizer, TextRecognizer};
pub use scanner::{CaptureLoop, RunOutcome, ScanController, ScanServices, StateHandle};
pub use types::{
    AutomationError, CaptureError, CaptureRegion, CompositeMessage, ExtractedRecord, ProductKind,
    ProductMatch, RecognitionError, ScanEvent, WorkerState,
};
