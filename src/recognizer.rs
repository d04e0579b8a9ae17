//! Text recognition over captured frames.
//!
//! The production recognizer shells out to the Tesseract CLI
//! (`tesseract <image> stdout`), the same way it is run by hand.

use crate::config::OcrConfig;
use crate::types::RecognitionError;
use image::GrayImage;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Turns a grayscale frame into text
#[async_trait::async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Recognize the text in a frame. An empty string is a valid result.
    async fn recognize(&self, frame: &GrayImage) -> Result<String, RecognitionError>;
}

/// Tesseract CLI client
pub struct TesseractRecognizer {
    /// Path to the tesseract binary
    binary_path: PathBuf,
    /// Language pack passed with `-l`
    language: String,
    /// Timeout for one recognition call in seconds
    timeout_secs: u64,
}

impl TesseractRecognizer {
    /// Create a recognizer with default binary discovery
    pub fn new() -> Self {
        Self::from_config(&OcrConfig::default())
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            binary_path: config
                .tesseract_path
                .clone()
                .unwrap_or_else(Self::default_binary_path),
            language: config.language.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    /// Create with a custom binary path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            binary_path: path,
            ..Self::new()
        }
    }

    /// Get the default binary path
    fn default_binary_path() -> PathBuf {
        let paths = [
            PathBuf::from(r"C:\Program Files\Tesseract-OCR\tesseract.exe"),
            PathBuf::from("/opt/homebrew/bin/tesseract"),
            PathBuf::from("/usr/local/bin/tesseract"),
            PathBuf::from("/usr/bin/tesseract"),
        ];

        for path in paths {
            if path.exists() {
                return path;
            }
        }

        // Default fallback - resolved through PATH at spawn time
        PathBuf::from("tesseract")
    }

    pub fn binary_path(&self) -> &PathBuf {
        &self.binary_path
    }

    /// Check if the binary is available
    pub fn is_available(&self) -> bool {
        let exists = if self.binary_path.components().count() > 1 {
            self.binary_path.exists()
        } else {
            std::env::var_os("PATH")
                .map(|paths| {
                    std::env::split_paths(&paths).any(|dir| {
                        dir.join(&self.binary_path).exists()
                            || dir.join(self.binary_path.with_extension("exe")).exists()
                    })
                })
                .unwrap_or(false)
        };
        if !exists {
            debug!("Tesseract binary not found at: {}", self.binary_path.display());
        }
        exists
    }

    async fn run(&self, image_path: &std::path::Path) -> Result<String, RecognitionError> {
        let child = Command::new(&self.binary_path)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(Duration::from_secs(self.timeout_secs), child)
            .await
            .map_err(|_| RecognitionError::Timeout(self.timeout_secs))?
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    RecognitionError::EngineNotFound(self.binary_path.display().to_string())
                } else {
                    RecognitionError::Io(e)
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("Tesseract failed: {}", stderr.trim());
            return Err(RecognitionError::RecognitionFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TextRecognizer for TesseractRecognizer {
    async fn recognize(&self, frame: &GrayImage) -> Result<String, RecognitionError> {
        let temp_path = std::env::temp_dir().join(format!(
            "qb_scanner_ocr_{}_{}.png",
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        frame.save(&temp_path)?;

        debug!(
            "Running tesseract on {}x{} frame at {}",
            frame.width(),
            frame.height(),
            temp_path.display()
        );
        let result = self.run(&temp_path).await;

        // Clean up temp file
        let _ = std::fs::remove_file(&temp_path);

        let text = result?;
        debug!("Recognized {} chars", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_wins() {
        let config = OcrConfig {
            tesseract_path: Some(PathBuf::from("/opt/custom/tesseract")),
            language: "deu".to_string(),
            timeout_secs: 5,
        };
        let recognizer = TesseractRecognizer::from_config(&config);
        assert_eq!(recognizer.binary_path(), &PathBuf::from("/opt/custom/tesseract"));
        assert_eq!(recognizer.language, "deu");
        assert_eq!(recognizer.timeout_secs, 5);
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let recognizer = TesseractRecognizer::with_path(PathBuf::from("/nonexistent/dir/tesseract"));
        assert!(!recognizer.is_available());
    }

    #[tokio::test]
    async fn test_missing_binary_reports_error() {
        let recognizer = TesseractRecognizer::with_path(PathBuf::from("/nonexistent/dir/tesseract"));
        let frame = GrayImage::new(4, 4);
        let result = recognizer.recognize(&frame).await;
        assert!(matches!(result, Err(RecognitionError::EngineNotFound(_))));
    }
}
