//! Screen-region capture.
//!
//! This module grabs the configured region of the screen once per tick,
//! writes the diagnostic screenshot and converts the frame to grayscale for
//! the recognizer.

use crate::types::{CaptureError, CaptureRegion};
use image::{DynamicImage, GrayImage, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};

#[cfg(target_os = "macos")]
mod backend {
    use super::*;
    use core_graphics::geometry::{CGPoint, CGRect, CGSize};
    use core_graphics::image::CGImage;
    use core_graphics::window::{
        kCGNullWindowID, kCGWindowImageBestResolution, kCGWindowListOptionOnScreenOnly,
        CGWindowListCreateImage,
    };
    use foreign_types_shared::ForeignType;

    /// Capture a rectangle of the composited screen
    pub fn capture_region(region: &CaptureRegion) -> Result<RgbaImage, CaptureError> {
        let rect = CGRect::new(
            &CGPoint::new(region.x as f64, region.y as f64),
            &CGSize::new(region.width as f64, region.height as f64),
        );

        let cg_image: CGImage = unsafe {
            let image_ref = CGWindowListCreateImage(
                rect,
                kCGWindowListOptionOnScreenOnly,
                kCGNullWindowID,
                kCGWindowImageBestResolution,
            );
            if image_ref.is_null() {
                return Err(CaptureError::CaptureFailed(
                    "CGWindowListCreateImage returned null (screen recording permission?)".to_string(),
                ));
            }
            CGImage::from_ptr(image_ref)
        };

        convert_cgimage_to_rgba(&cg_image)
            .ok_or_else(|| CaptureError::CaptureFailed("Unreadable CGImage pixel data".to_string()))
    }

    /// Convert CGImage to image crate's RgbaImage
    fn convert_cgimage_to_rgba(cg_image: &CGImage) -> Option<RgbaImage> {
        let width = cg_image.width();
        let height = cg_image.height();
        let bytes_per_row = cg_image.bytes_per_row();
        let bytes_per_pixel = cg_image.bits_per_pixel() / 8;

        let data = cg_image.data();
        let bytes = data.bytes();

        if bytes.is_empty() || bytes_per_pixel < 4 {
            return None;
        }

        let mut rgba_data = Vec::with_capacity(width * height * 4);

        for y in 0..height {
            let row_start = y * bytes_per_row;
            for x in 0..width {
                let pixel_start = row_start + x * bytes_per_pixel;
                if pixel_start + 3 >= bytes.len() {
                    return None;
                }
                // Display captures come back as BGRA
                let b = bytes[pixel_start];
                let g = bytes[pixel_start + 1];
                let r = bytes[pixel_start + 2];
                let a = bytes[pixel_start + 3];
                rgba_data.extend_from_slice(&[r, g, b, a]);
            }
        }

        RgbaImage::from_raw(width as u32, height as u32, rgba_data)
    }
}

#[cfg(not(target_os = "macos"))]
mod backend {
    use super::*;

    pub fn capture_region(_region: &CaptureRegion) -> Result<RgbaImage, CaptureError> {
        Err(CaptureError::Unsupported)
    }
}

/// Source of raw frames for a screen region
pub trait ScreenGrabber: Send + Sync {
    fn grab(&self, region: &CaptureRegion) -> Result<RgbaImage, CaptureError>;
}

/// Grabber backed by the platform screen APIs
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformGrabber;

impl PlatformGrabber {
    pub fn new() -> Self {
        Self
    }
}

impl ScreenGrabber for PlatformGrabber {
    fn grab(&self, region: &CaptureRegion) -> Result<RgbaImage, CaptureError> {
        if region.is_empty() {
            return Err(CaptureError::EmptyRegion);
        }
        backend::capture_region(region)
    }
}

/// One screenshot taken at one tick
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub image: RgbaImage,
    pub captured_at: std::time::Instant,
}

impl RawFrame {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            captured_at: std::time::Instant::now(),
        }
    }

    /// Single-channel copy used for recognition
    pub fn to_grayscale(&self) -> GrayImage {
        DynamicImage::ImageRgba8(self.image.clone()).into_luma8()
    }

    /// Write the frame as PNG, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<(), image::ImageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(image::ImageError::IoError)?;
        }
        self.image.save(path)
    }
}

/// Region capture service used by the capture loop
pub struct CaptureService {
    region: CaptureRegion,
    artifact_path: Option<PathBuf>,
}

impl CaptureService {
    pub fn new(region: CaptureRegion, artifact_path: Option<PathBuf>) -> Self {
        Self { region, artifact_path }
    }

    pub fn region(&self) -> CaptureRegion {
        self.region
    }

    /// Grab a frame over the configured region
    pub fn capture(&self, grabber: &dyn ScreenGrabber) -> Result<RawFrame, CaptureError> {
        trace!("Capturing region {:?}", self.region);

        let start = std::time::Instant::now();
        let image = grabber.grab(&self.region)?;
        debug!(
            "Region captured in {:?} ({}x{})",
            start.elapsed(),
            image.width(),
            image.height()
        );

        Ok(RawFrame::new(image))
    }

    /// Overwrite the diagnostic screenshot. Failures are logged, never fatal.
    pub fn persist_artifact(&self, frame: &RawFrame) -> bool {
        let Some(path) = &self.artifact_path else {
            return false;
        };

        match frame.save(path) {
            Ok(()) => {
                trace!("Saved diagnostic screenshot to {}", path.display());
                true
            }
            Err(e) => {
                warn!("Failed to save diagnostic screenshot to {}: {}", path.display(), e);
                false
            }
        }
    }
}
