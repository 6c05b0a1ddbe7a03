use crate::capture::interface::ScreenCapture;
use crate::region::Region;
use image::{DynamicImage, RgbImage};
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Fake capture device serving generated frames, with scripted failures.
pub struct ScreenCaptureFake {
    fail_remaining: AtomicU32,
    fail_always: AtomicBool,
}

impl ScreenCaptureFake {
    pub fn new() -> Self {
        Self {
            fail_remaining: AtomicU32::new(0),
            fail_always: AtomicBool::new(false),
        }
    }

    /// The next `count` captures return an error.
    pub fn fail_next(&self, count: u32) {
        self.fail_remaining.store(count, Ordering::Relaxed);
    }

    pub fn fail_always(&self, enabled: bool) {
        self.fail_always.store(enabled, Ordering::Relaxed);
    }
}

impl Default for ScreenCaptureFake {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenCapture for ScreenCaptureFake {
    fn capture(&self, region: &Region) -> Result<DynamicImage, Box<dyn std::error::Error + Send + Sync>> {
        if self.fail_always.load(Ordering::Relaxed) {
            return Err("simulated capture failure".into());
        }
        if self
            .fail_remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err("simulated capture failure".into());
        }

        let (width, height) = match *region {
            Region::FullScreen => (640, 480),
            Region::Custom { width, height, .. } => (width.max(1), height.max(1)),
        };

        let mut rng = rand::rng();
        let mut frame = RgbImage::new(width, height);
        for pixel in frame.pixels_mut() {
            pixel.0 = [rng.random(), rng.random(), rng.random()];
        }
        Ok(DynamicImage::ImageRgb8(frame))
    }
}

#[cfg(test)]
mod capture_fake_test {
    use super::*;

    #[test]
    fn test_custom_region_sizes_frame() {
        let capture = ScreenCaptureFake::new();
        let frame = capture
            .capture(&Region::Custom { x: 0, y: 0, width: 32, height: 16 })
            .unwrap();
        assert_eq!((frame.width(), frame.height()), (32, 16));
    }

    #[test]
    fn test_scripted_failures_then_recovery() {
        let capture = ScreenCaptureFake::new();
        capture.fail_next(2);
        assert!(capture.capture(&Region::FullScreen).is_err());
        assert!(capture.capture(&Region::FullScreen).is_err());
        assert!(capture.capture(&Region::FullScreen).is_ok());
    }
}
