use crate::capture::interface::ScreenCapture;
use crate::library::logger::interface::Logger;
use crate::region::Region;
use image::DynamicImage;
use std::sync::Arc;
use xcap::Monitor;

pub struct ScreenCaptureXcap {
    logger: Arc<dyn Logger + Send + Sync>,
}

impl ScreenCaptureXcap {
    pub fn new(logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            logger: logger.with_namespace("capture"),
        }
    }
}

impl ScreenCapture for ScreenCaptureXcap {
    fn capture(&self, region: &Region) -> Result<DynamicImage, Box<dyn std::error::Error + Send + Sync>> {
        let monitors = Monitor::all()?;
        let monitor = monitors
            .iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .or_else(|| monitors.first())
            .ok_or("no monitor found")?;

        let frame = monitor.capture_image()?;
        let full = DynamicImage::ImageRgba8(frame);

        match *region {
            Region::FullScreen => Ok(full),
            Region::Custom { x, y, width, height } => {
                // Invalid rectangles fall back to a full-screen grab.
                if region.is_degenerate() || x >= full.width() || y >= full.height() {
                    self.logger.info("invalid custom region, capturing full screen")?;
                    return Ok(full);
                }
                let width = width.min(full.width() - x);
                let height = height.min(full.height() - y);
                Ok(full.crop_imm(x, y, width, height))
            }
        }
    }
}
