use crate::region::Region;
use image::DynamicImage;

pub trait ScreenCapture: Send + Sync {
    /// Grab one raster frame for the given region.
    fn capture(&self, region: &Region) -> Result<DynamicImage, Box<dyn std::error::Error + Send + Sync>>;
}
