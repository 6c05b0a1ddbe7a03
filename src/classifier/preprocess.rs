use image::DynamicImage;
use tract_onnx::prelude::tract_ndarray::Array4;

/// Resize a frame to the model's declared input size, scale pixels to
/// [0,1] floats and add a leading batch dimension: `(1, height, width, 3)`.
pub fn to_input_array(image: &DynamicImage, width: u32, height: u32) -> Array4<f32> {
    let resized = image.resize_exact(width, height, image::imageops::FilterType::Triangle);
    let rgb = resized.to_rgb8();
    Array4::from_shape_fn((1, height as usize, width as usize, 3), |(_, y, x, c)| {
        rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    })
}

#[cfg(test)]
mod preprocess_test {
    use super::*;
    use image::RgbImage;

    #[test]
    fn test_shape_is_batched_nhwc() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(64, 48));
        let array = to_input_array(&image, 224, 224);
        assert_eq!(array.shape(), &[1, 224, 224, 3]);
    }

    #[test]
    fn test_values_are_normalized() {
        let mut raw = RgbImage::new(8, 8);
        for pixel in raw.pixels_mut() {
            pixel.0 = [255, 128, 0];
        }
        let array = to_input_array(&DynamicImage::ImageRgb8(raw), 4, 4);
        assert!(array.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!((array[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!(array[[0, 0, 0, 2]].abs() < 1e-6);
    }
}
