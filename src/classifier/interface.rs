use image::DynamicImage;

/// How many predictions a classifier reports per frame.
pub const TOP_K: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

pub trait ImageClassifier: Send + Sync {
    /// Declared input (width, height) of the underlying model.
    fn input_size(&self) -> (u32, u32);

    /// Classify one frame and return up to [`TOP_K`] predictions, sorted by
    /// descending confidence.
    fn classify(
        &self,
        image: &DynamicImage,
    ) -> Result<Vec<Classification>, Box<dyn std::error::Error + Send + Sync>>;
}
