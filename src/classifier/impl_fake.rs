use crate::classifier::interface::{Classification, ImageClassifier, TOP_K};
use crate::classifier::ranking;
use crate::registry::{ModelEntry, ModelLoader};
use image::DynamicImage;
use std::sync::Arc;

/// Fake classifier returning a fixed score vector.
pub struct ImageClassifierFake {
    scores: Vec<f32>,
    labels: Vec<String>,
    input_size: (u32, u32),
}

impl ImageClassifierFake {
    pub fn new(scores: Vec<f32>, labels: Vec<String>) -> Self {
        Self {
            scores,
            labels,
            input_size: (224, 224),
        }
    }

    pub fn animals() -> Self {
        Self::new(
            vec![0.1, 0.7, 0.05, 0.1, 0.05],
            ["cats", "chicken", "cow", "dogs", "elephant"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

impl ImageClassifier for ImageClassifierFake {
    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    fn classify(
        &self,
        _image: &DynamicImage,
    ) -> Result<Vec<Classification>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(ranking::to_classifications(&self.scores, &self.labels, TOP_K))
    }
}

/// Fake loader for model-switch tests: loads a fake classifier, or fails
/// for paths marked corrupt.
pub struct ModelLoaderFake {
    pub fail_for: Vec<String>,
}

impl ModelLoaderFake {
    pub fn new() -> Self {
        Self { fail_for: vec![] }
    }

    pub fn failing_for(ids: &[&str]) -> Self {
        Self {
            fail_for: ids.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for ModelLoaderFake {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelLoader for ModelLoaderFake {
    fn load(
        &self,
        entry: &ModelEntry,
    ) -> Result<Arc<dyn ImageClassifier + Send + Sync>, Box<dyn std::error::Error + Send + Sync>>
    {
        if self.fail_for.contains(&entry.id) {
            return Err(format!("failed to load model {}", entry.id).into());
        }
        Ok(Arc::new(ImageClassifierFake::animals()))
    }
}
