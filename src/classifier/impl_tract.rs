use crate::classifier::interface::{Classification, ImageClassifier, TOP_K};
use crate::classifier::{preprocess, ranking};
use crate::registry::{ModelEntry, ModelFormat, ModelLoader};
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use tract_onnx::prelude::tract_ndarray::Array4;
use tract_onnx::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputLayout {
    Nhwc,
    Nchw,
}

/// Classifier backed by a tract execution plan. Accepts TFLite, ONNX and
/// NNEF model files; the tensor conventions are whatever the model declares.
pub struct ImageClassifierTract {
    plan: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    labels: Vec<String>,
    layout: InputLayout,
    width: u32,
    height: u32,
}

/// Load a model file into a typed tract model, dispatching on extension.
pub fn load_typed_model(path: &Path) -> TractResult<TypedModel> {
    match ModelFormat::from_path(path) {
        Some(ModelFormat::Tflite) => tract_tflite::Tflite::default().model_for_path(path),
        Some(ModelFormat::Nnef) => tract_nnef::nnef().with_tract_core().model_for_path(path),
        Some(ModelFormat::Onnx) => tract_onnx::onnx().model_for_path(path)?.into_typed(),
        None => anyhow::bail!("unsupported model file: {}", path.display()),
    }
}

impl ImageClassifierTract {
    pub fn load(
        path: &Path,
        labels: Vec<String>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let model = load_typed_model(path)?;

        let fact = model.input_fact(0)?.clone();
        if fact.datum_type != f32::datum_type() {
            return Err(format!(
                "model input is {:?}, only f32 inputs are supported",
                fact.datum_type
            )
            .into());
        }
        let shape = fact
            .shape
            .as_concrete()
            .ok_or("model input shape is not fully determined")?;
        let (layout, height, width) = match shape {
            [_, h, w, 3] => (InputLayout::Nhwc, *h, *w),
            [_, 3, h, w] => (InputLayout::Nchw, *h, *w),
            other => return Err(format!("unsupported input shape {:?}", other).into()),
        };

        let plan = model.into_optimized()?.into_runnable()?;

        Ok(Self {
            plan,
            labels,
            layout,
            width: width as u32,
            height: height as u32,
        })
    }

    fn input_tensor(&self, image: &DynamicImage) -> Tensor {
        let nhwc = preprocess::to_input_array(image, self.width, self.height);
        match self.layout {
            InputLayout::Nhwc => nhwc.into_tensor(),
            InputLayout::Nchw => {
                let (h, w) = (self.height as usize, self.width as usize);
                Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| nhwc[[0, y, x, c]])
                    .into_tensor()
            }
        }
    }
}

impl ImageClassifier for ImageClassifierTract {
    fn input_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn classify(
        &self,
        image: &DynamicImage,
    ) -> Result<Vec<Classification>, Box<dyn std::error::Error + Send + Sync>> {
        let input = self.input_tensor(image);
        let outputs = self.plan.run(tvec!(input.into_tvalue()))?;
        let scores: Vec<f32> = outputs[0].to_array_view::<f32>()?.iter().copied().collect();
        Ok(ranking::to_classifications(&scores, &self.labels, TOP_K))
    }
}

pub struct TractModelLoader;

impl TractModelLoader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TractModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelLoader for TractModelLoader {
    fn load(
        &self,
        entry: &ModelEntry,
    ) -> Result<Arc<dyn ImageClassifier + Send + Sync>, Box<dyn std::error::Error + Send + Sync>>
    {
        let classifier = ImageClassifierTract::load(&entry.path, entry.labels.clone())?;
        Ok(Arc::new(classifier))
    }
}
