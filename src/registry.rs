use crate::classifier::interface::ImageClassifier;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Model file formats the embedded runtime can load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Tflite,
    Onnx,
    Nnef,
}

impl ModelFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".nnef.tar") {
            Some(ModelFormat::Nnef)
        } else if name.ends_with(".tflite") {
            Some(ModelFormat::Tflite)
        } else if name.ends_with(".onnx") {
            Some(ModelFormat::Onnx)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    pub id: String,
    pub path: PathBuf,
    pub display_name: String,
    /// Class labels in output-index order. Empty means unknown; display
    /// falls back to synthetic `class <i>` labels.
    pub labels: Vec<String>,
}

impl ModelEntry {
    fn from_path(path: PathBuf, table: &LabelTable) -> Option<Self> {
        let stem = model_stem(&path)?;
        let labels = table.labels_for(&stem);
        Some(Self {
            display_name: stem.clone(),
            id: stem,
            path,
            labels,
        })
    }
}

/// File name minus the model-format suffix, `.nnef.tar` included.
pub fn model_stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = name
        .strip_suffix(".nnef.tar")
        .or_else(|| name.strip_suffix(".tflite"))
        .or_else(|| name.strip_suffix(".onnx"))?;
    Some(stem.to_string())
}

/// Mapping from model file stem to its class labels.
///
/// A `labels.json` file in the model directory layers user entries over the
/// built-in table, e.g. `{"birds": ["sparrow", "crow"]}`.
pub struct LabelTable {
    by_stem: HashMap<String, Vec<String>>,
}

impl LabelTable {
    pub fn builtin() -> Self {
        let mut by_stem = HashMap::new();
        let animals: Vec<String> = ["cats", "chicken", "cow", "dogs", "elephant"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        by_stem.insert("model".to_string(), animals.clone());
        by_stem.insert("animals".to_string(), animals);
        Self { by_stem }
    }

    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let contents = std::fs::read_to_string(path)?;
        let user: HashMap<String, Vec<String>> = serde_json::from_str(&contents)?;
        let mut table = Self::builtin();
        table.by_stem.extend(user);
        Ok(table)
    }

    /// Built-in table when the mapping file is missing or unreadable.
    pub fn load_or_builtin(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|_| Self::builtin())
    }

    pub fn labels_for(&self, stem: &str) -> Vec<String> {
        self.by_stem.get(stem).cloned().unwrap_or_default()
    }
}

/// All model files in a directory, sorted by file name.
pub fn model_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| ModelFormat::from_path(path).is_some())
            .collect(),
        Err(_) => vec![],
    };
    files.sort();
    files
}

/// Scan a directory and build the registry. A missing or empty directory
/// yields an empty registry; the previous registry is replaced wholesale.
pub fn scan(dir: &Path, table: &LabelTable) -> Vec<ModelEntry> {
    model_files(dir)
        .into_iter()
        .filter_map(|path| ModelEntry::from_path(path, table))
        .collect()
}

pub trait ModelLoader: Send + Sync {
    fn load(
        &self,
        entry: &ModelEntry,
    ) -> Result<Arc<dyn ImageClassifier + Send + Sync>, Box<dyn std::error::Error + Send + Sync>>;
}

pub struct ActiveModel {
    pub entry: ModelEntry,
    pub classifier: Arc<dyn ImageClassifier + Send + Sync>,
}

/// Holds the currently loaded model. Switching loads the replacement first
/// and keeps the previous model active when the load fails.
pub struct ModelSlot {
    loader: Arc<dyn ModelLoader>,
    active: Option<ActiveModel>,
}

impl ModelSlot {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self { loader, active: None }
    }

    pub fn active(&self) -> Option<&ActiveModel> {
        self.active.as_ref()
    }

    pub fn switch(
        &mut self,
        entry: &ModelEntry,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let classifier = self.loader.load(entry)?;
        self.active = Some(ActiveModel {
            entry: entry.clone(),
            classifier,
        });
        Ok(())
    }
}

#[cfg(test)]
mod registry_test {
    use super::*;
    use crate::classifier::impl_fake::ModelLoaderFake;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        path
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ModelFormat::from_path(Path::new("a/model.tflite")), Some(ModelFormat::Tflite));
        assert_eq!(ModelFormat::from_path(Path::new("b.onnx")), Some(ModelFormat::Onnx));
        assert_eq!(ModelFormat::from_path(Path::new("c.nnef.tar")), Some(ModelFormat::Nnef));
        assert_eq!(ModelFormat::from_path(Path::new("readme.md")), None);
    }

    #[test]
    fn test_stem_strips_the_full_format_suffix() {
        assert_eq!(model_stem(Path::new("m/model.tflite")).as_deref(), Some("model"));
        assert_eq!(model_stem(Path::new("m/model.nnef.tar")).as_deref(), Some("model"));
        assert_eq!(model_stem(Path::new("m/model.onnx")).as_deref(), Some("model"));
        assert_eq!(model_stem(Path::new("m/notes.txt")), None);
    }

    #[test]
    fn test_scan_missing_dir_is_empty() {
        let table = LabelTable::builtin();
        assert!(scan(Path::new("no/such/dir"), &table).is_empty());
    }

    #[test]
    fn test_scan_collects_model_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "zoo.tflite");
        touch(dir.path(), "animals.tflite");
        touch(dir.path(), "notes.txt");

        let entries = scan(dir.path(), &LabelTable::builtin());
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["animals", "zoo"]);
        // "animals" is in the built-in table, "zoo" is not.
        assert_eq!(entries[0].labels.len(), 5);
        assert!(entries[1].labels.is_empty());
    }

    #[test]
    fn test_label_file_layers_over_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.json");
        std::fs::write(&path, r#"{"zoo": ["lion", "tiger"], "model": ["a"]}"#).unwrap();

        let table = LabelTable::load(&path).unwrap();
        assert_eq!(table.labels_for("zoo"), vec!["lion", "tiger"]);
        assert_eq!(table.labels_for("model"), vec!["a"]);
        assert_eq!(table.labels_for("animals").len(), 5);
    }

    #[test]
    fn test_switch_failure_keeps_previous_model() {
        let loader = Arc::new(ModelLoaderFake::failing_for(&["corrupt"]));
        let mut slot = ModelSlot::new(loader);

        let good = ModelEntry {
            id: "animals".into(),
            path: PathBuf::from("model/animals.tflite"),
            display_name: "animals".into(),
            labels: vec!["cats".into()],
        };
        let bad = ModelEntry {
            id: "corrupt".into(),
            path: PathBuf::from("model/corrupt.tflite"),
            display_name: "corrupt".into(),
            labels: vec![],
        };

        slot.switch(&good).unwrap();
        let previous_size = slot.active().unwrap().classifier.input_size();

        assert!(slot.switch(&bad).is_err());
        let active = slot.active().unwrap();
        assert_eq!(active.entry.id, "animals");
        assert_eq!(active.classifier.input_size(), previous_size);
    }
}
