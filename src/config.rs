use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name, next to the executable's working directory.
pub const CONFIG_FILE: &str = "classifier.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory scanned for model files.
    pub model_dir: PathBuf,
    /// Model loaded at startup. Falls back to the first scanned model.
    pub model_path: Option<PathBuf>,
    /// Name of the label mapping file inside the model directory.
    pub labels_file: String,
    pub frame_interval_ms: u64,
    pub failure_backoff_ms: u64,
    pub recovery_backoff_ms: u64,
    pub max_consecutive_failures: u32,
    pub preview_width: u32,
    pub preview_height: u32,
    #[serde(skip, default = "mountain_standard_time")]
    pub logger_timezone: chrono::FixedOffset,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("model"),
            model_path: None,
            labels_file: "labels.json".to_string(),
            frame_interval_ms: 100,
            failure_backoff_ms: 1000,
            recovery_backoff_ms: 2000,
            max_consecutive_failures: 5,
            preview_width: 400,
            preview_height: 300,
            logger_timezone: mountain_standard_time(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Missing or unreadable config file means defaults.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn labels_path(&self) -> PathBuf {
        self.model_dir.join(&self.labels_file)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_millis(self.failure_backoff_ms)
    }

    pub fn recovery_backoff(&self) -> Duration {
        Duration::from_millis(self.recovery_backoff_ms)
    }
}

fn mountain_standard_time() -> chrono::FixedOffset {
    chrono::FixedOffset::west_opt(7 * 3600).unwrap()
}

#[cfg(test)]
mod config_test {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model_dir, PathBuf::from("model"));
        assert_eq!(config.frame_interval(), Duration::from_millis(100));
        assert_eq!(config.max_consecutive_failures, 5);
        assert_eq!(config.labels_path(), PathBuf::from("model/labels.json"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load_or_default(Path::new("does/not/exist.json"));
        assert_eq!(config.model_dir, Config::default().model_dir);
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "model_dir": "elsewhere", "frame_interval_ms": 250 }}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.model_dir, PathBuf::from("elsewhere"));
        assert_eq!(config.frame_interval_ms, 250);
        assert_eq!(config.failure_backoff_ms, 1000);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut config = Config::default();
        config.model_path = Some(PathBuf::from("model/animals.tflite"));
        config.save(&path).unwrap();

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.model_path, Some(PathBuf::from("model/animals.tflite")));
    }
}
