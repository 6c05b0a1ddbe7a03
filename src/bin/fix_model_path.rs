use anyhow::{bail, Result};
use clap::Parser;
use screen_classifier::config::{Config, CONFIG_FILE};
use screen_classifier::registry;
use std::path::PathBuf;

/// Repair the app config when its model path points at a file that no
/// longer exists, picking a model that is actually on disk.
#[derive(Parser)]
#[command(name = "fix-model-path")]
struct Args {
    /// Config file to inspect and repair.
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Override the directory scanned for model files.
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load_or_default(&args.config);
    if let Some(dir) = args.model_dir {
        config.model_dir = dir;
    }

    let files = registry::model_files(&config.model_dir);
    if files.is_empty() {
        bail!(
            "no model files in {}; put a .tflite, .onnx or .nnef.tar file there first",
            config.model_dir.display()
        );
    }

    println!("Model files in {}:", config.model_dir.display());
    for path in &files {
        let bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        println!(
            "  {} ({:.1} MB)",
            path.file_name().unwrap_or_default().to_string_lossy(),
            bytes as f64 / (1024.0 * 1024.0)
        );
    }

    if let Some(current) = &config.model_path {
        if current.exists() {
            println!("Configured model path is already valid: {}", current.display());
            return Ok(());
        }
        println!("Configured model path does not exist: {}", current.display());
    } else {
        println!("No model path configured yet");
    }

    let chosen = pick_model(&files).clone();
    config.model_path = Some(chosen.clone());
    config
        .save(&args.config)
        .map_err(|e| anyhow::anyhow!("saving {}: {}", args.config.display(), e))?;

    println!("Updated {} to use {}", args.config.display(), chosen.display());
    Ok(())
}

/// Prefer the conventionally named `model.*` file, else the first entry.
fn pick_model(files: &[PathBuf]) -> &PathBuf {
    files
        .iter()
        .find(|p| registry::model_stem(p).as_deref() == Some("model"))
        .unwrap_or(&files[0])
}

#[cfg(test)]
mod fix_model_path_test {
    use super::*;

    #[test]
    fn test_prefers_conventional_model_file() {
        let files = vec![
            PathBuf::from("model/animals.tflite"),
            PathBuf::from("model/model.tflite"),
        ];
        assert_eq!(pick_model(&files), &PathBuf::from("model/model.tflite"));
    }

    #[test]
    fn test_prefers_conventional_nnef_archive() {
        let files = vec![
            PathBuf::from("model/animals.tflite"),
            PathBuf::from("model/model.nnef.tar"),
        ];
        assert_eq!(pick_model(&files), &PathBuf::from("model/model.nnef.tar"));
    }

    #[test]
    fn test_falls_back_to_first_file() {
        let files = vec![
            PathBuf::from("model/animals.tflite"),
            PathBuf::from("model/birds.onnx"),
        ];
        assert_eq!(pick_model(&files), &PathBuf::from("model/animals.tflite"));
    }
}
