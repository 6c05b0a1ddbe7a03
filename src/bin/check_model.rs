use anyhow::{bail, Context, Result};
use clap::Parser;
use screen_classifier::classifier::impl_tract::load_typed_model;
use screen_classifier::registry;
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;

/// Inspect a model file: tensor shapes, dtypes, quantization and
/// compatibility with the screen classifier.
#[derive(Parser)]
#[command(name = "check-model")]
struct Args {
    /// Model file to inspect (.tflite, .onnx or .nnef.tar).
    model: Option<PathBuf>,

    /// Check every model file in the model directory.
    #[arg(short = 'a', long = "all")]
    all: bool,

    /// Directory scanned with --all.
    #[arg(long, default_value = "model")]
    model_dir: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.all {
        return check_all(&args.model_dir);
    }

    let path = args
        .model
        .or_else(default_model_path)
        .context("no model file given and none found; pass a path or use --all")?;
    check_model(&path)
}

fn default_model_path() -> Option<PathBuf> {
    ["model/model.tflite", "model.tflite", "./model.tflite"]
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn check_all(dir: &Path) -> Result<()> {
    let files = registry::model_files(dir);
    if files.is_empty() {
        bail!("no model files found in {}", dir.display());
    }

    println!("Found {} model file(s) in {}", files.len(), dir.display());
    let mut failures = 0;
    for path in &files {
        println!("\n{}", "-".repeat(50));
        if let Err(e) = check_model(path) {
            println!("check failed: {:#}", e);
            failures += 1;
        }
    }

    println!("\n{}", "=".repeat(50));
    println!("{} of {} model(s) passed", files.len() - failures, files.len());
    if failures > 0 {
        bail!("{} model(s) failed the check", failures);
    }
    Ok(())
}

fn check_model(path: &Path) -> Result<()> {
    println!("Checking model: {}", path.display());
    if !path.exists() {
        bail!("model file does not exist: {}", path.display());
    }

    let model =
        load_typed_model(path).with_context(|| format!("loading {}", path.display()))?;

    println!("Inputs:");
    for (i, outlet) in model.input_outlets()?.iter().enumerate() {
        let fact = model.outlet_fact(*outlet)?;
        let name = &model.node(outlet.node).name;
        println!("  input {}: {} {}", i, name, describe_fact(fact));
    }
    println!("Outputs:");
    for (i, outlet) in model.output_outlets()?.iter().enumerate() {
        let fact = model.outlet_fact(*outlet)?;
        let name = &model.node(outlet.node).name;
        println!("  output {}: {} {}", i, name, describe_fact(fact));
    }

    let input = model.input_fact(0)?;
    let output = model.output_fact(0)?;
    let notes = compatibility_notes(
        input.shape.as_concrete().unwrap_or(&[]),
        input.datum_type == f32::datum_type(),
        input.datum_type.is_quantized(),
        output.shape.as_concrete().unwrap_or(&[]),
    );
    println!("Compatibility:");
    for note in notes {
        println!("  - {}", note);
    }
    Ok(())
}

fn describe_fact(fact: &TypedFact) -> String {
    let shape = match fact.shape.as_concrete() {
        Some(dims) => format!("{:?}", dims),
        None => format!("{:?}", fact.shape),
    };
    format!("shape {} dtype {:?}", shape, fact.datum_type)
}

const COMMON_SIZES: [usize; 3] = [224, 299, 512];

/// Heuristic notes on whether the classifier app can drive this model.
fn compatibility_notes(
    input_shape: &[usize],
    input_is_f32: bool,
    input_is_quantized: bool,
    output_shape: &[usize],
) -> Vec<String> {
    let mut notes = vec![];

    let spatial = match input_shape {
        [_, h, w, 3] => {
            notes.push(format!("image input {}x{} (NHWC, 3 channels)", w, h));
            Some((*w, *h))
        }
        [_, 3, h, w] => {
            notes.push(format!("image input {}x{} (NCHW, 3 channels)", w, h));
            Some((*w, *h))
        }
        other => {
            notes.push(format!("input shape {:?} is not a standard image input", other));
            None
        }
    };

    if let Some((w, h)) = spatial {
        if w == h && COMMON_SIZES.contains(&w) {
            notes.push(format!("input size {}x{} is a common size", w, h));
        } else {
            notes.push(format!(
                "input size {}x{} is uncommon (common sizes: 224, 299, 512)",
                w, h
            ));
        }
    }

    if input_is_f32 {
        notes.push("input dtype f32 (standard preprocessing applies)".to_string());
    } else {
        notes.push("input dtype is not f32; the app only feeds f32 inputs".to_string());
    }
    if input_is_quantized {
        notes.push("model input is quantized and may need scale/zero-point handling".to_string());
    }

    match output_shape {
        [1, classes] => {
            notes.push(format!("classification output with {} classes", classes));
            notes.push(format!(
                "label list for this model should have {} entries",
                classes
            ));
        }
        other => {
            notes.push(format!(
                "output shape {:?} is not a standard classification output",
                other
            ));
        }
    }

    notes
}

#[cfg(test)]
mod check_model_test {
    use super::*;

    #[test]
    fn test_notes_for_standard_nhwc_classifier() {
        let notes = compatibility_notes(&[1, 224, 224, 3], true, false, &[1, 5]);
        assert!(notes.iter().any(|n| n.contains("NHWC")));
        assert!(notes.iter().any(|n| n.contains("common size")));
        assert!(notes.iter().any(|n| n.contains("5 classes")));
    }

    #[test]
    fn test_notes_flag_uncommon_size_and_dtype() {
        let notes = compatibility_notes(&[1, 100, 100, 3], false, true, &[1, 10]);
        assert!(notes.iter().any(|n| n.contains("uncommon")));
        assert!(notes.iter().any(|n| n.contains("not f32")));
        assert!(notes.iter().any(|n| n.contains("quantized")));
    }

    #[test]
    fn test_notes_flag_non_image_input() {
        let notes = compatibility_notes(&[1, 128], true, false, &[1, 5, 5]);
        assert!(notes.iter().any(|n| n.contains("not a standard image input")));
        assert!(notes
            .iter()
            .any(|n| n.contains("not a standard classification output")));
    }
}
