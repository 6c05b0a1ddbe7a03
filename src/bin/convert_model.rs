use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;
use tract_onnx::tract_core::transform::ModelTransform;

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// ONNX model to a deployable TFLite file.
    Onnx,
    /// NNEF archive to a deployable TFLite file.
    Nnef,
    /// ONNX model to an optimized NNEF archive.
    Optimize,
    /// ONNX model to a float16 NNEF archive.
    Half,
}

/// Convert models between the formats the classifier app can load.
#[derive(Parser)]
#[command(name = "convert-model")]
struct Args {
    /// Conversion to perform.
    #[arg(value_enum)]
    mode: Mode,

    /// Input model file.
    input: PathBuf,

    /// Output path; derived from the input when omitted.
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let output = args
        .output
        .unwrap_or_else(|| default_output(args.mode, &args.input));

    convert(args.mode, &args.input, &output)?;

    println!("Converted {} -> {}", args.input.display(), output.display());
    println!("Run check-model on the output before pointing the app at it.");
    Ok(())
}

fn default_output(mode: Mode, input: &Path) -> PathBuf {
    match mode {
        Mode::Onnx | Mode::Nnef => input.with_extension("tflite"),
        Mode::Optimize | Mode::Half => input.with_extension("nnef.tar"),
    }
}

fn load_input(mode: Mode, input: &Path) -> Result<TypedModel> {
    let model = match mode {
        Mode::Nnef => tract_nnef::nnef()
            .with_tract_core()
            .model_for_path(input)
            .with_context(|| format!("reading NNEF archive {}", input.display()))?,
        Mode::Onnx | Mode::Optimize | Mode::Half => tract_onnx::onnx()
            .model_for_path(input)
            .with_context(|| format!("reading ONNX model {}", input.display()))?
            .into_typed()?,
    };
    Ok(model)
}

fn convert(mode: Mode, input: &Path, output: &Path) -> Result<()> {
    let model = load_input(mode, input)?;

    match mode {
        Mode::Onnx | Mode::Nnef => {
            let mut model = model.into_decluttered()?;
            tract_tflite::rewriter::rewrite_for_tflite(&mut model)
                .context("rewriting model for the TFLite operator set")?;
            let file = File::create(output)
                .with_context(|| format!("creating {}", output.display()))?;
            tract_tflite::Tflite::default()
                .write(&model, file)
                .context("serializing TFLite model")?;
        }
        Mode::Optimize => {
            let model = model.into_decluttered()?.into_optimized()?;
            let file = File::create(output)
                .with_context(|| format!("creating {}", output.display()))?;
            tract_nnef::nnef()
                .with_tract_core()
                .write_to_tar(&model, file)
                .context("writing NNEF archive")?;
        }
        Mode::Half => {
            let mut model = model.into_decluttered()?;
            tract_onnx::tract_core::transform::get_transform("f32-to-f16")
                .context("f32-to-f16 transform unavailable")?
                .transform(&mut model)
                .context("converting weights to f16")?;
            let file = File::create(output)
                .with_context(|| format!("creating {}", output.display()))?;
            tract_nnef::nnef()
                .with_tract_core()
                .write_to_tar(&model, file)
                .context("writing NNEF archive")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod convert_model_test {
    use super::*;

    #[test]
    fn test_default_output_extensions() {
        assert_eq!(
            default_output(Mode::Onnx, Path::new("m/net.onnx")),
            PathBuf::from("m/net.tflite")
        );
        assert_eq!(
            default_output(Mode::Nnef, Path::new("net.nnef.tar")),
            PathBuf::from("net.nnef.tflite")
        );
        assert_eq!(
            default_output(Mode::Optimize, Path::new("net.onnx")),
            PathBuf::from("net.nnef.tar")
        );
        assert_eq!(
            default_output(Mode::Half, Path::new("net.onnx")),
            PathBuf::from("net.nnef.tar")
        );
    }
}
