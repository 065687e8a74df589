use anyhow::Context;
use image::GrayImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};

/// Text recognizer restricted to a digit character set.
///
/// Implementations are shared across worker threads, so one engine instance
/// serves a whole group.
pub trait DigitRecognizer: Send + Sync {
    /// Recognize the text in a binarized single-line patch.
    fn recognize(&self, patch: &GrayImage) -> anyhow::Result<String>;

    /// Human-readable engine name (used in logs)
    fn name(&self) -> &str;
}

/// True for a non-empty string of ASCII digits.
pub fn is_digit_string(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Engine output as a candidate digit string.
///
/// Only the trailing line terminator is dropped. Inner whitespace and line breaks
/// are kept, so two detected words never fuse into one number.
pub fn candidate_text(text: &str) -> &str {
    text.strip_suffix('\n').unwrap_or(text)
}

/// Directory the `ocrs` CLI downloads its models into.
pub fn default_model_dir() -> anyhow::Result<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("cannot locate home directory for OCR models")?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}

/// `ocrs` engine limited to the configured whitelist.
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    /// Load detection and recognition models from `model_dir`.
    pub fn load(model_dir: &Path, whitelist: &str) -> anyhow::Result<Self> {
        let detection_model_path = model_dir.join("text-detection.rten");
        let recognition_model_path = model_dir.join("text-recognition.rten");

        if !detection_model_path.exists() || !recognition_model_path.exists() {
            anyhow::bail!(
                "ocrs models missing from {}: place text-detection.rten and \
                 text-recognition.rten there, pass --model-dir, or use --engine tesseract",
                model_dir.display()
            );
        }

        let detection_model = Model::load_file(&detection_model_path)
            .with_context(|| format!("failed to load {}", detection_model_path.display()))?;
        let recognition_model = Model::load_file(&recognition_model_path)
            .with_context(|| format!("failed to load {}", recognition_model_path.display()))?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            allowed_chars: Some(whitelist.to_string()),
            ..Default::default()
        })?;

        Ok(Self { engine })
    }

    /// Load from the standard cache location
    pub fn from_default_location(whitelist: &str) -> anyhow::Result<Self> {
        Self::load(&default_model_dir()?, whitelist)
    }
}

impl DigitRecognizer for OcrsRecognizer {
    fn recognize(&self, patch: &GrayImage) -> anyhow::Result<String> {
        let img = image::DynamicImage::ImageLuma8(patch.clone()).to_rgb8();

        let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions())?;
        let ocr_input = self.engine.prepare_input(img_source)?;
        let text = self.engine.get_text(&ocr_input)?;

        Ok(candidate_text(&text).to_string())
    }

    fn name(&self) -> &str {
        "ocrs"
    }
}
