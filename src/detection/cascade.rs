//! OCR cascade.
//!
//! A binarized ROI is handed to an ordered list of preprocessing strategies.
//! Each strategy derives its variant from the same binarized input, the variant
//! is recognized, and the first all-digit result ends the cascade. Later
//! strategies reinforce strokes more aggressively and only run when the earlier,
//! cleaner reads fail.

use image::GrayImage;
use imageproc::morphology::Mask;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, warn};

use super::ocr::{is_digit_string, DigitRecognizer};
use super::preprocessing::{cross_kernel, dilate, rect_kernel};
use crate::config::{KernelSize, ReaderConfig};
use crate::models::{CascadeStage, ReadOutcome};

/// One preprocessing variant tried by the cascade.
pub trait PreprocessStrategy: Send + Sync {
    /// Derive the OCR input from the binarized ROI.
    fn prepare<'a>(&self, binary: &'a GrayImage) -> Cow<'a, GrayImage>;

    fn stage(&self) -> CascadeStage;
}

/// The binarized ROI as is.
pub struct PlainStrategy;

impl PreprocessStrategy for PlainStrategy {
    fn prepare<'a>(&self, binary: &'a GrayImage) -> Cow<'a, GrayImage> {
        Cow::Borrowed(binary)
    }

    fn stage(&self) -> CascadeStage {
        CascadeStage::Plain
    }
}

/// A single dilation pass with a fixed structuring element.
pub struct DilateStrategy {
    stage: CascadeStage,
    kernel: Mask,
}

impl DilateStrategy {
    pub fn square(size: KernelSize) -> Self {
        Self {
            stage: CascadeStage::SquareDilate,
            kernel: rect_kernel(size),
        }
    }

    pub fn cross(size: KernelSize) -> Self {
        Self {
            stage: CascadeStage::CrossDilate,
            kernel: cross_kernel(size),
        }
    }
}

impl PreprocessStrategy for DilateStrategy {
    fn prepare<'a>(&self, binary: &'a GrayImage) -> Cow<'a, GrayImage> {
        Cow::Owned(dilate(binary, &self.kernel))
    }

    fn stage(&self) -> CascadeStage {
        self.stage
    }
}

/// Ordered strategies with early exit on the first accepted read.
pub struct OcrCascade {
    strategies: Vec<Arc<dyn PreprocessStrategy>>,
}

impl OcrCascade {
    /// Create an empty cascade
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Plain read, then square dilation, then cross dilation.
    pub fn from_config(config: &ReaderConfig) -> Self {
        Self::new()
            .add_strategy(Arc::new(PlainStrategy))
            .add_strategy(Arc::new(DilateStrategy::square(config.square_dilate_kernel)))
            .add_strategy(Arc::new(DilateStrategy::cross(config.cross_dilate_kernel)))
    }

    pub fn add_strategy(mut self, strategy: Arc<dyn PreprocessStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn stages(&self) -> Vec<CascadeStage> {
        self.strategies.iter().map(|s| s.stage()).collect()
    }

    pub fn run(&self, binary: &GrayImage, recognizer: &dyn DigitRecognizer) -> ReadOutcome {
        self.run_with(binary, recognizer, &mut |_, _| {})
    }

    /// Run the cascade, passing every variant to `inspect` before it is recognized.
    pub fn run_with(
        &self,
        binary: &GrayImage,
        recognizer: &dyn DigitRecognizer,
        inspect: &mut dyn FnMut(CascadeStage, &GrayImage),
    ) -> ReadOutcome {
        let mut attempts = 0;

        for strategy in &self.strategies {
            let stage = strategy.stage();
            let variant = strategy.prepare(binary);
            inspect(stage, &variant);

            attempts += 1;
            let text = match recognizer.recognize(&variant) {
                Ok(text) => text,
                Err(e) => {
                    warn!(%stage, engine = recognizer.name(), error = %e, "OCR attempt failed");
                    continue;
                }
            };
            let text = text.trim();
            debug!(%stage, text, "OCR attempt");

            if !is_digit_string(text) {
                continue;
            }

            return match text.parse::<u32>() {
                Ok(value) => ReadOutcome::Accepted {
                    value,
                    stage,
                    attempts,
                },
                Err(e) => {
                    warn!(%stage, text, error = %e, "digit string does not fit a number");
                    ReadOutcome::Discarded { attempts }
                }
            };
        }

        ReadOutcome::Discarded { attempts }
    }
}

impl Default for OcrCascade {
    fn default() -> Self {
        Self::from_config(&ReaderConfig::default())
    }
}
