pub mod cascade;
pub mod color;
pub mod contours;
pub mod ocr;
pub mod preprocessing;
pub mod tesseract;

use image::{GrayImage, RgbImage};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn};

use crate::config::{DetectorConfig, ExtractionConfig, HsvRange, KernelSize, ReaderConfig};
use crate::models::{CascadeStage, ExtractedNumber, ImageExtraction, ReadOutcome, Region};
use crate::pipeline::PipelineContext;
use cascade::OcrCascade;
use ocr::DigitRecognizer;

/// Badge regions of `img` whose color lies in `range`, in reading order.
pub fn detect(img: &RgbImage, range: &HsvRange, min_area: u32) -> Vec<Region> {
    let mask = color::color_mask(img, range);
    contours::find_regions(&mask, min_area)
}

/// Locates badge candidates by color segmentation.
#[derive(Debug, Clone)]
pub struct RegionDetector {
    config: DetectorConfig,
}

impl RegionDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, img: &RgbImage) -> Vec<Region> {
        detect(img, &self.config.color_range, self.config.min_area)
    }

    /// The color mask the detector segments (for debugging)
    pub fn mask(&self, img: &RgbImage) -> GrayImage {
        color::color_mask(img, &self.config.color_range)
    }
}

/// Reads the number printed inside one region.
pub struct RegionReader {
    padding: u32,
    target_height: u32,
    blackhat_kernel: KernelSize,
    cascade: OcrCascade,
    recognizer: Arc<dyn DigitRecognizer>,
}

impl RegionReader {
    pub fn new(config: &ReaderConfig, recognizer: Arc<dyn DigitRecognizer>) -> Self {
        Self {
            padding: config.padding,
            target_height: config.target_height,
            blackhat_kernel: config.blackhat_kernel,
            cascade: OcrCascade::from_config(config),
            recognizer,
        }
    }

    /// Replace the default three-stage cascade
    pub fn with_cascade(mut self, cascade: OcrCascade) -> Self {
        self.cascade = cascade;
        self
    }

    pub fn read(&self, img: &RgbImage, region: &Region) -> ReadOutcome {
        self.read_with(img, region, &mut |_, _| {})
    }

    /// Read a region, passing every cascade variant to `inspect`.
    pub fn read_with(
        &self,
        img: &RgbImage,
        region: &Region,
        inspect: &mut dyn FnMut(CascadeStage, &GrayImage),
    ) -> ReadOutcome {
        let Some(roi) = preprocessing::crop_roi(img, region, self.padding) else {
            return ReadOutcome::Skipped;
        };

        let binary = preprocessing::normalize_roi(&roi, self.target_height, self.blackhat_kernel);
        self.cascade.run_with(&binary, self.recognizer.as_ref(), inspect)
    }
}

/// Detects and reads every badge of an image.
pub struct BadgeExtractor {
    detector: RegionDetector,
    reader: RegionReader,
}

impl BadgeExtractor {
    pub fn new(detector: RegionDetector, reader: RegionReader) -> Self {
        Self { detector, reader }
    }

    pub fn from_config(config: &ExtractionConfig, recognizer: Arc<dyn DigitRecognizer>) -> Self {
        Self::new(
            RegionDetector::new(config.detector.clone()),
            RegionReader::new(&config.reader, recognizer),
        )
    }

    pub fn detector(&self) -> &RegionDetector {
        &self.detector
    }

    pub fn reader(&self) -> &RegionReader {
        &self.reader
    }

    /// Numbers of one decoded image in reading order.
    ///
    /// `label` names the image in logs and debug output. The result is marked
    /// incomplete when cancellation stops it before the last region.
    pub fn extract(&self, img: &RgbImage, label: &str, context: &PipelineContext) -> ImageExtraction {
        let regions = self.detector.detect(img);
        debug!(image = label, regions = regions.len(), "detected badge regions");

        let mut numbers = Vec::new();

        for (index, region) in regions.iter().enumerate() {
            if context.cancel.is_cancelled() {
                info!(image = label, remaining = regions.len() - index, "extraction cancelled");
                return ImageExtraction {
                    numbers,
                    complete: false,
                };
            }

            let outcome = self.reader.read_with(img, region, &mut |stage, variant| {
                if let Some(debug_config) = &context.debug {
                    if let Err(e) = debug_config.save_variant(label, index, stage, variant) {
                        warn!(image = label, region = index, error = %e, "failed to save debug image");
                    }
                }
            });

            match outcome {
                ReadOutcome::Accepted { value, stage, attempts } => {
                    debug!(image = label, region = index, value, %stage, attempts, "badge read");
                    numbers.push(ExtractedNumber {
                        region_index: index,
                        value,
                    });
                }
                ReadOutcome::Discarded { attempts } => {
                    info!(image = label, region = index, attempts, "badge unreadable, discarded");
                }
                ReadOutcome::Skipped => {
                    warn!(image = label, region = index, ?region, "empty region crop, skipped");
                }
            }
        }

        info!(
            image = label,
            regions = regions.len(),
            numbers = numbers.len(),
            "image extracted"
        );
        ImageExtraction {
            numbers,
            complete: true,
        }
    }

    /// Decode and extract one image file.
    ///
    /// A file that cannot be decoded yields no numbers.
    pub fn extract_file(&self, path: &Path, context: &PipelineContext) -> ImageExtraction {
        // Full file name: `1_1.png` and `1_1.jpg` get separate debug folders
        let label = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let _span = info_span!("image", path = %path.display()).entered();

        let img = match image::open(path) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                warn!(error = %e, "could not load image, skipping");
                return ImageExtraction {
                    numbers: Vec::new(),
                    complete: true,
                };
            }
        };

        self.extract(&img, &label, context)
    }
}
