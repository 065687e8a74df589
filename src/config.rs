//! Extraction settings.
//!
//! Every threshold the pipeline uses lives here and is passed explicitly into
//! the detector, reader and stream filter. Settings load from a JSON file where
//! any omitted field keeps its default, so a config may override a single value.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Largest hue value in the 0-179 hue scale.
pub const MAX_HUE: u8 = 179;

/// A hue/saturation/value triple. Hue uses the 0-179 scale, the rest 0-255.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

/// Inclusive HSV bounds a pixel must fall within to count as badge color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: Hsv,
    pub upper: Hsv,
}

impl HsvRange {
    pub fn contains(&self, px: Hsv) -> bool {
        (self.lower.h..=self.upper.h).contains(&px.h)
            && (self.lower.s..=self.upper.s).contains(&px.s)
            && (self.lower.v..=self.upper.v).contains(&px.v)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let channels = [
            ("hue", self.lower.h, self.upper.h),
            ("saturation", self.lower.s, self.upper.s),
            ("value", self.lower.v, self.upper.v),
        ];
        for (channel, lower, upper) in channels {
            if lower > upper {
                return Err(ConfigError::InvertedColorRange { channel, lower, upper });
            }
        }
        if self.upper.h > MAX_HUE {
            return Err(ConfigError::HueOutOfRange { value: self.upper.h });
        }
        Ok(())
    }
}

impl Default for HsvRange {
    /// Yellow-orange badge band.
    fn default() -> Self {
        Self {
            lower: Hsv::new(20, 40, 150),
            upper: Hsv::new(30, 255, 255),
        }
    }
}

/// Structuring element extent in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelSize {
    pub width: u8,
    pub height: u8,
}

impl KernelSize {
    pub const fn square(side: u8) -> Self {
        Self { width: side, height: side }
    }

    fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyKernel {
                name,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Color segmentation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub color_range: HsvRange,
    /// Components with fewer pixels than this are treated as noise.
    pub min_area: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            color_range: HsvRange::default(),
            min_area: 100,
        }
    }
}

/// ROI normalization and OCR cascade parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Pixels added on every side of a region before cropping.
    pub padding: u32,
    /// Height the ROI is resized to before binarization.
    pub target_height: u32,
    pub blackhat_kernel: KernelSize,
    pub square_dilate_kernel: KernelSize,
    pub cross_dilate_kernel: KernelSize,
    /// Characters the OCR engine may emit.
    pub digit_whitelist: String,
    /// Upper bound for a single OCR call, for engines that support one.
    pub ocr_timeout_ms: Option<u64>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            padding: 5,
            target_height: 100,
            blackhat_kernel: KernelSize::square(20),
            square_dilate_kernel: KernelSize::square(3),
            cross_dilate_kernel: KernelSize::square(5),
            digit_whitelist: "0123456789".to_string(),
            ocr_timeout_ms: None,
        }
    }
}

/// Stream sanitization parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Readings at or above this value are treated as noise.
    pub ceiling: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { ceiling: 40_000 }
    }
}

/// Complete extraction configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub detector: DetectorConfig,
    pub reader: ReaderConfig,
    pub filter: FilterConfig,
    /// Worker threads for group extraction. `None` uses available parallelism.
    pub workers: Option<usize>,
}

impl ExtractionConfig {
    /// Loads and validates a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.color_range.validate()?;
        if self.detector.min_area == 0 {
            return Err(ConfigError::NotPositive { name: "detector.min_area" });
        }

        let reader = &self.reader;
        if reader.target_height == 0 {
            return Err(ConfigError::NotPositive { name: "reader.target_height" });
        }
        reader.blackhat_kernel.validate("blackhat_kernel")?;
        reader.square_dilate_kernel.validate("square_dilate_kernel")?;
        reader.cross_dilate_kernel.validate("cross_dilate_kernel")?;
        if reader.digit_whitelist.is_empty() {
            return Err(ConfigError::EmptyWhitelist);
        }
        if let Some(found) = reader.digit_whitelist.chars().find(|c| !c.is_ascii_digit()) {
            return Err(ConfigError::NonDigitWhitelist { found });
        }
        if reader.ocr_timeout_ms == Some(0) {
            return Err(ConfigError::NotPositive { name: "reader.ocr_timeout_ms" });
        }

        if self.filter.ceiling == 0 {
            return Err(ConfigError::NotPositive { name: "filter.ceiling" });
        }
        if self.workers == Some(0) {
            return Err(ConfigError::NotPositive { name: "workers" });
        }
        Ok(())
    }

    /// Number of worker threads to use for a group.
    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
