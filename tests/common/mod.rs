#![allow(dead_code, unused_imports)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from badgescan for tests
pub use badgescan::{
    BadgeExtractor, CascadeStage, DigitRecognizer, ExtractionConfig, PipelineContext,
    ReadOutcome, Region, RegionReader,
};
