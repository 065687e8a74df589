pub mod config;
pub mod detection;
pub mod error;
pub mod filter;
pub mod models;
pub mod pipeline;
pub mod storage;

pub use config::ExtractionConfig;
pub use detection::{detect, BadgeExtractor, RegionDetector, RegionReader};
pub use detection::ocr::{DigitRecognizer, OcrsRecognizer};
pub use detection::tesseract::TesseractRecognizer;
pub use error::ConfigError;
pub use filter::{filter_outliers, StreamFilter};
pub use models::{CascadeStage, ExtractedNumber, ImageExtraction, ReadOutcome, Region};
pub use pipeline::{
    discover_group_files, CancellationToken, DebugConfig, GroupPipeline, GroupResult,
    PipelineContext, PipelineExecutor,
};
pub use storage::write_group_csv;

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence; otherwise `default_level` applies.
pub fn init_tracing(default_level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
