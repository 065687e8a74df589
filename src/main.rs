use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use badgescan::{
    BadgeExtractor, DigitRecognizer, ExtractionConfig, GroupPipeline, OcrsRecognizer,
    PipelineContext, TesseractRecognizer,
};

#[derive(Parser)]
#[command(name = "badgescan")]
#[command(about = "Read the numbers printed on colored badges in screenshots")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the numbers found in one image
    Image {
        /// Path to input image file
        #[arg(value_name = "IMAGE")]
        image_path: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Extract a group of images and write `<GROUP_ID>.csv`
    Group {
        /// Numeric group identifier; files are named `<GROUP_ID>_<n>.png`
        #[arg(value_name = "GROUP_ID")]
        group_id: u32,

        /// Directory containing the group's images
        #[arg(long, value_name = "DIR")]
        images: PathBuf,

        /// Directory the CSV file is written to
        #[arg(long, value_name = "DIR")]
        out: PathBuf,

        /// Worker threads (default: available parallelism)
        #[arg(long)]
        workers: Option<usize>,

        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// JSON config file; omitted fields keep their defaults
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// OCR engine
    #[arg(long, value_enum, default_value_t = Engine::Ocrs)]
    engine: Engine,

    /// Directory holding the ocrs models (default: ~/.cache/ocrs)
    #[arg(long, value_name = "DIR")]
    model_dir: Option<PathBuf>,

    /// Save every cascade variant to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Engine {
    Ocrs,
    Tesseract,
}

impl CommonArgs {
    fn load_config(&self) -> anyhow::Result<ExtractionConfig> {
        match &self.config {
            Some(path) => Ok(ExtractionConfig::load(path)?),
            None => {
                let config = ExtractionConfig::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    fn recognizer(&self, config: &ExtractionConfig) -> anyhow::Result<Arc<dyn DigitRecognizer>> {
        let whitelist = &config.reader.digit_whitelist;
        let recognizer: Arc<dyn DigitRecognizer> = match self.engine {
            Engine::Ocrs => match &self.model_dir {
                Some(dir) => Arc::new(OcrsRecognizer::load(dir, whitelist)?),
                None => Arc::new(OcrsRecognizer::from_default_location(whitelist)?),
            },
            Engine::Tesseract => {
                let timeout = config.reader.ocr_timeout_ms.map(Duration::from_millis);
                Arc::new(TesseractRecognizer::locate(whitelist, timeout)?)
            }
        };
        Ok(recognizer)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    match args.command {
        Command::Image { image_path, common } => {
            badgescan::init_tracing(if common.verbose { "debug" } else { "info" });

            let config = common.load_config()?;
            let extractor = BadgeExtractor::from_config(&config, common.recognizer(&config)?);

            let mut context = PipelineContext::default();
            if let Some(dir) = common.debug_out.clone() {
                context.debug = Some(badgescan::DebugConfig::new(dir)?);
            }

            let img = image::open(&image_path)
                .with_context(|| format!("Failed to decode image {}", image_path.display()))?
                .to_rgb8();
            let label = image_path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());

            let extraction = extractor.extract(&img, &label, &context);
            for value in extraction.values() {
                println!("{}", value);
            }
        }
        Command::Group {
            group_id,
            images,
            out,
            workers,
            common,
        } => {
            badgescan::init_tracing(if common.verbose { "debug" } else { "info" });

            let mut config = common.load_config()?;
            if workers.is_some() {
                config.workers = workers;
                config.validate()?;
            }
            let extractor = BadgeExtractor::from_config(&config, common.recognizer(&config)?);

            let mut pipeline = GroupPipeline::new(extractor, &config);
            if let Some(dir) = common.debug_out.clone() {
                pipeline = pipeline.with_debug(dir)?;
            }

            let result = pipeline.run(group_id, &images)?;
            if result.images == 0 {
                return Ok(());
            }
            if result.raw.is_empty() {
                tracing::warn!(group_id, "no numbers were extracted for group");
                return Ok(());
            }

            let path = badgescan::write_group_csv(&out, group_id, &result.clean)?;
            println!(
                "Group {} data has been saved to {} ({} numbers, {} outliers removed)",
                group_id,
                path.display(),
                result.clean.len(),
                result.rejected
            );
        }
    }

    Ok(())
}
