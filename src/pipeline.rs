use anyhow::{Context, Result};
use image::GrayImage;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use tracing::{info, info_span, warn};

use crate::config::ExtractionConfig;
use crate::detection::BadgeExtractor;
use crate::filter::StreamFilter;
use crate::models::{CascadeStage, ImageExtraction};

/// Image extensions considered part of a group
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Debug output settings: every cascade variant is written as a PNG.
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

impl DebugConfig {
    /// The directory must be empty or non-existent
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self { output_dir })
    }

    /// Path of one variant, e.g. `1_3.png/02-square_dilate.png`
    pub fn variant_path(&self, image_label: &str, region_index: usize, stage: CascadeStage) -> PathBuf {
        self.output_dir
            .join(image_label)
            .join(format!("{:02}-{}.png", region_index + 1, stage))
    }

    pub fn save_variant(
        &self,
        image_label: &str,
        region_index: usize,
        stage: CascadeStage,
        variant: &GrayImage,
    ) -> Result<()> {
        let path = self.variant_path(image_label, region_index, stage);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        variant
            .save(&path)
            .with_context(|| format!("Failed to save debug image {}", path.display()))?;
        Ok(())
    }
}

/// Shared flag checked between images and between regions.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Context available to every extraction
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
    pub cancel: CancellationToken,
}

/// Digit runs that make up the natural sort key
const DIGIT_RUNS: &str = r"\d+";

/// Sort key made of every digit run in a file name, so `1_2.png` sorts before `1_10.png`.
pub fn natural_key(digits: &Regex, file_name: &str) -> Vec<u64> {
    digits
        .find_iter(file_name)
        .map(|m| m.as_str().parse().unwrap_or(u64::MAX))
        .collect()
}

/// Image files of `group_id` in `image_dir` (`{group_id}_*.png|jpg|jpeg`), in natural order.
pub fn discover_group_files(image_dir: &Path, group_id: u32) -> Result<Vec<PathBuf>> {
    let prefix = format!("{}_", group_id);
    let digits = Regex::new(DIGIT_RUNS)?;
    let entries = std::fs::read_dir(image_dir)
        .with_context(|| format!("Directory not found at {}", image_dir.display()))?;

    let mut files: Vec<(Vec<u64>, PathBuf)> = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));

        if is_image && name.starts_with(&prefix) {
            files.push((natural_key(&digits, name), path.clone()));
        }
    }

    files.sort();
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Numbers extracted for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupResult {
    pub group_id: u32,
    /// Concatenated per-image readings, in file order
    pub raw: Vec<u32>,
    /// `raw` after outlier filtering
    pub clean: Vec<u32>,
    pub rejected: usize,
    pub images: usize,
    pub cancelled: bool,
}

/// Bounded worker pool over a group's images.
///
/// Jobs go out through an MPSC channel tagged with their file index; results are
/// resequenced by that index so the stream keeps file order however the workers
/// interleave.
pub struct PipelineExecutor<'a> {
    extractor: &'a BadgeExtractor,
    context: &'a PipelineContext,
    workers: usize,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(extractor: &'a BadgeExtractor, context: &'a PipelineContext, workers: usize) -> Self {
        Self {
            extractor,
            context,
            workers: workers.max(1),
        }
    }

    /// Extract every file; slot `i` of the result belongs to `files[i]`.
    ///
    /// Files not reached because of cancellation are `None`.
    pub fn execute(&self, files: &[PathBuf]) -> Vec<Option<ImageExtraction>> {
        let (job_sender, job_receiver) = mpsc::channel::<(usize, &Path)>();
        for (index, path) in files.iter().enumerate() {
            // The receiver is alive until this function returns
            let _ = job_sender.send((index, path.as_path()));
        }
        drop(job_sender);

        let job_receiver = Mutex::new(job_receiver);
        let (result_sender, result_receiver) = mpsc::channel::<(usize, ImageExtraction)>();

        std::thread::scope(|scope| {
            for _ in 0..self.workers.min(files.len()) {
                let result_sender = result_sender.clone();
                let job_receiver = &job_receiver;

                scope.spawn(move || {
                    loop {
                        // Lock only for the receive, not the extraction
                        let job = match job_receiver.lock() {
                            Ok(receiver) => receiver.recv(),
                            Err(_) => break,
                        };
                        let Ok((index, path)) = job else {
                            break;
                        };
                        if self.context.cancel.is_cancelled() {
                            break;
                        }

                        let extraction = self.extractor.extract_file(path, self.context);
                        if result_sender.send((index, extraction)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_sender);

        let mut ordered: Vec<Option<ImageExtraction>> = vec![None; files.len()];
        for (index, extraction) in result_receiver {
            ordered[index] = Some(extraction);
        }
        ordered
    }
}

/// Extract, concatenate and filter the images of one group.
pub struct GroupPipeline {
    extractor: BadgeExtractor,
    filter: StreamFilter,
    workers: usize,
    context: PipelineContext,
}

impl GroupPipeline {
    pub fn new(extractor: BadgeExtractor, config: &ExtractionConfig) -> Self {
        Self {
            extractor,
            filter: StreamFilter::new(config.filter.ceiling),
            workers: config.effective_workers(),
            context: PipelineContext::default(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Enable debug mode with output directory
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        self.context.debug = Some(DebugConfig::new(output_dir)?);
        Ok(self)
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.context.cancel = cancel;
        self
    }

    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    pub fn extractor(&self) -> &BadgeExtractor {
        &self.extractor
    }

    /// Run over files already in group order.
    pub fn run_files(&self, group_id: u32, files: &[PathBuf]) -> GroupResult {
        let _span = info_span!("group", group_id).entered();
        info!(images = files.len(), workers = self.workers, "extracting group");

        let executor = PipelineExecutor::new(&self.extractor, &self.context, self.workers);
        let per_image = executor.execute(files);

        // Unreached images and images stopped between regions both truncate the stream
        let cancelled = per_image
            .iter()
            .any(|extraction| !extraction.as_ref().is_some_and(|e| e.complete));
        let raw: Vec<u32> = per_image.iter().flatten().flat_map(ImageExtraction::values).collect();

        if cancelled {
            warn!("group extraction cancelled, stream is incomplete");
        }

        let (clean, rejected) = self.filter.apply(&raw);
        info!(raw = raw.len(), clean = clean.len(), rejected, "group filtered");

        GroupResult {
            group_id,
            raw,
            clean,
            rejected,
            images: files.len(),
            cancelled,
        }
    }

    /// Discover the group's files in `image_dir` and run over them.
    pub fn run(&self, group_id: u32, image_dir: &Path) -> Result<GroupResult> {
        let files = discover_group_files(image_dir, group_id)?;
        if files.is_empty() {
            info!(group_id, dir = %image_dir.display(), "no image files found for group");
        }
        Ok(self.run_files(group_id, &files))
    }
}
