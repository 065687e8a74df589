//! CSV output for a group's cleaned numbers.
//!
//! One file per group, named `{group_id}.csv`, with a `group_id,number` header
//! and one row per number. Writing a group always replaces its previous file.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

/// CSV header row, as derived from [`GroupRow`].
pub const CSV_HEADER: &str = "group_id,number";

/// One row of a group CSV file.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct GroupRow {
    pub group_id: u32,
    pub number: u32,
}

/// Path of the CSV file for `group_id` inside `output_dir`.
pub fn group_csv_path(output_dir: &Path, group_id: u32) -> PathBuf {
    output_dir.join(format!("{}.csv", group_id))
}

/// Write (or overwrite) the group's CSV file and return its path.
pub fn write_group_csv(output_dir: &Path, group_id: u32, numbers: &[u32]) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let path = group_csv_path(output_dir, group_id);
    let file = File::create(&path).context("Failed to create CSV file")?;
    let mut wtr = csv::Writer::from_writer(file);

    if numbers.is_empty() {
        // Serializing rows emits the header; an empty group still gets one
        wtr.write_record(["group_id", "number"])
            .context("Failed to write CSV header")?;
    }
    for &number in numbers {
        wtr.serialize(GroupRow { group_id, number })
            .context("Failed to write CSV row")?;
    }
    wtr.flush().context("Failed to flush CSV file")?;

    info!(group_id, rows = numbers.len(), path = %path.display(), "group CSV written");
    Ok(path)
}
