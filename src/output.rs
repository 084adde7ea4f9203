use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;

use crate::error::{Result, SubsetError};
use crate::filter::{PaperSubset, SubsetStats};

pub const METADATA_FILENAME: &str = "metadata.json";
pub const LABELS_FILENAME: &str = "data.json";
pub const STATS_FILENAME: &str = "subset_stats.json";

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
  #[serde(flatten)]
  stats: &'a SubsetStats,
  papers_written: usize,
  generated_at: DateTime<Utc>,
}

/// Paths of the files produced by `write_subset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenSubset {
  pub metadata: PathBuf,
  pub labels: PathBuf,
  pub stats: PathBuf,
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
  let file = File::create(path).map_err(|e| SubsetError::io(path, e))?;
  let mut writer = BufWriter::new(file);
  serde_json::to_writer_pretty(&mut writer, value)?;
  writeln!(writer).map_err(|e| SubsetError::io(path, e))?;
  writer.flush().map_err(|e| SubsetError::io(path, e))
}

/// Writes `metadata.json`, `data.json` and `subset_stats.json` into `output_dir`,
/// creating the directory if needed.
pub fn write_subset(subset: &PaperSubset, stats: &SubsetStats, output_dir: impl AsRef<Path>) -> Result<WrittenSubset> {
  let output_dir = output_dir.as_ref();
  fs::create_dir_all(output_dir).map_err(|e| SubsetError::io(output_dir, e))?;
  let written = WrittenSubset {
    metadata: output_dir.join(METADATA_FILENAME),
    labels: output_dir.join(LABELS_FILENAME),
    stats: output_dir.join(STATS_FILENAME),
  };
  write_json(&written.metadata, subset.metadata())?;
  write_json(&written.labels, subset.labels())?;
  let summary = RunSummary {
    stats,
    papers_written: subset.len(),
    generated_at: Utc::now(),
  };
  write_json(&written.stats, &summary)?;
  info!(
    "wrote {} papers to {} and {}",
    subset.len(),
    written.metadata.display(),
    written.labels.display()
  );
  Ok(written)
}
