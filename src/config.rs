use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, SubsetError};

/// Name of the arXiv metadata snapshot, both inside a local data directory
/// and as extracted from the Kaggle archive.
pub const SNAPSHOT_FILENAME: &str = "arxiv-metadata-oai-snapshot.json";
/// Top-level arXiv categories admitted into the subset.
pub const ALLOWED_TOPICS: [&str; 6] = ["astro-ph", "cs", "math", "physics", "q-bio", "stat"];
pub const DEFAULT_N_PAPERS: usize = 50_000;
pub const DEFAULT_DATASET: &str = "Cornell-University/arxiv";

lazy_static! {
  static ref DATASET_REGEX: Regex = Regex::new("^([A-Za-z0-9][A-Za-z0-9_-]*)/([A-Za-z0-9][A-Za-z0-9_.-]*)$").unwrap();
}

/// A Kaggle dataset handle in `owner/slug` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetHandle {
  owner: String,
  slug: String,
}

impl DatasetHandle {
  pub fn owner(&self) -> &str {
    &self.owner
  }

  pub fn slug(&self) -> &str {
    &self.slug
  }

  /// `kaggle datasets download` saves the archive as `<slug>.zip`.
  pub fn archive_name(&self) -> String {
    format!("{}.zip", self.slug)
  }
}

impl FromStr for DatasetHandle {
  type Err = SubsetError;

  fn from_str(handle: &str) -> Result<Self> {
    let cap = DATASET_REGEX.captures(handle.trim()).ok_or_else(|| {
      SubsetError::Configuration(format!(
        "dataset handle '{}' is not of the form owner/slug",
        handle
      ))
    })?;
    Ok(DatasetHandle {
      owner: cap[1].to_string(),
      slug: cap[2].to_string(),
    })
  }
}

impl fmt::Display for DatasetHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.owner, self.slug)
  }
}

impl Default for DatasetHandle {
  fn default() -> Self {
    DatasetHandle {
      owner: "Cornell-University".to_string(),
      slug: "arxiv".to_string(),
    }
  }
}

/// Everything a subset run needs besides the corpus source itself.
#[derive(Debug, Clone)]
pub struct SubsetConfig {
  /// Stop after this many accepted papers.
  pub n_papers: usize,
  pub allowed_topics: Vec<String>,
  pub snapshot_filename: String,
  pub dataset: DatasetHandle,
  /// Working directory for the kaggle/unzip steps.
  pub download_dir: PathBuf,
}

impl Default for SubsetConfig {
  fn default() -> Self {
    SubsetConfig {
      n_papers: DEFAULT_N_PAPERS,
      allowed_topics: ALLOWED_TOPICS.iter().map(|t| t.to_string()).collect(),
      snapshot_filename: SNAPSHOT_FILENAME.to_string(),
      dataset: DatasetHandle::default(),
      download_dir: PathBuf::from("."),
    }
  }
}

impl SubsetConfig {
  pub fn new(n_papers: usize) -> Self {
    SubsetConfig {
      n_papers,
      ..Default::default()
    }
  }

  pub fn with_dataset(mut self, dataset: DatasetHandle) -> Self {
    self.dataset = dataset;
    self
  }

  pub fn with_download_dir(mut self, dir: impl AsRef<Path>) -> Self {
    self.download_dir = dir.as_ref().to_path_buf();
    self
  }

  pub fn with_allowed_topics<I, S>(mut self, topics: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.allowed_topics = topics.into_iter().map(Into::into).collect();
    self
  }

  pub fn validate(&self) -> Result<()> {
    if self.n_papers == 0 {
      return Err(SubsetError::Configuration(
        "n_papers must be a positive integer".to_string(),
      ));
    }
    if self.allowed_topics.is_empty() {
      return Err(SubsetError::Configuration(
        "the topic allow-list is empty, no paper could ever be accepted".to_string(),
      ));
    }
    if self.snapshot_filename.is_empty() {
      return Err(SubsetError::Configuration(
        "snapshot filename must not be empty".to_string(),
      ));
    }
    Ok(())
  }

  pub fn is_allowed_topic(&self, topic: &str) -> bool {
    self.allowed_topics.iter().any(|allowed| allowed == topic)
  }
}
