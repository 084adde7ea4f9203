//! Selection of single-category, allow-listed papers from snapshot lines.

use std::collections::BTreeMap;
use std::io;

use indicatif::ProgressBar;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::SubsetConfig;
use crate::error::{Result, SubsetError};

/// The fields of a snapshot line we care about. Everything else is ignored.
#[derive(Debug, Deserialize)]
struct RawRecord {
  id: Option<String>,
  categories: Option<String>,
  title: Option<String>,
  #[serde(rename = "abstract")]
  abstract_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataEntry {
  pub paper_id: String,
  pub title: Option<String>,
  #[serde(rename = "abstract")]
  pub abstract_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelEntry {
  pub topic: String,
  pub subtopic: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedPaper {
  pub metadata: MetadataEntry,
  pub label: LabelEntry,
}

impl AcceptedPaper {
  pub fn paper_id(&self) -> &str {
    &self.metadata.paper_id
  }
}

/// Why a line did not make it into the subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
  /// Not a JSON object with the expected field types, or not valid UTF-8.
  Malformed,
  MissingCategories,
  MultipleCategories,
  TopicNotAllowed,
  MissingId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
  Accepted(AcceptedPaper),
  Skipped(SkipReason),
}

/// Normalizes an arXiv id into the key used by both output mappings:
/// dots are removed and the first remaining character is dropped.
/// `0704.0001` becomes `7040001`.
pub fn derive_paper_id(arxiv_id: &str) -> String {
  arxiv_id.chars().filter(|c| *c != '.').skip(1).collect()
}

pub fn classify_line(line: &str, config: &SubsetConfig) -> RecordOutcome {
  let record: RawRecord = match serde_json::from_str(line) {
    Ok(record) => record,
    Err(_) => return RecordOutcome::Skipped(SkipReason::Malformed),
  };
  let categories = match record.categories {
    Some(categories) => categories,
    None => return RecordOutcome::Skipped(SkipReason::MissingCategories),
  };
  let mut tokens = categories.split_whitespace();
  let category = match (tokens.next(), tokens.next()) {
    (Some(category), None) => category,
    (Some(_), Some(_)) => return RecordOutcome::Skipped(SkipReason::MultipleCategories),
    (None, _) => return RecordOutcome::Skipped(SkipReason::MissingCategories),
  };
  let topic = category.split('.').next().unwrap_or(category);
  if !config.is_allowed_topic(topic) {
    return RecordOutcome::Skipped(SkipReason::TopicNotAllowed);
  }
  let paper_id = match record.id {
    Some(id) => derive_paper_id(&id),
    None => return RecordOutcome::Skipped(SkipReason::MissingId),
  };
  RecordOutcome::Accepted(AcceptedPaper {
    label: LabelEntry {
      topic: topic.to_string(),
      subtopic: category.to_string(),
    },
    metadata: MetadataEntry {
      paper_id,
      title: record.title,
      abstract_text: record.abstract_text,
    },
  })
}

/// The two derived mappings. Both are only written through `insert`, so their
/// key sets are always identical.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PaperSubset {
  metadata: BTreeMap<String, MetadataEntry>,
  labels: BTreeMap<String, LabelEntry>,
}

impl PaperSubset {
  /// Inserts or overwrites the entries for the paper's identifier.
  /// Returns true if an earlier paper with the same identifier was replaced.
  pub fn insert(&mut self, paper: AcceptedPaper) -> bool {
    let key = paper.metadata.paper_id.clone();
    let replaced = self.metadata.insert(key.clone(), paper.metadata).is_some();
    self.labels.insert(key, paper.label);
    replaced
  }

  pub fn metadata(&self) -> &BTreeMap<String, MetadataEntry> {
    &self.metadata
  }

  pub fn labels(&self) -> &BTreeMap<String, LabelEntry> {
    &self.labels
  }

  pub fn len(&self) -> usize {
    self.metadata.len()
  }

  pub fn is_empty(&self) -> bool {
    self.metadata.is_empty()
  }
}

/// Counters gathered while building a subset.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SubsetStats {
  pub requested: usize,
  /// Accepted papers, including any that overwrote an earlier identifier.
  pub accepted: usize,
  pub overwritten: usize,
  pub lines_read: usize,
  pub skipped: BTreeMap<SkipReason, usize>,
}

impl SubsetStats {
  pub fn total_skipped(&self) -> usize {
    self.skipped.values().sum()
  }
}

/// Accumulates accepted papers until the cap is hit.
#[derive(Debug)]
pub struct SubsetBuilder<'a> {
  config: &'a SubsetConfig,
  subset: PaperSubset,
  stats: SubsetStats,
}

impl<'a> SubsetBuilder<'a> {
  pub fn new(config: &'a SubsetConfig) -> Self {
    SubsetBuilder {
      config,
      subset: PaperSubset::default(),
      stats: SubsetStats {
        requested: config.n_papers,
        ..Default::default()
      },
    }
  }

  pub fn is_full(&self) -> bool {
    self.stats.accepted >= self.config.n_papers
  }

  /// Feeds one line through the filter. Returns true if the paper was accepted.
  pub fn push_line(&mut self, line: &str) -> bool {
    self.stats.lines_read += 1;
    let outcome = classify_line(line, self.config);
    self.record(outcome)
  }

  /// A line that could not even be decoded as text.
  pub fn push_undecodable(&mut self) {
    self.stats.lines_read += 1;
    self.record(RecordOutcome::Skipped(SkipReason::Malformed));
  }

  fn record(&mut self, outcome: RecordOutcome) -> bool {
    match outcome {
      RecordOutcome::Accepted(paper) => {
        let paper_id = paper.paper_id().to_string();
        if self.subset.insert(paper) {
          debug!("paper id {} overwrote an earlier entry", paper_id);
          self.stats.overwritten += 1;
        }
        self.stats.accepted += 1;
        true
      }
      RecordOutcome::Skipped(reason) => {
        debug!("skipped line {}: {:?}", self.stats.lines_read, reason);
        *self.stats.skipped.entry(reason).or_insert(0) += 1;
        false
      }
    }
  }

  pub fn finish(self) -> (PaperSubset, SubsetStats) {
    (self.subset, self.stats)
  }
}

/// Streams `lines` through the filter until `config.n_papers` papers are
/// accepted or the input runs out. No line past the one that fills the cap is
/// pulled from the iterator.
pub fn build_subset<I>(lines: I, config: &SubsetConfig, progress: &ProgressBar) -> Result<(PaperSubset, SubsetStats)>
where
  I: IntoIterator<Item = io::Result<String>>,
{
  config.validate()?;
  let mut builder = SubsetBuilder::new(config);
  for line in lines {
    match line {
      Ok(line) => {
        if builder.push_line(&line) {
          progress.inc(1);
        }
      }
      Err(e) if e.kind() == io::ErrorKind::InvalidData => builder.push_undecodable(),
      Err(e) => return Err(SubsetError::io("<snapshot stream>", e)),
    }
    if builder.is_full() {
      break;
    }
  }
  let (subset, stats) = builder.finish();
  if stats.accepted < config.n_papers {
    warn!(
      "input exhausted after {} lines with {} of {} requested papers",
      stats.lines_read, stats.accepted, config.n_papers
    );
  } else {
    info!(
      "collected {} papers after reading {} lines ({} skipped)",
      stats.accepted,
      stats.lines_read,
      stats.total_skipped()
    );
  }
  Ok((subset, stats))
}
