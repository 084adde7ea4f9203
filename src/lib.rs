//! Builds a single-category subset of the arXiv metadata snapshot: a mapping
//! of paper ids to title/abstract and a mapping of paper ids to topic labels.

pub mod config;
pub mod error;
pub mod filter;
pub mod local;
pub mod output;
pub mod remote;
pub mod source;

use indicatif::ProgressBar;
use log::info;

pub use config::SubsetConfig;
pub use error::{Result, SubsetError};
pub use filter::{PaperSubset, SubsetStats};
pub use source::{resolve_source, CorpusSource};

use local::open_snapshot;
use remote::CommandRunner;

/// Runs the whole pipeline: materialize the source, stream the snapshot and
/// filter it into a subset of at most `config.n_papers` papers.
pub fn create_arxiv_subset<R: CommandRunner>(
  source: &CorpusSource,
  config: &SubsetConfig,
  runner: &mut R,
  progress: &ProgressBar,
) -> Result<(PaperSubset, SubsetStats)> {
  config.validate()?;
  let snapshot = source.materialize(config, runner)?;
  let lines = open_snapshot(&snapshot)?;
  info!("selecting up to {} papers", config.n_papers);
  filter::build_subset(lines, config, progress)
}
