use std::path::PathBuf;

use log::info;

use crate::config::SubsetConfig;
use crate::error::{Result, SubsetError};
use crate::local::snapshot_path;
use crate::remote::{download_snapshot, CommandRunner, KaggleCredentials};

/// Where the raw corpus comes from. Exactly one source per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusSource {
  /// A directory holding a pre-downloaded snapshot.
  Local(PathBuf),
  /// A `kaggle.json` credential file used to download the snapshot.
  Kaggle(PathBuf),
}

/// Picks the corpus source without touching the filesystem.
pub fn resolve_source(data_dir: Option<PathBuf>, kaggle_credentials: Option<PathBuf>) -> Result<CorpusSource> {
  match (data_dir, kaggle_credentials) {
    (None, None) => Err(SubsetError::Configuration(
      "no corpus source given: pass a local data directory holding the arXiv snapshot, \
       or a kaggle.json credential file to download it"
        .to_string(),
    )),
    (Some(_), Some(_)) => Err(SubsetError::Configuration(
      "both a local data directory and kaggle credentials were given, only one source may be used"
        .to_string(),
    )),
    (Some(dir), None) => Ok(CorpusSource::Local(dir)),
    (None, Some(credentials)) => Ok(CorpusSource::Kaggle(credentials)),
  }
}

impl CorpusSource {
  /// Makes the snapshot available and returns its path. For a Kaggle source
  /// this loads the credentials and runs the download sequence.
  pub fn materialize<R: CommandRunner>(&self, config: &SubsetConfig, runner: &mut R) -> Result<PathBuf> {
    match self {
      CorpusSource::Local(dir) => Ok(snapshot_path(dir, &config.snapshot_filename)),
      CorpusSource::Kaggle(credentials_path) => {
        let credentials = KaggleCredentials::load(credentials_path)?;
        info!(
          "downloading {} from kaggle as user {}",
          config.dataset, credentials.username
        );
        download_snapshot(runner, &credentials, config)
      }
    }
  }
}
