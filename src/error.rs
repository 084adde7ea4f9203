use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors that abort a subset run. Per-record problems never surface here,
/// they are reported as a `SkipReason` instead.
#[derive(Debug, Error)]
pub enum SubsetError {
  #[error("configuration error: {0}")]
  Configuration(String),
  #[error("kaggle credentials at '{path}' are unusable: {reason}")]
  Credentials { path: PathBuf, reason: String },
  #[error("external step '{step}' could not be started: {source}")]
  Spawn {
    step: String,
    #[source]
    source: io::Error,
  },
  #[error("external step '{step}' failed with {status}")]
  ExternalTool { step: String, status: ExitStatus },
  #[error("i/o failure on '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

impl SubsetError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
    SubsetError::Io {
      path: path.into(),
      source,
    }
  }
}

pub type Result<T> = std::result::Result<T, SubsetError>;
