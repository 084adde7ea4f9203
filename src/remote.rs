//! Acquisition of the snapshot through the Kaggle command-line tool.
//!
//! The download is an explicit sequence of external steps (configure the
//! username, configure the key, download the dataset archive, unzip it).
//! Each step's exit status is checked and the first failure aborts the run.
//! There is no retry.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use log::info;
use serde::Deserialize;

use crate::config::SubsetConfig;
use crate::error::{Result, SubsetError};

const KAGGLE_BIN: &str = "kaggle";
const UNZIP_BIN: &str = "unzip";
const REDACTED: &str = "********";

/// Contents of a `kaggle.json` API token file.
#[derive(Clone, Deserialize)]
pub struct KaggleCredentials {
  pub username: String,
  pub key: String,
}

impl fmt::Debug for KaggleCredentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("KaggleCredentials")
      .field("username", &self.username)
      .field("key", &REDACTED)
      .finish()
  }
}

impl KaggleCredentials {
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let credentials_error = |reason: String| SubsetError::Credentials {
      path: path.to_path_buf(),
      reason,
    };
    let payload = fs::read_to_string(path).map_err(|e| credentials_error(e.to_string()))?;
    let credentials: KaggleCredentials =
      serde_json::from_str(&payload).map_err(|e| credentials_error(e.to_string()))?;
    if credentials.username.trim().is_empty() {
      return Err(credentials_error("field `username` is empty".to_string()));
    }
    if credentials.key.trim().is_empty() {
      return Err(credentials_error("field `key` is empty".to_string()));
    }
    Ok(credentials)
  }
}

/// One external command in the acquisition sequence.
#[derive(Clone, PartialEq, Eq)]
pub struct ToolStep {
  pub name: &'static str,
  pub program: String,
  pub args: Vec<String>,
  /// Index into `args` of a value that must never be printed.
  secret_arg: Option<usize>,
}

impl ToolStep {
  fn new(name: &'static str, program: &str, args: &[&str]) -> Self {
    ToolStep {
      name,
      program: program.to_string(),
      args: args.iter().map(|a| a.to_string()).collect(),
      secret_arg: None,
    }
  }

  fn with_secret_arg(mut self, index: usize) -> Self {
    self.secret_arg = Some(index);
    self
  }

  /// The command line with any secret argument masked.
  pub fn display(&self) -> String {
    let mut shown = vec![self.program.as_str()];
    for (i, arg) in self.args.iter().enumerate() {
      if self.secret_arg == Some(i) {
        shown.push(REDACTED);
      } else {
        shown.push(arg.as_str());
      }
    }
    shown.join(" ")
  }
}

impl fmt::Debug for ToolStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ToolStep({}: {})", self.name, self.display())
  }
}

/// Seam over process spawning, so the step sequence can run against fakes.
pub trait CommandRunner {
  fn run(&mut self, step: &ToolStep, working_dir: &Path) -> io::Result<ExitStatus>;
}

/// Runs steps as real child processes, inheriting stdout/stderr.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
  fn run(&mut self, step: &ToolStep, working_dir: &Path) -> io::Result<ExitStatus> {
    Command::new(&step.program)
      .args(&step.args)
      .current_dir(working_dir)
      .status()
  }
}

/// The full acquisition sequence for `config.dataset`.
pub fn kaggle_steps(credentials: &KaggleCredentials, config: &SubsetConfig) -> Vec<ToolStep> {
  let dataset = config.dataset.to_string();
  let archive = config.dataset.archive_name();
  vec![
    ToolStep::new(
      "configure username",
      KAGGLE_BIN,
      &["config", "set", "-n", "username", "-v", credentials.username.as_str()],
    ),
    ToolStep::new(
      "configure key",
      KAGGLE_BIN,
      &["config", "set", "-n", "key", "-v", credentials.key.as_str()],
    )
    .with_secret_arg(5),
    ToolStep::new(
      "download dataset",
      KAGGLE_BIN,
      &["datasets", "download", "-d", dataset.as_str()],
    ),
    ToolStep::new("extract archive", UNZIP_BIN, &["-o", archive.as_str()]),
  ]
}

/// Runs `steps` in order, stopping at the first one that fails to spawn or
/// exits unsuccessfully.
pub fn run_steps<R: CommandRunner>(runner: &mut R, steps: &[ToolStep], working_dir: &Path) -> Result<()> {
  for step in steps {
    info!("-- {}: {}", step.name, step.display());
    let status = runner
      .run(step, working_dir)
      .map_err(|source| SubsetError::Spawn {
        step: step.name.to_string(),
        source,
      })?;
    if !status.success() {
      return Err(SubsetError::ExternalTool {
        step: step.name.to_string(),
        status,
      });
    }
  }
  Ok(())
}

/// Downloads and extracts the snapshot, returning where it is expected to be.
pub fn download_snapshot<R: CommandRunner>(
  runner: &mut R,
  credentials: &KaggleCredentials,
  config: &SubsetConfig,
) -> Result<PathBuf> {
  fs::create_dir_all(&config.download_dir).map_err(|e| SubsetError::io(&config.download_dir, e))?;
  let steps = kaggle_steps(credentials, config);
  run_steps(runner, &steps, &config.download_dir)?;
  Ok(config.download_dir.join(&config.snapshot_filename))
}
