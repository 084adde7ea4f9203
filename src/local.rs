use std::fs::File;
use std::io::{self, prelude::*, BufReader, Lines};
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Result, SubsetError};

/// The snapshot file inside a local data directory.
pub fn snapshot_path(data_dir: &Path, snapshot_filename: &str) -> PathBuf {
  data_dir.join(snapshot_filename)
}

/// Lazy line iterator over an arXiv metadata snapshot.
/// Only the current line is ever held in memory.
pub struct SnapshotLines {
  path: PathBuf,
  lines: Lines<BufReader<File>>,
}

impl SnapshotLines {
  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl Iterator for SnapshotLines {
  type Item = io::Result<String>;

  fn next(&mut self) -> Option<Self::Item> {
    self.lines.next()
  }
}

pub fn open_snapshot(path: impl AsRef<Path>) -> Result<SnapshotLines> {
  let path = path.as_ref();
  let snapshot_file = File::open(path).map_err(|e| SubsetError::io(path, e))?;
  info!("streaming arXiv metadata from {}", path.display());
  Ok(SnapshotLines {
    path: path.to_path_buf(),
    lines: BufReader::new(snapshot_file).lines(),
  })
}
