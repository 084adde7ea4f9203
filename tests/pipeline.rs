use std::cell::Cell;
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use indicatif::ProgressBar;
use tempfile::tempdir;

use arxiv_subset::config::{ALLOWED_TOPICS, SNAPSHOT_FILENAME};
use arxiv_subset::filter::{build_subset, SkipReason};
use arxiv_subset::remote::{CommandRunner, ToolStep};
use arxiv_subset::{create_arxiv_subset, resolve_source, CorpusSource, SubsetConfig, SubsetError};

const SNAPSHOT: &str = r#"{"id": "0704.0001", "categories": "astro-ph.CO", "title": "T", "abstract": "A", "versions": []}
{"id": "0704.0002", "categories": "cs.AI cs.LG", "title": "multi", "abstract": "x"}
not json at all
{"id": "0704.0003", "categories": "q-fin.GN", "title": "finance", "abstract": "x"}
{"id": "0704.0004", "title": "no categories", "abstract": "x"}
{"id": "0704.0005", "categories": "math.CO", "title": "combinatorics", "abstract": "y"}
{"id": "0704.0006", "categories": "q-bio.NC", "title": "neurons", "abstract": "z"}
{"id": "0704.0007", "categories": "stat.ML", "title": "learning", "abstract": "w"}
"#;

fn write_snapshot(dir: &Path) {
  fs::write(dir.join(SNAPSHOT_FILENAME), SNAPSHOT).unwrap();
}

struct NoCommands;

impl CommandRunner for NoCommands {
  fn run(&mut self, step: &ToolStep, _working_dir: &Path) -> io::Result<ExitStatus> {
    panic!("unexpected external command: {}", step.display());
  }
}

#[test]
fn local_run_keeps_single_allowed_category_papers() {
  let temp = tempdir().unwrap();
  write_snapshot(temp.path());
  let source = resolve_source(Some(temp.path().to_path_buf()), None).unwrap();
  let config = SubsetConfig::new(50_000);

  let (subset, stats) = create_arxiv_subset(&source, &config, &mut NoCommands, &ProgressBar::hidden()).unwrap();

  let ids: Vec<&str> = subset.metadata().keys().map(String::as_str).collect();
  assert_eq!(ids, vec!["7040001", "7040005", "7040006", "7040007"]);
  for label in subset.labels().values() {
    assert!(ALLOWED_TOPICS.contains(&label.topic.as_str()));
    assert_eq!(label.subtopic.split_whitespace().count(), 1);
    assert!(label.subtopic.starts_with(&format!("{}.", label.topic)));
  }
  let metadata_keys: BTreeSet<_> = subset.metadata().keys().collect();
  let label_keys: BTreeSet<_> = subset.labels().keys().collect();
  assert_eq!(metadata_keys, label_keys);

  assert_eq!(stats.lines_read, 8);
  assert_eq!(stats.accepted, 4);
  assert_eq!(stats.skipped.get(&SkipReason::MultipleCategories), Some(&1));
  assert_eq!(stats.skipped.get(&SkipReason::Malformed), Some(&1));
  assert_eq!(stats.skipped.get(&SkipReason::TopicNotAllowed), Some(&1));
  assert_eq!(stats.skipped.get(&SkipReason::MissingCategories), Some(&1));
  assert_eq!(stats.accepted + stats.total_skipped(), stats.lines_read);
}

#[test]
fn cap_stops_reading_immediately() {
  let pulled = Cell::new(0usize);
  let lines = SNAPSHOT.lines().map(|line| {
    pulled.set(pulled.get() + 1);
    Ok::<_, io::Error>(line.to_string())
  });
  let config = SubsetConfig::new(2);
  let (subset, stats) = build_subset(lines, &config, &ProgressBar::hidden()).unwrap();

  assert_eq!(subset.len(), 2);
  assert_eq!(stats.accepted, 2);
  // the second accepted paper is on line 6; nothing after it is pulled
  assert_eq!(pulled.get(), 6);
  assert_eq!(stats.lines_read, 6);
}

#[test]
fn exhausted_input_returns_a_short_subset() {
  let temp = tempdir().unwrap();
  write_snapshot(temp.path());
  let source = CorpusSource::Local(temp.path().to_path_buf());
  let (subset, stats) = create_arxiv_subset(&source, &SubsetConfig::new(10), &mut NoCommands, &ProgressBar::hidden()).unwrap();
  assert_eq!(subset.len(), 4);
  assert_eq!(stats.requested, 10);
}

#[test]
fn missing_local_snapshot_is_an_io_error() {
  let temp = tempdir().unwrap();
  let source = CorpusSource::Local(temp.path().to_path_buf());
  let result = create_arxiv_subset(&source, &SubsetConfig::default(), &mut NoCommands, &ProgressBar::hidden());
  assert!(matches!(result, Err(SubsetError::Io { .. })));
}

#[test]
fn source_conflicts_fail_before_any_io() {
  let temp = tempdir().unwrap();
  let absent_dir = temp.path().join("never-created");
  let absent_credentials = temp.path().join("never-created.json");

  assert!(matches!(resolve_source(None, None), Err(SubsetError::Configuration(_))));
  assert!(matches!(
    resolve_source(Some(absent_dir.clone()), Some(absent_credentials.clone())),
    Err(SubsetError::Configuration(_))
  ));
  assert!(!absent_dir.exists());
  assert!(!absent_credentials.exists());
}

#[cfg(unix)]
mod kaggle {
  use super::*;
  use std::os::unix::process::ExitStatusExt;

  /// Pretends to be kaggle/unzip: records every step and, on extraction,
  /// drops the snapshot into the working directory.
  #[derive(Default)]
  struct FakeKaggle {
    seen: Vec<ToolStep>,
    fail_step: Option<&'static str>,
  }

  impl CommandRunner for FakeKaggle {
    fn run(&mut self, step: &ToolStep, working_dir: &Path) -> io::Result<ExitStatus> {
      self.seen.push(step.clone());
      if self.fail_step == Some(step.name) {
        return Ok(ExitStatus::from_raw(1 << 8));
      }
      if step.program == "unzip" {
        write_snapshot(working_dir);
      }
      Ok(ExitStatus::from_raw(0))
    }
  }

  fn credentials_file(dir: &Path) -> PathBuf {
    let path = dir.join("kaggle.json");
    fs::write(&path, r#"{"username": "alice", "key": "s3cret"}"#).unwrap();
    path
  }

  #[test]
  fn download_runs_the_sequence_then_filters() {
    let temp = tempdir().unwrap();
    let download_dir = temp.path().join("downloads");
    let credentials = credentials_file(temp.path());
    let source = resolve_source(None, Some(credentials)).unwrap();
    let config = SubsetConfig::new(3).with_download_dir(&download_dir);
    let mut runner = FakeKaggle::default();

    let (subset, _) = create_arxiv_subset(&source, &config, &mut runner, &ProgressBar::hidden()).unwrap();

    assert_eq!(subset.len(), 3);
    let programs: Vec<_> = runner.seen.iter().map(|s| s.program.as_str()).collect();
    assert_eq!(programs, vec!["kaggle", "kaggle", "kaggle", "unzip"]);
    assert!(download_dir.join(SNAPSHOT_FILENAME).exists());
  }

  #[test]
  fn failed_download_stops_the_sequence() {
    let temp = tempdir().unwrap();
    let credentials = credentials_file(temp.path());
    let source = CorpusSource::Kaggle(credentials);
    let config = SubsetConfig::default().with_download_dir(temp.path());
    let mut runner = FakeKaggle {
      fail_step: Some("download dataset"),
      ..Default::default()
    };

    let result = create_arxiv_subset(&source, &config, &mut runner, &ProgressBar::hidden());

    match result {
      Err(SubsetError::ExternalTool { step, .. }) => assert_eq!(step, "download dataset"),
      other => panic!("expected a failed download step, got {:?}", other.map(|(s, _)| s.len())),
    }
    assert_eq!(runner.seen.len(), 3);
  }

  #[test]
  fn bad_credentials_fail_before_any_command() {
    let temp = tempdir().unwrap();
    let credentials = temp.path().join("kaggle.json");
    fs::write(&credentials, r#"{"username": "alice"}"#).unwrap();
    let source = CorpusSource::Kaggle(credentials);
    let config = SubsetConfig::default().with_download_dir(temp.path());
    let mut runner = FakeKaggle::default();

    let result = create_arxiv_subset(&source, &config, &mut runner, &ProgressBar::hidden());

    assert!(matches!(result, Err(SubsetError::Credentials { .. })));
    assert!(runner.seen.is_empty());
  }

  #[test]
  fn errors_never_carry_the_key() {
    let temp = tempdir().unwrap();
    let credentials = credentials_file(temp.path());
    let source = CorpusSource::Kaggle(credentials);
    let config = SubsetConfig::default().with_download_dir(temp.path());
    let mut runner = FakeKaggle {
      fail_step: Some("configure key"),
      ..Default::default()
    };
    let err = create_arxiv_subset(&source, &config, &mut runner, &ProgressBar::hidden()).unwrap_err();
    let rendered = format!("{err} {err:?}");
    assert!(!rendered.contains("s3cret"), "{rendered}");
    assert!(rendered.contains("configure key"));
  }
}
