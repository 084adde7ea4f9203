//! Builds `metadata.json` and `data.json` from the arXiv metadata snapshot,
//! keeping only single-category papers from the allow-listed top-level topics.
//!
//! The snapshot either sits in a local directory (`--data-dir`) or is fetched
//! through the kaggle CLI (`--kaggle-credentials path/to/kaggle.json`).

use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use simple_logger::SimpleLogger;

use arxiv_subset::config::{DatasetHandle, DEFAULT_DATASET, DEFAULT_N_PAPERS};
use arxiv_subset::output::write_subset;
use arxiv_subset::remote::SystemRunner;
use arxiv_subset::{create_arxiv_subset, resolve_source, SubsetConfig};

#[derive(Parser)]
#[command(name = "create_arxiv_subset")]
#[command(about = "Extracts a single-category subset of the arXiv metadata snapshot")]
struct Cli {
  #[arg(long, help = "Directory holding arxiv-metadata-oai-snapshot.json")]
  data_dir: Option<PathBuf>,

  #[arg(long, default_value_t = DEFAULT_N_PAPERS, help = "Number of papers to keep in the subset")]
  n_papers: usize,

  #[arg(long, help = "Path to kaggle.json, used to download the snapshot instead of --data-dir")]
  kaggle_credentials: Option<PathBuf>,

  #[arg(long, default_value = ".", help = "Directory for metadata.json, data.json and subset_stats.json")]
  output_dir: PathBuf,

  #[arg(long, default_value = DEFAULT_DATASET, help = "Kaggle dataset handle (owner/slug)")]
  dataset: String,

  #[arg(long, default_value = ".", help = "Working directory for the kaggle download and unzip")]
  download_dir: PathBuf,

  #[arg(long, default_value = "INFO", help = "Logging level (DEBUG, INFO, WARN, ERROR)")]
  log_level: String,
}

fn main() -> Result<(), Box<dyn Error>> {
  let start_time = Instant::now();
  let cli = Cli::parse();

  let log_level = match cli.log_level.to_uppercase().as_str() {
    "DEBUG" => LevelFilter::Debug,
    "INFO" => LevelFilter::Info,
    "WARN" | "WARNING" => LevelFilter::Warn,
    "ERROR" => LevelFilter::Error,
    other => {
      eprintln!("-- invalid log level '{}', defaulting to INFO.", other);
      LevelFilter::Info
    }
  };
  SimpleLogger::new().with_level(log_level).init()?;

  // all configuration problems surface before any file or network access
  let dataset: DatasetHandle = cli.dataset.parse()?;
  let config = SubsetConfig::new(cli.n_papers)
    .with_dataset(dataset)
    .with_download_dir(&cli.download_dir);
  config.validate()?;
  let source = resolve_source(cli.data_dir, cli.kaggle_credentials)?;

  let progress = ProgressBar::new(config.n_papers as u64);
  progress.set_style(
    ProgressStyle::default_bar()
      .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} papers ({per_sec})")?
      .progress_chars("=> "),
  );

  let (subset, stats) = create_arxiv_subset(&source, &config, &mut SystemRunner, &progress)?;
  progress.finish_and_clear();

  let written = write_subset(&subset, &stats, &cli.output_dir)?;
  eprintln!(
    "-- Done: kept {} of {} lines read ({} skipped) in {} sec; see {}.",
    subset.len(),
    stats.lines_read,
    stats.total_skipped(),
    (Instant::now() - start_time).as_secs(),
    written.stats.display()
  );
  Ok(())
}
