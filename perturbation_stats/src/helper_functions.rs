use std::env;
use std::fs::File;
use std::io::{BufReader, IsTerminal};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use polars::error::PolarsResult;
use polars::frame::DataFrame;
use polars::prelude::{CsvReadOptions, SerReader};
use serde::Deserialize;

use crate::models::polars_err;

pub fn project_root() -> PathBuf {
    match env::var_os("PROJECT_ROOT") {
        Some(val) => PathBuf::from(val),
        None => {
            // Fall back to current directory if PROJECT_ROOT not set
            env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        }
    }
}

/// Every column comes back as text; loaders cast to the types they need,
/// so a late decimal or gene symbol never trips a guessed integer schema.
pub fn read_csv(file_path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(file_path.to_path_buf()))?
        .finish()
}

/// Parameters handed over by the workflow manager.
#[derive(Debug, Clone, Deserialize)]
pub struct RunParameters {
    pub input: RunInput,
    pub output: RunOutput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunInput {
    pub dir_list: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunOutput {
    /// Destination of the long-format statistics table.
    pub fname: PathBuf,
    /// Directory receiving the figures.
    pub out_dir: PathBuf,
}

pub fn read_run_parameters(path: &Path) -> PolarsResult<RunParameters> {
    let file = File::open(path).map_err(|e| polars_err(Box::new(e)))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| polars_err(Box::new(e)))
}

/// Natural-sort order ("Gene2" before "Gene10"), duplicates removed.
pub fn natural_sorted<'a, I>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out: Vec<String> = labels.into_iter().map(str::to_string).collect();
    out.sort_by(|a, b| natord::compare(a, b));
    out.dedup();
    out
}

pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let draw_target = if std::io::stderr().is_terminal() {
        ProgressDrawTarget::stderr_with_hz(20)
    } else {
        ProgressDrawTarget::hidden()
    };

    let pb = ProgressBar::with_draw_target(Some(len), draw_target);
    if let Ok(style) = ProgressStyle::with_template(
        "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
    ) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(message.to_string());

    pb
}
