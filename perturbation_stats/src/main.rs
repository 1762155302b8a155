use std::fs::create_dir_all;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::analysis::aggregation::{read_data, write_results};
use crate::analysis::boxplots::render_all;
use crate::data_handling::DataLayout;
use crate::helper_functions::{project_root, read_run_parameters, RunParameters};

mod analysis;
mod data_handling;
mod helper_functions;
mod models;

#[derive(Parser, Debug)]
#[command(name = "perturbation_stats")]
#[command(about = "Pathway degree and expression statistics of CRISPR perturbation results")]
#[command(version)]
struct Args {
    /// JSON file with the workflow's `input.dir_list`, `output.fname` and `output.out_dir`.
    params: PathBuf,
}

fn main() -> anyhow::Result<()> {
    // Setup logging and project configuration
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let params = read_run_parameters(&args.params)
        .with_context(|| format!("reading run parameters from {}", args.params.display()))?;
    let layout = DataLayout::new(project_root());

    info!(
        "Aggregating {} result directories below {}",
        params.input.dir_list.len(),
        layout.root().display()
    );
    run(&params, &layout)
}

fn run(params: &RunParameters, layout: &DataLayout) -> anyhow::Result<()> {
    let out_dir = &params.output.out_dir;
    create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let records = read_data(&params.input.dir_list, layout).context("collecting statistics")?;
    write_results(&records, &params.output.fname)
        .with_context(|| format!("writing {}", params.output.fname.display()))?;

    // The table is already on disk if plotting fails.
    render_all(&records, out_dir).context("rendering figures")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregation::load_results;
    use crate::analysis::aggregation::tests::fixture;
    use crate::helper_functions::{RunInput, RunOutput};

    #[test]
    fn run_writes_table_and_figures() {
        let dir = fixture();
        let layout = DataLayout::new(dir.path());
        let params = RunParameters {
            input: RunInput {
                dir_list: vec![
                    "x/y/PathwayA/GeneX/Study1/1/z".to_string(),
                    "x/y/PathwayA/GeneX,GeneY/Study1/2/z".to_string(),
                ],
            },
            output: RunOutput {
                fname: dir.path().join("out/tables/stats.csv"),
                out_dir: dir.path().join("out/plots/boxplots"),
            },
        };

        run(&params, &layout).unwrap();

        assert_eq!(load_results(&params.output.fname).unwrap().len(), 9);
        for name in ["degrees.pdf", "counts_mean.pdf", "counts_std.pdf"] {
            let doc = lopdf::Document::load(params.output.out_dir.join(name)).unwrap();
            assert_eq!(doc.get_pages().len(), 1);
        }
    }

    #[test]
    fn run_stops_before_output_on_bad_directory() {
        let dir = fixture();
        let layout = DataLayout::new(dir.path());
        let params = RunParameters {
            input: RunInput {
                dir_list: vec!["PathwayA/GeneX".to_string()],
            },
            output: RunOutput {
                fname: dir.path().join("out/stats.csv"),
                out_dir: dir.path().join("out/plots"),
            },
        };

        assert!(run(&params, &layout).is_err());
        assert!(!params.output.fname.exists());
        assert!(!params.output.out_dir.join("degrees.pdf").exists());
    }
}
