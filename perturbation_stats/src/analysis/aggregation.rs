use std::fs::create_dir_all;
use std::path::Path;

use polars::prelude::PolarsResult;
use tracing::{debug, error, info};

use crate::analysis::statistics::perturbation_records;
use crate::data_handling::expression_counts::CountTables;
use crate::data_handling::pathway_graph::PathwayEdgeList;
use crate::data_handling::DataLayout;
use crate::helper_functions::create_progress_bar;
use crate::models::{polars_err, Dataset, PerturbationDir, Record};

pub const RESULT_COLUMNS: [&str; 4] = ["type", "gene", "source", "value"];

/// Collect the statistics records of every result directory, in input order.
pub fn read_data(dir_list: &[String], layout: &DataLayout) -> PolarsResult<Vec<Record>> {
    let pb = create_progress_bar(dir_list.len() as u64, "Collecting statistics");
    let mut records = Vec::new();

    for dir in dir_list {
        let parsed = PerturbationDir::parse(dir)?;
        debug!(
            "{}: pathway={} gene={} study={} treatment={} deconf_param={}",
            dir, parsed.pathway, parsed.gene, parsed.study, parsed.treatment, parsed.deconf_param
        );

        let graph = PathwayEdgeList {
            path: layout.pathway_edges(&parsed),
        }
        .load()?;
        let table = CountTables {
            control_path: layout.control_counts(&parsed),
            mutant_path: layout.mutant_counts(&parsed),
        }
        .load()?;

        records.extend(perturbation_records(&parsed, &graph, &table)?);
        pb.inc(1);
    }

    pb.finish_with_message("Statistics collected");
    info!(
        "Collected {} records from {} result directories",
        records.len(),
        dir_list.len()
    );
    Ok(records)
}

/// Write the long-format table with header `type,gene,source,value`; missing values stay empty.
pub fn write_results(records: &[Record], path: &Path) -> PolarsResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent).map_err(|e| {
            error!("Failed to create output directory {}: {}", parent.display(), e);
            polars_err(Box::new(e))
        })?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| polars_err(Box::new(e)))?;

    // explicit header so an empty run still yields a valid table
    writer
        .write_record(RESULT_COLUMNS)
        .map_err(|e| polars_err(Box::new(e)))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| polars_err(Box::new(e)))?;
    }
    writer.flush().map_err(|e| polars_err(Box::new(e)))?;

    info!("Statistics table written to {}", path.display());
    Ok(())
}

pub fn load_results(path: &Path) -> PolarsResult<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| polars_err(Box::new(e)))?;
    reader
        .deserialize::<Record>()
        .map(|row| row.map_err(|e| polars_err(Box::new(e))))
        .collect()
}
