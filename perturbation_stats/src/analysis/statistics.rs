use polars::prelude::PolarsResult;
use statrs::statistics::Statistics;
use tracing::debug;

use crate::data_handling::expression_counts::ExpressionTable;
use crate::data_handling::pathway_graph::PathwayGraph;
use crate::models::{PerturbationDir, Record, StatisticKind};

/// Mean and sample standard deviation (n - 1) of the non-missing values.
///
/// Mean is `None` for an empty slice, standard deviation for fewer than two values.
pub fn mean_and_std(values: &[f64]) -> (Option<f64>, Option<f64>) {
    let mean = values.iter().mean();
    let std = values.iter().std_dev();
    (
        Some(mean).filter(|v| !v.is_nan()),
        Some(std).filter(|v| !v.is_nan()),
    )
}

/// Three records per perturbed gene: pathway degree, expression mean, expression std.
pub fn perturbation_records(
    dir: &PerturbationDir,
    graph: &PathwayGraph,
    table: &ExpressionTable,
) -> PolarsResult<Vec<Record>> {
    let genes = dir.gene_list();
    let mut records = Vec::with_capacity(3 * genes.len());

    for gene in genes {
        if !graph.contains(gene) {
            debug!("{} is not part of pathway {}", gene, dir.pathway);
        }
        let degree = graph.degree(gene).map(|d| d as f64);

        // mean and std share the same row subset
        let values = table.row_values(gene)?;
        let (mean, std) = mean_and_std(&values);

        records.push(Record::new(
            StatisticKind::PathwayDegree,
            &dir.gene,
            dir.pathway_source(gene),
            degree,
        ));
        records.push(Record::new(
            StatisticKind::ExpressionCountMean,
            &dir.gene,
            dir.treatment_source(gene),
            mean,
        ));
        records.push(Record::new(
            StatisticKind::ExpressionCountStd,
            &dir.gene,
            dir.treatment_source(gene),
            std,
        ));
    }

    Ok(records)
}
