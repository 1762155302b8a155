use std::collections::HashSet;
use std::path::PathBuf;

use polars::prelude::*;
use tracing::{debug, error};

use crate::helper_functions::read_csv;
use crate::models::Dataset;

/// Name given to the gene-symbol index column after loading.
pub const GENE_INDEX: &str = "__gene_index";

/// Control and mutant count tables placed side by side, indexed by gene symbol.
///
/// The two tables stay separate frames so that a gene repeated on several
/// rows of one file contributes each of its rows exactly once.
#[derive(Debug, Clone)]
pub struct ExpressionTable {
    control: DataFrame,
    mutant: DataFrame,
}

impl ExpressionTable {
    pub fn from_frames(control: DataFrame, mutant: DataFrame) -> PolarsResult<Self> {
        Ok(ExpressionTable {
            control: index_by_first_column(control, "control")?,
            mutant: index_by_first_column(mutant, "mutant")?,
        })
    }

    /// Distinct gene symbols across both tables.
    pub fn gene_count(&self) -> PolarsResult<usize> {
        let mut genes = HashSet::new();
        for frame in [&self.control, &self.mutant] {
            genes.extend(frame.column(GENE_INDEX)?.str()?.into_iter().flatten());
        }
        Ok(genes.len())
    }

    /// Sample columns of both tables; a name present in both counts twice.
    pub fn sample_count(&self) -> usize {
        self.control.width().saturating_sub(1) + self.mutant.width().saturating_sub(1)
    }

    /// All non-missing values on the row(s) indexed by `gene`, control first.
    ///
    /// Fails when neither table carries that gene symbol.
    pub fn row_values(&self, gene: &str) -> PolarsResult<Vec<f64>> {
        let control = gene_rows(&self.control, gene)?;
        let mutant = gene_rows(&self.mutant, gene)?;
        if control.height() == 0 && mutant.height() == 0 {
            error!("Gene {} not found in expression table", gene);
            return Err(PolarsError::ComputeError(
                format!("gene '{}' not found in expression table", gene).into(),
            ));
        }

        let mut values = Vec::new();
        for rows in [&control, &mutant] {
            for col in rows.get_columns() {
                if col.name().as_str() == GENE_INDEX {
                    continue;
                }
                values.extend(col.f64()?.into_iter().flatten().filter(|v| !v.is_nan()));
            }
        }
        Ok(values)
    }
}

fn gene_rows(frame: &DataFrame, gene: &str) -> PolarsResult<DataFrame> {
    let mask = frame.column(GENE_INDEX)?.str()?.equal(gene);
    frame.filter(&mask)
}

fn index_by_first_column(df: DataFrame, label: &str) -> PolarsResult<DataFrame> {
    if df.width() == 0 {
        return Err(PolarsError::NoData(
            format!("{} count table has no columns", label).into(),
        ));
    }

    let mut columns = Vec::with_capacity(df.width());
    for (i, col) in df.take_columns().into_iter().enumerate() {
        if i == 0 {
            let mut index = col.cast(&DataType::String)?;
            index.rename(GENE_INDEX.into());
            columns.push(index);
        } else {
            columns.push(col.cast(&DataType::Float64)?);
        }
    }
    DataFrame::new(columns)
}

/// Control and mutant count files of one study/treatment.
pub struct CountTables {
    pub control_path: PathBuf,
    pub mutant_path: PathBuf,
}

impl Dataset for CountTables {
    type Output = ExpressionTable;

    fn load(&self) -> PolarsResult<ExpressionTable> {
        debug!("Reading control counts from {}", self.control_path.display());
        let control = match read_csv(&self.control_path) {
            Ok(df) => df,
            Err(e) => {
                error!("Failed to read control counts {}: {}", self.control_path.display(), e);
                return Err(e);
            }
        };

        debug!("Reading mutant counts from {}", self.mutant_path.display());
        let mutant = match read_csv(&self.mutant_path) {
            Ok(df) => df,
            Err(e) => {
                error!("Failed to read mutant counts {}: {}", self.mutant_path.display(), e);
                return Err(e);
            }
        };

        let table = ExpressionTable::from_frames(control, mutant)?;
        debug!(
            "Expression table: {} genes x {} samples",
            table.gene_count()?,
            table.sample_count()
        );
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use std::fs;

    #[test]
    fn concatenates_columns_and_unions_rows() {
        let control = df![
            "gene" => &["GeneX", "GeneY"],
            "c1" => &[1i64, 10],
        ]
        .unwrap();
        let mutant = df![
            "index" => &["GeneX", "GeneZ"],
            "m1" => &[2.0, 20.0],
            "m2" => &[3.0, 30.0],
        ]
        .unwrap();

        let table = ExpressionTable::from_frames(control, mutant).unwrap();
        assert_eq!(table.sample_count(), 3);
        assert_eq!(table.gene_count().unwrap(), 3);

        let mut x = table.row_values("GeneX").unwrap();
        x.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(x, vec![1.0, 2.0, 3.0]);

        // only the control column carries GeneY
        assert_eq!(table.row_values("GeneY").unwrap(), vec![10.0]);
        let mut z = table.row_values("GeneZ").unwrap();
        z.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(z, vec![20.0, 30.0]);
    }

    #[test]
    fn absent_gene_row_is_an_error() {
        let control = df!["gene" => &["GeneX"], "c1" => &[1.0]].unwrap();
        let mutant = df!["gene" => &["GeneX"], "m1" => &[2.0]].unwrap();
        let table = ExpressionTable::from_frames(control, mutant).unwrap();
        assert!(table.row_values("GeneQ").is_err());
    }

    #[test]
    fn shared_sample_names_are_both_kept() {
        let control = df!["gene" => &["GeneX"], "s1" => &[1.0]].unwrap();
        let mutant = df!["gene" => &["GeneX"], "s1" => &[5.0]].unwrap();
        let table = ExpressionTable::from_frames(control, mutant).unwrap();
        assert_eq!(table.sample_count(), 2);
        assert_eq!(table.row_values("GeneX").unwrap().len(), 2);
    }

    #[test]
    fn repeated_gene_rows_are_counted_once_each() {
        let control = df![
            "gene" => &["GeneX", "GeneX", "GeneY"],
            "c1" => &[1.0, 2.0, 7.0],
        ]
        .unwrap();
        let mutant = df!["gene" => &["GeneX", "GeneY"], "m1" => &[10.0, 8.0]].unwrap();
        let table = ExpressionTable::from_frames(control, mutant).unwrap();

        assert_eq!(table.row_values("GeneX").unwrap(), vec![1.0, 2.0, 10.0]);
        assert_eq!(table.row_values("GeneY").unwrap(), vec![7.0, 8.0]);
        assert_eq!(table.gene_count().unwrap(), 2);
    }

    #[test]
    fn late_decimal_and_text_cells_do_not_break_loading() {
        let dir = tempfile::tempdir().unwrap();
        let control_path = dir.path().join("Counts_Ctrl_1.csv");
        let mutant_path = dir.path().join("Counts_GeneX_1.csv");

        let mut control = String::from(",c1\n");
        for i in 0..150 {
            control.push_str(&format!("G{},{}\n", i, i));
        }
        control.push_str("GeneX,1.5\nGeneY,n/a\n");
        fs::write(&control_path, control).unwrap();
        fs::write(&mutant_path, ",m1\nGeneX,2\nGeneY,4\n").unwrap();

        let table = CountTables {
            control_path,
            mutant_path,
        }
        .load()
        .unwrap();

        assert_eq!(table.row_values("GeneX").unwrap(), vec![1.5, 2.0]);
        assert_eq!(table.row_values("GeneY").unwrap(), vec![4.0]);
        assert_eq!(table.row_values("G149").unwrap(), vec![149.0]);
    }

    #[test]
    fn loads_count_files_with_blank_cells() {
        let dir = tempfile::tempdir().unwrap();
        let control_path = dir.path().join("Counts_Ctrl_1.csv");
        let mutant_path = dir.path().join("Counts_GeneX_1.csv");
        fs::write(&control_path, ",ctrl_a,ctrl_b\nGeneX,1,\nGeneY,4,5\n").unwrap();
        fs::write(&mutant_path, ",mut_a\nGeneX,3\n").unwrap();

        let table = CountTables {
            control_path,
            mutant_path,
        }
        .load()
        .unwrap();

        let mut x = table.row_values("GeneX").unwrap();
        x.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(x, vec![1.0, 3.0]);
        assert_eq!(table.row_values("GeneY").unwrap(), vec![4.0, 5.0]);
    }

    #[test]
    fn missing_count_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let tables = CountTables {
            control_path: dir.path().join("Counts_Ctrl_1.csv"),
            mutant_path: dir.path().join("Counts_GeneX_1.csv"),
        };
        assert!(tables.load().is_err());
    }
}
