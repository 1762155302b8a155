pub mod expression_counts;
pub mod pathway_graph;

use std::path::{Path, PathBuf};

use crate::models::PerturbationDir;

/// Fixed on-disk layout of pathway edge lists and count tables below the project root.
#[derive(Debug, Clone)]
pub struct DataLayout {
    pub root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DataLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pathway_edges(&self, dir: &PerturbationDir) -> PathBuf {
        self.root
            .join("results/pathways/csv_files")
            .join(format!("{}.csv", dir.pathway))
    }

    pub fn control_counts(&self, dir: &PerturbationDir) -> PathBuf {
        self.root
            .join("resources/data")
            .join(&dir.study)
            .join(format!("Counts_Ctrl_{}.csv", dir.treatment))
    }

    pub fn mutant_counts(&self, dir: &PerturbationDir) -> PathBuf {
        self.root
            .join("resources/data")
            .join(&dir.study)
            .join(format!("Counts_{}_{}.csv", dir.gene, dir.treatment))
    }
}
