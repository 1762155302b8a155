use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const SOURCE_SEPARATOR: &str = " -- ";

/// Wrap any non-polars failure so it can travel through `PolarsResult`.
pub fn polars_err(e: Box<dyn std::error::Error>) -> PolarsError {
    PolarsError::ComputeError(e.to_string().into())
}

/// Something on disk that can be read into an in-memory structure.
pub trait Dataset {
    type Output;

    fn load(&self) -> PolarsResult<Self::Output>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticKind {
    PathwayDegree,
    ExpressionCountMean,
    ExpressionCountStd,
}

impl StatisticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticKind::PathwayDegree => "pathway_degree",
            StatisticKind::ExpressionCountMean => "expression_count_mean",
            StatisticKind::ExpressionCountStd => "expression_count_std",
        }
    }
}

/// One row of the long-format result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "type")]
    pub kind: StatisticKind,
    /// Full perturbation label, comma-joined for multi-gene perturbations.
    pub gene: String,
    pub source: String,
    pub value: Option<f64>,
}

impl Record {
    pub fn new(kind: StatisticKind, gene: &str, source: String, value: Option<f64>) -> Self {
        Record {
            kind,
            gene: gene.to_string(),
            source,
            value,
        }
    }

    /// Leading token of `source`, i.e. the treatment for expression records.
    ///
    /// A label without the separator yields the whole string.
    pub fn treatment(&self) -> &str {
        self.source.split(SOURCE_SEPARATOR).next().unwrap_or_default()
    }
}

/// The five trailing fields encoded in a result directory path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerturbationDir {
    pub pathway: String,
    /// Raw gene segment, e.g. `GeneX,GeneY`.
    pub gene: String,
    pub study: String,
    pub treatment: String,
    pub deconf_param: String,
}

impl PerturbationDir {
    pub fn parse(dir: &str) -> PolarsResult<Self> {
        let segments: Vec<&str> = dir.split('/').collect();
        if segments.len() < 5 {
            return Err(PolarsError::ComputeError(
                format!(
                    "malformed result directory '{}': expected at least 5 segments, found {}",
                    dir,
                    segments.len()
                )
                .into(),
            ));
        }

        let tail = &segments[segments.len() - 5..];
        Ok(PerturbationDir {
            pathway: tail[0].to_string(),
            gene: tail[1].to_string(),
            study: tail[2].to_string(),
            treatment: tail[3].to_string(),
            deconf_param: tail[4].to_string(),
        })
    }

    pub fn gene_list(&self) -> Vec<&str> {
        self.gene.split(',').collect()
    }

    pub fn pathway_source(&self, gene: &str) -> String {
        format!("{}{}{}", self.pathway, SOURCE_SEPARATOR, gene)
    }

    pub fn treatment_source(&self, gene: &str) -> String {
        format!("{}{}{}", self.treatment, SOURCE_SEPARATOR, gene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_last_five_segments() {
        let dir = PerturbationDir::parse("x/y/PathwayA/GeneX/Study1/1/z").unwrap();
        assert_eq!(dir.pathway, "PathwayA");
        assert_eq!(dir.gene, "GeneX");
        assert_eq!(dir.study, "Study1");
        assert_eq!(dir.treatment, "1");
        assert_eq!(dir.deconf_param, "z");
        assert_eq!(dir.gene_list(), vec!["GeneX"]);
    }

    #[test]
    fn exactly_five_segments_is_enough() {
        let dir = PerturbationDir::parse("P/G/S/2/d").unwrap();
        assert_eq!(dir.pathway, "P");
        assert_eq!(dir.deconf_param, "d");
    }

    #[test]
    fn splits_multi_gene_label() {
        let dir = PerturbationDir::parse("res/P/GeneX,GeneY/S/3/0.5").unwrap();
        assert_eq!(dir.gene, "GeneX,GeneY");
        assert_eq!(dir.gene_list(), vec!["GeneX", "GeneY"]);
        assert_eq!(dir.pathway_source("GeneY"), "P -- GeneY");
        assert_eq!(dir.treatment_source("GeneX"), "3 -- GeneX");
    }

    #[test]
    fn rejects_short_paths() {
        assert!(PerturbationDir::parse("P/G/S/1").is_err());
        assert!(PerturbationDir::parse("").is_err());
    }

    #[test]
    fn trailing_slash_gives_empty_deconf_param() {
        let dir = PerturbationDir::parse("P/G/S/1/d/").unwrap();
        assert_eq!(dir.pathway, "G");
        assert_eq!(dir.deconf_param, "");
    }

    #[test]
    fn treatment_comes_from_source_prefix() {
        let rec = Record::new(
            StatisticKind::ExpressionCountMean,
            "GeneX",
            "2 -- GeneX".to_string(),
            Some(1.0),
        );
        assert_eq!(rec.treatment(), "2");

        let malformed = Record::new(StatisticKind::ExpressionCountStd, "GeneX", "2-GeneX".into(), None);
        assert_eq!(malformed.treatment(), "2-GeneX");
    }

    #[test]
    fn kind_names_match_table_values() {
        assert_eq!(StatisticKind::PathwayDegree.as_str(), "pathway_degree");
        assert_eq!(StatisticKind::ExpressionCountMean.as_str(), "expression_count_mean");
        assert_eq!(StatisticKind::ExpressionCountStd.as_str(), "expression_count_std");
    }
}
