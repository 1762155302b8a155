use std::collections::HashMap;
use std::path::PathBuf;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use polars::prelude::*;
use tracing::{debug, error};

use crate::helper_functions::read_csv;
use crate::models::Dataset;

/// Undirected, simple gene-gene graph of one pathway.
#[derive(Debug, Default)]
pub struct PathwayGraph {
    graph: UnGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl PathwayGraph {
    pub fn from_edges<'a, I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut pathway = PathwayGraph::default();
        for (source, sink) in edges {
            let a = pathway.node(source);
            let b = pathway.node(sink);
            // repeated edges collapse into one
            pathway.graph.update_edge(a, b, ());
        }
        pathway
    }

    fn node(&mut self, gene: &str) -> NodeIndex {
        if let Some(&ix) = self.nodes.get(gene) {
            return ix;
        }
        let ix = self.graph.add_node(gene.to_string());
        self.nodes.insert(gene.to_string(), ix);
        ix
    }

    pub fn contains(&self, gene: &str) -> bool {
        self.nodes.contains_key(gene)
    }

    /// Number of incident edges, a self-loop counting twice. `None` if the gene is absent.
    pub fn degree(&self, gene: &str) -> Option<usize> {
        let ix = *self.nodes.get(gene)?;
        Some(
            self.graph
                .edges(ix)
                .map(|e| if e.source() == e.target() { 2 } else { 1 })
                .sum(),
        )
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Two-column `source,sink` edge list of a pathway.
pub struct PathwayEdgeList {
    pub path: PathBuf,
}

impl Dataset for PathwayEdgeList {
    type Output = PathwayGraph;

    fn load(&self) -> PolarsResult<PathwayGraph> {
        debug!("Reading pathway edge list from {}", self.path.display());
        let df = match read_csv(&self.path) {
            Ok(df) => df,
            Err(e) => {
                error!("Failed to read pathway CSV {}: {}", self.path.display(), e);
                return Err(e);
            }
        };

        let sources = df.column("source")?.cast(&DataType::String)?;
        let sinks = df.column("sink")?.cast(&DataType::String)?;

        let edges = sources
            .str()?
            .into_iter()
            .zip(sinks.str()?.into_iter())
            .filter_map(|(source, sink)| Some((source?, sink?)));
        let graph = PathwayGraph::from_edges(edges);
        debug!(
            "{}: {} genes, {} edges",
            self.path.display(),
            graph.node_count(),
            graph.edge_count()
        );

        if graph.edge_count() < df.height() {
            debug!(
                "{}: {} edge rows reduced to {} distinct edges",
                self.path.display(),
                df.height(),
                graph.edge_count()
            );
        }
        Ok(graph)
    }
}
