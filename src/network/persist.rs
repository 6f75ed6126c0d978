use super::graph::{Edge, ThresholdGraph};
use super::GraphError;
use crate::symbol::Symbol;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Serialized form of a threshold graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphArtifact {
    pub theta: f64,
    pub nodes: Vec<Symbol>,
    pub edges: Vec<Edge>,
}

impl From<&ThresholdGraph> for GraphArtifact {
    fn from(graph: &ThresholdGraph) -> Self {
        GraphArtifact {
            theta: graph.theta(),
            nodes: graph.symbols().cloned().collect(),
            edges: graph.edges(),
        }
    }
}

impl TryFrom<GraphArtifact> for ThresholdGraph {
    type Error = GraphError;

    fn try_from(artifact: GraphArtifact) -> Result<Self, Self::Error> {
        ThresholdGraph::from_parts(artifact.theta, artifact.nodes, artifact.edges)
    }
}

impl ThresholdGraph {
    /// Writes the graph as a JSON artifact.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GraphError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| GraphError::Io(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &GraphArtifact::from(self))?;
        writer.flush().map_err(|e| GraphError::Io(e.to_string()))?;
        info!(
            path = %path.display(),
            nodes = self.node_count(),
            edges = self.edge_count(),
            "graph saved"
        );
        Ok(())
    }

    /// Loads a graph saved with [`ThresholdGraph::save`].
    ///
    /// # Errors
    /// Returns `MissingFile` if the artifact does not exist, `Json` if it is
    /// malformed and `InvalidEdge` if its edges are inconsistent.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GraphError::MissingFile(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|e| GraphError::Io(e.to_string()))?;
        let artifact: GraphArtifact = serde_json::from_reader(BufReader::new(file))?;
        let graph = ThresholdGraph::try_from(artifact)?;
        info!(
            path = %path.display(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph loaded"
        );
        Ok(graph)
    }
}
