use std::path::PathBuf;

use ahash::{AHashMap, AHashSet};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::{
    errors::GraphCrawlError,
    fanout::{CanonicalEdge, CanonicalNode, MirrorBackend},
    gexf,
    store::AttrMap,
};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticNode {
    pub key: String,
    pub attrs: AttrMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticEdge {
    pub rel_type: String,
    pub attrs: AttrMap,
}

/// In-process graph accumulated during the crawl, serialized once to a GEXF
/// file when the crawl completes.
pub struct AnalyticBackend {
    graph: DiGraph<AnalyticNode, AnalyticEdge>,
    indices: AHashMap<String, NodeIndex>,
    edge_keys: AHashSet<String>,
    output: PathBuf,
    written: bool,
}

impl AnalyticBackend {
    pub fn new<P: Into<PathBuf>>(output: P) -> Self {
        Self {
            graph: DiGraph::new(),
            indices: AHashMap::new(),
            edge_keys: AHashSet::new(),
            output: output.into(),
            written: false,
        }
    }

    pub fn graph(&self) -> &DiGraph<AnalyticNode, AnalyticEdge> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Index for `key`, creating an attribute-less placeholder if the key has
    /// only been seen as an edge endpoint so far.
    fn index_for(&mut self, key: &str) -> NodeIndex {
        if let Some(index) = self.indices.get(key) {
            return *index;
        }
        let index = self.graph.add_node(AnalyticNode {
            key: key.to_string(),
            attrs: AttrMap::new(),
        });
        self.indices.insert(key.to_string(), index);
        index
    }
}

impl MirrorBackend for AnalyticBackend {
    fn name(&self) -> &str {
        "analytic"
    }

    fn clear(&mut self) -> Result<(), GraphCrawlError> {
        self.graph.clear();
        self.indices.clear();
        self.edge_keys.clear();
        self.written = false;
        Ok(())
    }

    fn add_node(&mut self, node: &CanonicalNode) -> Result<(), GraphCrawlError> {
        let index = self.index_for(&node.key);
        let weight = &mut self.graph[index];
        // Attributes fill in a placeholder left by an earlier edge; a node
        // that already carries attributes is never merged.
        if weight.attrs.is_empty() {
            weight.attrs = node.attrs.clone();
        }
        Ok(())
    }

    fn add_edge(&mut self, edge: &CanonicalEdge) -> Result<(), GraphCrawlError> {
        if !self.edge_keys.insert(edge.key.clone()) {
            return Ok(());
        }
        let source = self.index_for(&edge.source_key);
        let target = self.index_for(&edge.target_key);
        self.graph.add_edge(
            source,
            target,
            AnalyticEdge {
                rel_type: edge.rel_type.clone(),
                attrs: edge.attrs.clone(),
            },
        );
        Ok(())
    }

    fn finish(&mut self) -> Result<(), GraphCrawlError> {
        if self.written {
            return Ok(());
        }
        gexf::write_gexf_file(&self.graph, &self.output)?;
        self.written = true;
        Ok(())
    }
}
