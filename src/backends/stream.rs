use std::io::Write;

use ahash::AHashSet;
use serde_json::json;

use crate::{
    canonical::stable_id,
    errors::GraphCrawlError,
    fanout::{CanonicalEdge, CanonicalNode, MirrorBackend},
};

/// Message-streamed mirror: newline-delimited JSON over any `io::Write`.
/// `{"an":{id: attrs}}` adds a node, `{"ae":{id: attrs}}` adds an edge whose
/// attrs carry `source`, `target` and `directed: true`.
pub struct StreamMirror<W: Write> {
    writer: W,
    node_keys: AHashSet<String>,
    edge_keys: AHashSet<String>,
}

impl<W: Write> StreamMirror<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            node_keys: AHashSet::new(),
            edge_keys: AHashSet::new(),
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn send(&mut self, message: &serde_json::Value) -> Result<(), GraphCrawlError> {
        let line = serde_json::to_string(message)
            .map_err(|e| GraphCrawlError::backend(e.to_string()))?;
        writeln!(self.writer, "{line}").map_err(|e| GraphCrawlError::backend(e.to_string()))
    }
}

impl<W: Write> MirrorBackend for StreamMirror<W> {
    fn name(&self) -> &str {
        "stream"
    }

    /// The stream protocol has no wipe message.
    fn clear(&mut self) -> Result<(), GraphCrawlError> {
        self.node_keys.clear();
        self.edge_keys.clear();
        Ok(())
    }

    fn add_node(&mut self, node: &CanonicalNode) -> Result<(), GraphCrawlError> {
        if !self.node_keys.insert(node.key.clone()) {
            return Ok(());
        }
        let id = stable_id(&node.key).to_string();
        self.send(&json!({ "an": { id: node.attrs } }))
    }

    fn add_edge(&mut self, edge: &CanonicalEdge) -> Result<(), GraphCrawlError> {
        if !self.edge_keys.insert(edge.key.clone()) {
            return Ok(());
        }
        let mut attrs = edge.attrs.clone();
        attrs.insert(
            "source".to_string(),
            json!(stable_id(&edge.source_key).to_string()),
        );
        attrs.insert(
            "target".to_string(),
            json!(stable_id(&edge.target_key).to_string()),
        );
        attrs.insert("rel_type".to_string(), json!(edge.rel_type));
        attrs.insert("directed".to_string(), json!(true));
        let id = stable_id(&edge.key).to_string();
        self.send(&json!({ "ae": { id: attrs } }))
    }

    fn finish(&mut self) -> Result<(), GraphCrawlError> {
        self.writer
            .flush()
            .map_err(|e| GraphCrawlError::backend(e.to_string()))
    }
}
