use std::{io::Write, sync::Arc};

use ahash::AHashSet;
use parking_lot::Mutex;

use crate::{
    backends::attr_text,
    canonical::stable_id,
    errors::GraphCrawlError,
    fanout::{CanonicalEdge, CanonicalNode, MirrorBackend},
};

/// Capability surface of the id-addressed vertex backend. Wire plumbing is
/// out of scope here; `LineRpc` writes one command per line over any
/// `io::Write`, which covers a TCP stream.
pub trait VertexRpc {
    fn clear(&mut self) -> Result<(), GraphCrawlError>;
    fn create_vertex(&mut self, id: u32) -> Result<(), GraphCrawlError>;
    fn set_vertex_attribute(
        &mut self,
        id: u32,
        key: &str,
        value: &str,
    ) -> Result<(), GraphCrawlError>;
    fn create_edge(&mut self, edge_id: u32, source: u32, target: u32)
    -> Result<(), GraphCrawlError>;
}

pub struct LineRpc<W: Write> {
    writer: W,
}

impl<W: Write> LineRpc<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn send(&mut self, line: &str) -> Result<(), GraphCrawlError> {
        writeln!(self.writer, "{line}").map_err(|e| GraphCrawlError::backend(e.to_string()))
    }
}

impl<W: Write> VertexRpc for LineRpc<W> {
    fn clear(&mut self) -> Result<(), GraphCrawlError> {
        self.send("clear")
    }

    fn create_vertex(&mut self, id: u32) -> Result<(), GraphCrawlError> {
        self.send(&format!("vertex {id}"))
    }

    fn set_vertex_attribute(
        &mut self,
        id: u32,
        key: &str,
        value: &str,
    ) -> Result<(), GraphCrawlError> {
        self.send(&format!("attr {id} {key} {value}"))
    }

    fn create_edge(
        &mut self,
        edge_id: u32,
        source: u32,
        target: u32,
    ) -> Result<(), GraphCrawlError> {
        self.send(&format!("edge {edge_id} {source} {target}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcCall {
    Clear,
    CreateVertex(u32),
    SetAttribute(u32, String, String),
    CreateEdge(u32, u32, u32),
}

/// Captures calls for tests.
#[derive(Default)]
pub struct RecordingRpc {
    calls: Arc<Mutex<Vec<RpcCall>>>,
}

impl RecordingRpc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> Arc<Mutex<Vec<RpcCall>>> {
        Arc::clone(&self.calls)
    }
}

impl VertexRpc for RecordingRpc {
    fn clear(&mut self) -> Result<(), GraphCrawlError> {
        self.calls.lock().push(RpcCall::Clear);
        Ok(())
    }

    fn create_vertex(&mut self, id: u32) -> Result<(), GraphCrawlError> {
        self.calls.lock().push(RpcCall::CreateVertex(id));
        Ok(())
    }

    fn set_vertex_attribute(
        &mut self,
        id: u32,
        key: &str,
        value: &str,
    ) -> Result<(), GraphCrawlError> {
        self.calls
            .lock()
            .push(RpcCall::SetAttribute(id, key.to_string(), value.to_string()));
        Ok(())
    }

    fn create_edge(
        &mut self,
        edge_id: u32,
        source: u32,
        target: u32,
    ) -> Result<(), GraphCrawlError> {
        self.calls
            .lock()
            .push(RpcCall::CreateEdge(edge_id, source, target));
        Ok(())
    }
}

/// Mirror addressing entities by the stable 32-bit hash of their canonical
/// key, so re-sends hit the same vertex without a lookup round-trip.
pub struct VertexRpcMirror<R: VertexRpc> {
    rpc: R,
    node_keys: AHashSet<String>,
    edge_keys: AHashSet<String>,
}

impl<R: VertexRpc> VertexRpcMirror<R> {
    pub fn new(rpc: R) -> Self {
        Self {
            rpc,
            node_keys: AHashSet::new(),
            edge_keys: AHashSet::new(),
        }
    }
}

impl<R: VertexRpc> MirrorBackend for VertexRpcMirror<R> {
    fn name(&self) -> &str {
        "vertex-rpc"
    }

    fn clear(&mut self) -> Result<(), GraphCrawlError> {
        self.node_keys.clear();
        self.edge_keys.clear();
        self.rpc.clear()
    }

    fn add_node(&mut self, node: &CanonicalNode) -> Result<(), GraphCrawlError> {
        if !self.node_keys.insert(node.key.clone()) {
            return Ok(());
        }
        let id = stable_id(&node.key);
        self.rpc.create_vertex(id)?;
        for (name, value) in &node.attrs {
            self.rpc.set_vertex_attribute(id, name, &attr_text(value))?;
        }
        Ok(())
    }

    fn add_edge(&mut self, edge: &CanonicalEdge) -> Result<(), GraphCrawlError> {
        if !self.edge_keys.insert(edge.key.clone()) {
            return Ok(());
        }
        self.rpc.create_edge(
            stable_id(&edge.key),
            stable_id(&edge.source_key),
            stable_id(&edge.target_key),
        )
    }

    fn finish(&mut self) -> Result<(), GraphCrawlError> {
        Ok(())
    }
}
