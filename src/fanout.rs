//! Replicates resolved entities into every configured mirror backend.
//!
//! Each backend write is an independent error boundary: a failure is logged,
//! recorded in that backend's status, and never stops the remaining backends
//! or the crawl. Cross-backend atomicity is explicitly not provided.

use tracing::warn;

use crate::{errors::GraphCrawlError, store::AttrMap};

/// A node as every backend sees it: the backend-agnostic key plus the full
/// attribute payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalNode {
    pub key: String,
    pub attrs: AttrMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalEdge {
    pub key: String,
    pub source_key: String,
    pub target_key: String,
    pub rel_type: String,
    pub attrs: AttrMap,
}

/// One independent graph representation mirroring the canonical graph.
///
/// Implementations must be idempotent per canonical key: an already-known
/// entity is not re-created and its attributes are not merged.
pub trait MirrorBackend {
    fn name(&self) -> &str;

    /// Wipes the backend at setup. Backends without a wipe primitive may
    /// treat this as a no-op.
    fn clear(&mut self) -> Result<(), GraphCrawlError>;

    fn add_node(&mut self, node: &CanonicalNode) -> Result<(), GraphCrawlError>;

    fn add_edge(&mut self, edge: &CanonicalEdge) -> Result<(), GraphCrawlError>;

    /// Terminal side effect at crawl completion (e.g. writing an export file).
    fn finish(&mut self) -> Result<(), GraphCrawlError>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackendStatus {
    pub name: String,
    pub nodes_written: usize,
    pub edges_written: usize,
    pub failures: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplicationReport {
    pub backends: Vec<BackendStatus>,
}

impl ReplicationReport {
    pub fn total_failures(&self) -> usize {
        self.backends.iter().map(|b| b.failures).sum()
    }
}

pub struct FanoutDispatcher {
    backends: Vec<Box<dyn MirrorBackend>>,
    statuses: Vec<BackendStatus>,
}

impl FanoutDispatcher {
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
            statuses: Vec::new(),
        }
    }

    pub fn add_backend(&mut self, backend: Box<dyn MirrorBackend>) {
        self.statuses.push(BackendStatus {
            name: backend.name().to_string(),
            ..BackendStatus::default()
        });
        self.backends.push(backend);
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    pub fn clear_all(&mut self) {
        for (backend, status) in self.backends.iter_mut().zip(self.statuses.iter_mut()) {
            if let Err(err) = backend.clear() {
                warn!(backend = status.name.as_str(), error = %err, "clear failed");
                status.failures += 1;
            }
        }
    }

    pub fn replicate_node(&mut self, node: &CanonicalNode) {
        for (backend, status) in self.backends.iter_mut().zip(self.statuses.iter_mut()) {
            match backend.add_node(node) {
                Ok(()) => status.nodes_written += 1,
                Err(err) => {
                    warn!(
                        backend = status.name.as_str(),
                        key = node.key.as_str(),
                        error = %err,
                        "node replication failed"
                    );
                    status.failures += 1;
                }
            }
        }
    }

    pub fn replicate_edge(&mut self, edge: &CanonicalEdge) {
        for (backend, status) in self.backends.iter_mut().zip(self.statuses.iter_mut()) {
            match backend.add_edge(edge) {
                Ok(()) => status.edges_written += 1,
                Err(err) => {
                    warn!(
                        backend = status.name.as_str(),
                        key = edge.key.as_str(),
                        error = %err,
                        "edge replication failed"
                    );
                    status.failures += 1;
                }
            }
        }
    }

    pub fn finish_all(&mut self) {
        for (backend, status) in self.backends.iter_mut().zip(self.statuses.iter_mut()) {
            if let Err(err) = backend.finish() {
                warn!(backend = status.name.as_str(), error = %err, "finish failed");
                status.failures += 1;
            }
        }
    }

    pub fn report(&self) -> ReplicationReport {
        ReplicationReport {
            backends: self.statuses.clone(),
        }
    }
}

impl Default for FanoutDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
