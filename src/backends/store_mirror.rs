use ahash::{AHashMap, AHashSet};
use serde_json::json;

use crate::{
    errors::GraphCrawlError,
    fanout::{CanonicalEdge, CanonicalNode, MirrorBackend},
    resolver::{resolve_or_create_edge, resolve_or_create_node},
    store::GraphStore,
};

/// Mirror into a second durable store. The store assigns its own ids, so
/// identity is delegated to the resolver and a canonical-key map re-addresses
/// edge endpoints on later sends.
pub struct StoreMirror<S: GraphStore> {
    store: S,
    ids: AHashMap<String, i64>,
    edge_keys: AHashSet<String>,
}

impl<S: GraphStore> StoreMirror<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            ids: AHashMap::new(),
            edge_keys: AHashSet::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: GraphStore> MirrorBackend for StoreMirror<S> {
    fn name(&self) -> &str {
        "store-mirror"
    }

    fn clear(&mut self) -> Result<(), GraphCrawlError> {
        self.ids.clear();
        self.edge_keys.clear();
        self.store.clear()
    }

    fn add_node(&mut self, node: &CanonicalNode) -> Result<(), GraphCrawlError> {
        if self.ids.contains_key(&node.key) {
            return Ok(());
        }
        // Attribute-less nodes have nothing to match on; their canonical key
        // stands in as the identity attribute.
        let resolved = if node.attrs.is_empty() {
            let predicate = [("key".to_string(), json!(node.key))].into_iter().collect();
            resolve_or_create_node(&self.store, &predicate, None)?
        } else {
            resolve_or_create_node(&self.store, &node.attrs, None)?
        };
        self.ids.insert(node.key.clone(), resolved.entity.id);
        Ok(())
    }

    fn add_edge(&mut self, edge: &CanonicalEdge) -> Result<(), GraphCrawlError> {
        if self.edge_keys.contains(&edge.key) {
            return Ok(());
        }
        let source_id = *self.ids.get(&edge.source_key).ok_or_else(|| {
            GraphCrawlError::backend(format!("unknown edge source {}", edge.source_key))
        })?;
        let target_id = *self.ids.get(&edge.target_key).ok_or_else(|| {
            GraphCrawlError::backend(format!("unknown edge target {}", edge.target_key))
        })?;
        resolve_or_create_edge(&self.store, source_id, target_id, &edge.rel_type, &edge.attrs)?;
        self.edge_keys.insert(edge.key.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), GraphCrawlError> {
        Ok(())
    }
}
