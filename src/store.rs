use serde::{Deserialize, Serialize};

use crate::errors::GraphCrawlError;

/// Attribute maps use `serde_json::Map`, which iterates in sorted key order,
/// so canonical keys derived from them are stable.
pub type AttrMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreNode {
    pub id: i64,
    pub attrs: AttrMap,
}

impl StoreNode {
    /// The optional class/type tag is carried as a plain attribute.
    pub fn class(&self) -> Option<&str> {
        self.attrs.get("class").and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreEdge {
    pub id: i64,
    pub source_id: i64,
    pub target_id: i64,
    pub rel_type: String,
    pub attrs: AttrMap,
}

/// One row of the store's outgoing-neighbor pattern match.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborRow {
    pub origin_id: i64,
    pub rel_attrs: AttrMap,
    pub rel_type: String,
    pub target_attrs: AttrMap,
    pub target_id: i64,
}

/// Capability surface the crawler needs from a durable graph store.
pub trait GraphStore {
    /// Outgoing `(origin)-[rel]->(target)` rows; `None` matches every origin.
    fn match_pattern(&self, origin: Option<i64>) -> Result<Vec<NeighborRow>, GraphCrawlError>;

    /// Exact-match query: a candidate node must carry every predicate key with
    /// an equal value (extra attributes are fine). `filter` is an optional
    /// store-native boolean expression narrowing the match; the store may
    /// reject an invalid expression with a query error. Results come back in
    /// the store's deterministic order.
    fn find_nodes(
        &self,
        predicate: &AttrMap,
        filter: Option<&str>,
    ) -> Result<Vec<StoreNode>, GraphCrawlError>;

    fn find_edges(
        &self,
        source_id: i64,
        target_id: i64,
        rel_type: &str,
        predicate: &AttrMap,
    ) -> Result<Vec<StoreEdge>, GraphCrawlError>;

    fn get_node(&self, id: i64) -> Result<StoreNode, GraphCrawlError>;

    fn create_node(&self, attrs: &AttrMap) -> Result<StoreNode, GraphCrawlError>;

    fn create_edge(
        &self,
        source_id: i64,
        target_id: i64,
        rel_type: &str,
        attrs: &AttrMap,
    ) -> Result<StoreEdge, GraphCrawlError>;

    /// Possibly stale aggregate count, used only for restart sampling.
    fn estimate_node_count(&self) -> Result<i64, GraphCrawlError>;

    /// The node at `offset` in an unordered full scan, if any.
    fn fetch_node_at_offset(&self, offset: i64) -> Result<Option<StoreNode>, GraphCrawlError>;

    fn clear(&self) -> Result<(), GraphCrawlError>;
}

impl<S: GraphStore> GraphStore for &S {
    fn match_pattern(&self, origin: Option<i64>) -> Result<Vec<NeighborRow>, GraphCrawlError> {
        (*self).match_pattern(origin)
    }

    fn find_nodes(
        &self,
        predicate: &AttrMap,
        filter: Option<&str>,
    ) -> Result<Vec<StoreNode>, GraphCrawlError> {
        (*self).find_nodes(predicate, filter)
    }

    fn find_edges(
        &self,
        source_id: i64,
        target_id: i64,
        rel_type: &str,
        predicate: &AttrMap,
    ) -> Result<Vec<StoreEdge>, GraphCrawlError> {
        (*self).find_edges(source_id, target_id, rel_type, predicate)
    }

    fn get_node(&self, id: i64) -> Result<StoreNode, GraphCrawlError> {
        (*self).get_node(id)
    }

    fn create_node(&self, attrs: &AttrMap) -> Result<StoreNode, GraphCrawlError> {
        (*self).create_node(attrs)
    }

    fn create_edge(
        &self,
        source_id: i64,
        target_id: i64,
        rel_type: &str,
        attrs: &AttrMap,
    ) -> Result<StoreEdge, GraphCrawlError> {
        (*self).create_edge(source_id, target_id, rel_type, attrs)
    }

    fn estimate_node_count(&self) -> Result<i64, GraphCrawlError> {
        (*self).estimate_node_count()
    }

    fn fetch_node_at_offset(&self, offset: i64) -> Result<Option<StoreNode>, GraphCrawlError> {
        (*self).fetch_node_at_offset(offset)
    }

    fn clear(&self) -> Result<(), GraphCrawlError> {
        (*self).clear()
    }
}

/// Builds an `AttrMap` from key/value pairs; values go through `Into<Value>`.
pub fn attrs<K, V, I>(pairs: I) -> AttrMap
where
    K: Into<String>,
    V: Into<serde_json::Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
