//! Exact-match lookup-or-create for nodes and edges.
//!
//! Resolution never mutates an existing match. That is the idempotence
//! guarantee callers rely on: resolving the same predicate twice returns the
//! same entity and creates at most one.

use tracing::warn;

use crate::{
    errors::GraphCrawlError,
    store::{AttrMap, GraphStore, StoreEdge, StoreNode},
};

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub entity: T,
    pub existed: bool,
}

/// Looks up a node matching every attribute in `predicate`, creating one
/// carrying exactly `predicate` when nothing matches. With several matches the
/// first in the store's deterministic order wins.
///
/// `filter` optionally narrows the search with a store-native boolean
/// expression. If the store rejects the narrowed query, the lookup is retried
/// once without it; a second failure is fatal.
pub fn resolve_or_create_node<S: GraphStore>(
    store: &S,
    predicate: &AttrMap,
    filter: Option<&str>,
) -> Result<Resolved<StoreNode>, GraphCrawlError> {
    validate_predicate(predicate)?;
    let matches = match store.find_nodes(predicate, filter) {
        Ok(matches) => matches,
        Err(GraphCrawlError::QueryError(msg)) if filter.is_some() => {
            warn!(error = %msg, "narrowed node query rejected, retrying without filter");
            store.find_nodes(predicate, None)?
        }
        Err(other) => return Err(other),
    };
    if let Some(node) = matches.into_iter().next() {
        return Ok(Resolved {
            entity: node,
            existed: true,
        });
    }
    let node = store.create_node(predicate)?;
    Ok(Resolved {
        entity: node,
        existed: false,
    })
}

/// Looks up a directed edge of `rel_type` between the two node ids, optionally
/// narrowed by `predicate` attribute equality, creating it with exactly
/// `predicate` as attributes when absent.
///
/// On the `existed = true` path the passed attributes are silently discarded;
/// the found edge keeps whatever it was created with.
pub fn resolve_or_create_edge<S: GraphStore>(
    store: &S,
    source_id: i64,
    target_id: i64,
    rel_type: &str,
    predicate: &AttrMap,
) -> Result<Resolved<StoreEdge>, GraphCrawlError> {
    if rel_type.trim().is_empty() {
        return Err(GraphCrawlError::invalid_input("edge type must be set"));
    }
    if !predicate.is_empty() {
        validate_predicate(predicate)?;
    }
    let matches = store.find_edges(source_id, target_id, rel_type, predicate)?;
    if let Some(edge) = matches.into_iter().next() {
        return Ok(Resolved {
            entity: edge,
            existed: true,
        });
    }
    let edge = store.create_edge(source_id, target_id, rel_type, predicate)?;
    Ok(Resolved {
        entity: edge,
        existed: false,
    })
}

/// Identity predicates must be non-empty, scalar-valued and keyed by plain
/// identifiers; dots would read as nested JSON paths in the match query.
fn validate_predicate(predicate: &AttrMap) -> Result<(), GraphCrawlError> {
    if predicate.is_empty() {
        return Err(GraphCrawlError::invalid_input(
            "identity predicate must not be empty",
        ));
    }
    for (name, value) in predicate {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(GraphCrawlError::invalid_input(format!(
                "predicate key {name:?} is not a plain identifier"
            )));
        }
        if !(value.is_string() || value.is_number() || value.is_boolean()) {
            return Err(GraphCrawlError::invalid_input(format!(
                "predicate value for {name} must be a scalar"
            )));
        }
    }
    Ok(())
}
