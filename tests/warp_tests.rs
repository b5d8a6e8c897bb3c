use rand::{SeedableRng, rngs::StdRng};
use serde_json::json;

use graphcrawl::{
    AttrMap, GraphCrawlError, GraphStore, NeighborRow, SqliteStore, StoreEdge, StoreNode, attrs,
    warp::warp,
};

fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

#[test]
fn test_warp_returns_some_node_from_populated_store() {
    let store = SqliteStore::open_in_memory().expect("store");
    let mut ids = Vec::new();
    for idx in 0..5 {
        let node = store
            .create_node(&attrs([("name", json!(format!("n{idx}")))]))
            .expect("node");
        ids.push(node.id);
    }
    let picked = warp(&store, &mut seeded_rng()).expect("warp");
    assert!(ids.contains(&picked.expect("some node")));
}

#[test]
fn test_warp_on_empty_store_is_absent_not_zero() {
    let store = SqliteStore::open_in_memory().expect("store");
    let picked = warp(&store, &mut seeded_rng()).expect("warp");
    assert_eq!(picked, None);
}

/// Reports a stale count larger than the population and returns no row for
/// any offset, as if concurrent deletions emptied the store.
struct StaleCountStore;

impl GraphStore for StaleCountStore {
    fn match_pattern(&self, _origin: Option<i64>) -> Result<Vec<NeighborRow>, GraphCrawlError> {
        Ok(Vec::new())
    }

    fn find_nodes(
        &self,
        _predicate: &AttrMap,
        _filter: Option<&str>,
    ) -> Result<Vec<StoreNode>, GraphCrawlError> {
        Ok(Vec::new())
    }

    fn find_edges(
        &self,
        _source_id: i64,
        _target_id: i64,
        _rel_type: &str,
        _predicate: &AttrMap,
    ) -> Result<Vec<StoreEdge>, GraphCrawlError> {
        Ok(Vec::new())
    }

    fn get_node(&self, id: i64) -> Result<StoreNode, GraphCrawlError> {
        Err(GraphCrawlError::not_found(format!("node {id}")))
    }

    fn create_node(&self, _attrs: &AttrMap) -> Result<StoreNode, GraphCrawlError> {
        Err(GraphCrawlError::query("read only"))
    }

    fn create_edge(
        &self,
        _source_id: i64,
        _target_id: i64,
        _rel_type: &str,
        _attrs: &AttrMap,
    ) -> Result<StoreEdge, GraphCrawlError> {
        Err(GraphCrawlError::query("read only"))
    }

    fn estimate_node_count(&self) -> Result<i64, GraphCrawlError> {
        Ok(1000)
    }

    fn fetch_node_at_offset(&self, _offset: i64) -> Result<Option<StoreNode>, GraphCrawlError> {
        Ok(None)
    }

    fn clear(&self) -> Result<(), GraphCrawlError> {
        Ok(())
    }
}

#[test]
fn test_warp_gives_up_after_bounded_attempts() {
    let picked = warp(&StaleCountStore, &mut seeded_rng()).expect("warp");
    assert_eq!(picked, None);
}

#[test]
fn test_warp_single_node_store_always_finds_it() {
    let store = SqliteStore::open_in_memory().expect("store");
    let node = store
        .create_node(&attrs([("name", json!("only"))]))
        .expect("node");
    for seed in 0..10u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        assert_eq!(warp(&store, &mut rng).expect("warp"), Some(node.id));
    }
}
