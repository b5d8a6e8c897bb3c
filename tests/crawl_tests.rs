use serde_json::json;

use graphcrawl::{
    AttrMap, CrawlConfig, CrawlMode, CrawlSession, FanoutDispatcher, GraphCrawlError, GraphStore,
    NeighborRow, SqliteStore, StoreEdge, StoreNode, Termination, attrs,
};

/// Nodes `node_1..=node_n`, edges with rel `LINK`. SQLite assigns ids 1..=n
/// in insertion order, so tests can address nodes by number.
fn build_store(nodes: usize, edges: &[(i64, i64)]) -> SqliteStore {
    let store = SqliteStore::open_in_memory().expect("store");
    for idx in 1..=nodes {
        store
            .create_node(&attrs([("name", json!(format!("node_{idx}")))]))
            .expect("node");
    }
    for &(source, target) in edges {
        store
            .create_edge(source, target, "LINK", &AttrMap::new())
            .expect("edge");
    }
    store
}

fn config(mode: CrawlMode, seeds: &[i64], max_depth: u32, restart: u8) -> CrawlConfig {
    CrawlConfig {
        mode,
        seeds: seeds.to_vec(),
        max_depth,
        restart_probability: restart,
        rng_seed: Some(0x5eed),
        ..CrawlConfig::default()
    }
}

fn run(store: SqliteStore, config: CrawlConfig) -> graphcrawl::CrawlOutcome {
    let mut session =
        CrawlSession::new(store, FanoutDispatcher::new(), config).expect("session");
    session.run().expect("run")
}

#[test]
fn test_bfs_visit_order() {
    let store = build_store(4, &[(1, 2), (1, 3), (2, 4)]);
    let outcome = run(store, config(CrawlMode::Bfs, &[1], 0, 0));
    assert_eq!(outcome.expanded, vec![1, 2, 3, 4]);
    assert_eq!(outcome.termination, Termination::FrontierExhausted);
    assert_eq!(outcome.epochs, 0);
}

#[test]
fn test_dfs_visit_order() {
    let store = build_store(4, &[(1, 2), (1, 3), (2, 4)]);
    let outcome = run(store, config(CrawlMode::Dfs, &[1], 0, 0));
    assert_eq!(outcome.expanded, vec![1, 2, 4, 3]);
}

#[test]
fn test_bounded_bfs_stops_at_max_depth() {
    let store = build_store(5, &[(1, 2), (1, 3), (2, 4), (4, 5)]);
    let outcome = run(store, config(CrawlMode::Bfs, &[1], 2, 0));
    // Node 5 sits at depth 3 from the seed and is never expanded.
    assert_eq!(outcome.expanded, vec![1, 2, 3, 4]);
    assert_eq!(outcome.termination, Termination::FrontierExhausted);
}

#[test]
fn test_bounded_dfs_visits_same_set() {
    let store = build_store(5, &[(1, 2), (1, 3), (2, 4), (4, 5)]);
    let outcome = run(store, config(CrawlMode::Dfs, &[1], 2, 0));
    let mut visited = outcome.expanded.clone();
    visited.sort_unstable();
    assert_eq!(visited, vec![1, 2, 3, 4]);
}

#[test]
fn test_bounded_dfs_multiple_seeds() {
    // The second seed starts back at depth 0, not at whatever depth the first
    // seed's subtree ended on.
    let store = build_store(6, &[(1, 2), (2, 3), (4, 5), (5, 6)]);
    let outcome = run(store, config(CrawlMode::Dfs, &[1, 4], 1, 0));
    let mut visited = outcome.expanded.clone();
    visited.sort_unstable();
    assert_eq!(visited, vec![1, 2, 4, 5]);
}

#[test]
fn test_cycle_expands_each_node_once() {
    let store = build_store(3, &[(1, 2), (2, 3), (3, 1)]);
    let outcome = run(store, config(CrawlMode::Bfs, &[1], 0, 0));
    assert_eq!(outcome.expanded, vec![1, 2, 3]);
}

#[test]
fn test_duplicate_frontier_entries_expand_once() {
    // 2 is enqueued by both 1 and 3; the visited check at pop time keeps it
    // to a single expansion.
    let store = build_store(3, &[(1, 2), (1, 3), (3, 2)]);
    let outcome = run(store, config(CrawlMode::Bfs, &[1], 0, 0));
    assert_eq!(outcome.expanded, vec![1, 2, 3]);
}

#[test]
fn test_unknown_seed_is_fatal() {
    let store = build_store(2, &[(1, 2)]);
    let mut session = CrawlSession::new(
        store,
        FanoutDispatcher::new(),
        config(CrawlMode::Bfs, &[99], 0, 0),
    )
    .expect("session");
    assert!(matches!(
        session.run(),
        Err(GraphCrawlError::NotFound(_))
    ));
}

#[test]
fn test_restart_clears_visited_and_permits_reexpansion() {
    // A single isolated node with certain restart: every iteration warps back
    // to it and expands it again in a fresh epoch.
    let store = build_store(1, &[]);
    let mut cfg = config(CrawlMode::Bfs, &[1], 0, 100);
    cfg.step_limit = 5;
    let outcome = run(store, cfg);
    assert_eq!(outcome.termination, Termination::StepLimit);
    assert_eq!(outcome.expanded, vec![1, 1, 1, 1, 1]);
    assert_eq!(outcome.epochs, 5);
}

#[test]
fn test_no_restart_when_depth_bounded() {
    // Restart applies only to unbounded exploration; with a depth bound the
    // crawl drains and terminates even at restart probability 100.
    let store = build_store(3, &[(1, 2), (2, 3)]);
    let outcome = run(store, config(CrawlMode::Bfs, &[1], 1, 100));
    assert_eq!(outcome.expanded, vec![1, 2]);
    assert_eq!(outcome.termination, Termination::FrontierExhausted);
    assert_eq!(outcome.epochs, 0);
}

#[test]
fn test_step_limit_bounds_unattended_run() {
    let store = build_store(5, &[(1, 2), (2, 3), (3, 4), (4, 5), (5, 1)]);
    let mut cfg = config(CrawlMode::Bfs, &[1], 0, 0);
    cfg.step_limit = 3;
    let outcome = run(store, cfg);
    assert_eq!(outcome.expanded, vec![1, 2, 3]);
    assert_eq!(outcome.termination, Termination::StepLimit);
}

#[test]
fn test_walk_follows_chain_and_hits_step_limit() {
    // A cycle keeps the walk moving deterministically (one neighbor each).
    let store = build_store(3, &[(1, 2), (2, 3), (3, 1)]);
    let mut cfg = config(CrawlMode::Walk, &[1], 0, 0);
    cfg.step_limit = 6;
    let outcome = run(store, cfg);
    assert_eq!(outcome.expanded, vec![1, 2, 3, 1, 2, 3]);
    assert_eq!(outcome.termination, Termination::StepLimit);
}

#[test]
fn test_invalid_restart_probability_rejected() {
    let store = build_store(1, &[]);
    let mut cfg = config(CrawlMode::Bfs, &[1], 0, 0);
    cfg.restart_probability = 101;
    assert!(CrawlSession::new(store, FanoutDispatcher::new(), cfg).is_err());
}

/// Store whose aggregate count reports zero, as after concurrent deletions.
struct ZeroCountStore {
    inner: SqliteStore,
}

impl GraphStore for ZeroCountStore {
    fn match_pattern(&self, origin: Option<i64>) -> Result<Vec<NeighborRow>, GraphCrawlError> {
        self.inner.match_pattern(origin)
    }

    fn find_nodes(
        &self,
        predicate: &AttrMap,
        filter: Option<&str>,
    ) -> Result<Vec<StoreNode>, GraphCrawlError> {
        self.inner.find_nodes(predicate, filter)
    }

    fn find_edges(
        &self,
        source_id: i64,
        target_id: i64,
        rel_type: &str,
        predicate: &AttrMap,
    ) -> Result<Vec<StoreEdge>, GraphCrawlError> {
        self.inner.find_edges(source_id, target_id, rel_type, predicate)
    }

    fn get_node(&self, id: i64) -> Result<StoreNode, GraphCrawlError> {
        self.inner.get_node(id)
    }

    fn create_node(&self, attrs: &AttrMap) -> Result<StoreNode, GraphCrawlError> {
        self.inner.create_node(attrs)
    }

    fn create_edge(
        &self,
        source_id: i64,
        target_id: i64,
        rel_type: &str,
        attrs: &AttrMap,
    ) -> Result<StoreEdge, GraphCrawlError> {
        self.inner.create_edge(source_id, target_id, rel_type, attrs)
    }

    fn estimate_node_count(&self) -> Result<i64, GraphCrawlError> {
        Ok(0)
    }

    fn fetch_node_at_offset(&self, offset: i64) -> Result<Option<StoreNode>, GraphCrawlError> {
        self.inner.fetch_node_at_offset(offset)
    }

    fn clear(&self) -> Result<(), GraphCrawlError> {
        self.inner.clear()
    }
}

#[test]
fn test_restart_exhaustion_terminates_search() {
    let store = ZeroCountStore {
        inner: build_store(1, &[]),
    };
    let mut session = CrawlSession::new(
        store,
        FanoutDispatcher::new(),
        config(CrawlMode::Bfs, &[1], 0, 50),
    )
    .expect("session");
    let outcome = session.run().expect("run");
    assert_eq!(outcome.termination, Termination::RestartExhausted);
    assert!(outcome.expanded.len() <= 1);
}

#[test]
fn test_walk_dead_end_with_empty_estimate_terminates() {
    let store = ZeroCountStore {
        inner: build_store(3, &[(1, 2), (2, 3)]),
    };
    let mut cfg = config(CrawlMode::Walk, &[1], 0, 0);
    cfg.step_limit = 10;
    let mut session = CrawlSession::new(store, FanoutDispatcher::new(), cfg).expect("session");
    let outcome = session.run().expect("run");
    assert_eq!(outcome.expanded, vec![1, 2, 3]);
    assert_eq!(outcome.termination, Termination::RestartExhausted);
}
