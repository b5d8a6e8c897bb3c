//! The traversal engine: SEEDING -> EXPANDING -> (MAYBE_RESTART) -> TERMINATED.
//!
//! All crawl state lives in one owned session. Visited-set membership is
//! checked when an item is popped, never when it is enqueued, so a node may
//! sit in the frontier several times but expands once per epoch.

use std::{thread, time::Duration};

use ahash::{AHashMap, AHashSet};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::{
    canonical,
    config::{CrawlConfig, CrawlMode},
    errors::GraphCrawlError,
    fanout::{CanonicalEdge, CanonicalNode, FanoutDispatcher, ReplicationReport},
    frontier::{Frontier, FrontierItem},
    store::{AttrMap, GraphStore, NeighborRow},
    warp::warp,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Frontier drained with no restart applicable.
    FrontierExhausted,
    /// The restart policy could not supply a node. A graceful stop, not an
    /// error.
    RestartExhausted,
    /// The configured expansion bound was reached.
    StepLimit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOutcome {
    pub termination: Termination,
    /// Node ids in expansion order, across all epochs.
    pub expanded: Vec<i64>,
    pub steps: usize,
    pub epochs: u64,
}

pub struct CrawlSession<S: GraphStore> {
    store: S,
    dispatcher: FanoutDispatcher,
    config: CrawlConfig,
    frontier: Frontier,
    visited: AHashSet<i64>,
    keys: AHashMap<i64, String>,
    depth: u32,
    epoch: u64,
    rng: StdRng,
}

impl<S: GraphStore> CrawlSession<S> {
    pub fn new(
        store: S,
        dispatcher: FanoutDispatcher,
        config: CrawlConfig,
    ) -> Result<Self, GraphCrawlError> {
        config.validate().map_err(GraphCrawlError::invalid_input)?;
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            store,
            dispatcher,
            config,
            frontier: Frontier::new(),
            visited: AHashSet::new(),
            keys: AHashMap::new(),
            depth: 0,
            epoch: 0,
            rng,
        })
    }

    pub fn report(&self) -> ReplicationReport {
        self.dispatcher.report()
    }

    /// Runs the crawl to termination. Backend `finish` hooks (e.g. the GEXF
    /// export) run once on the way out, whatever ended the crawl.
    pub fn run(&mut self) -> Result<CrawlOutcome, GraphCrawlError> {
        self.seed()?;
        let outcome = match self.config.mode {
            CrawlMode::Bfs | CrawlMode::Dfs => self.run_search(),
            CrawlMode::Walk => self.run_walk(),
        }?;
        self.dispatcher.finish_all();
        info!(
            steps = outcome.steps,
            epochs = outcome.epochs,
            termination = ?outcome.termination,
            "crawl terminated"
        );
        Ok(outcome)
    }

    /// Unknown seed ids are fatal; seed nodes are replicated before the first
    /// expansion.
    fn seed(&mut self) -> Result<(), GraphCrawlError> {
        let seeds = self.config.seeds.clone();
        for id in seeds {
            let node = self.store.get_node(id)?;
            self.replicate_node(id, &node.attrs);
            self.frontier.push_back(FrontierItem::NodeRef(id));
        }
        Ok(())
    }

    fn run_search(&mut self) -> Result<CrawlOutcome, GraphCrawlError> {
        let restart_allowed =
            self.config.max_depth == 0 && self.config.restart_probability > 0;
        let mut expanded = Vec::new();
        let termination = loop {
            if self.step_limit_reached(expanded.len()) {
                break Termination::StepLimit;
            }
            if restart_allowed {
                let roll = self.rng.gen_range(0..100u8);
                if self.frontier.is_empty() || roll < self.config.restart_probability {
                    if !self.restart()? {
                        break Termination::RestartExhausted;
                    }
                }
            }
            let Some(item) = self.frontier.pop() else {
                break Termination::FrontierExhausted;
            };
            match item {
                // Depth accounting happens unconditionally on marker pop,
                // independent of what follows in the frontier.
                FrontierItem::DepthMarker(depth) => {
                    self.depth = depth;
                }
                FrontierItem::NodeRef(id) => {
                    if !self.visited.insert(id) {
                        continue;
                    }
                    expanded.push(id);
                    self.expand(id)?;
                    self.pace(self.config.pace_ms);
                }
            }
        };
        Ok(CrawlOutcome {
            termination,
            steps: expanded.len(),
            expanded,
            epochs: self.epoch,
        })
    }

    /// Expands one node: every neighbor edge is replicated; a neighbor node is
    /// replicated unless it was already expanded this epoch. Children are
    /// enqueued only while the depth bound allows.
    fn expand(&mut self, id: i64) -> Result<(), GraphCrawlError> {
        let rows = self.store.match_pattern(Some(id))?;
        debug!(node = id, depth = self.depth, neighbors = rows.len(), "expanding");
        for row in &rows {
            if !self.visited.contains(&row.target_id) {
                self.replicate_node(row.target_id, &row.target_attrs);
            }
            self.replicate_edge(row);
        }
        let children: Vec<FrontierItem> = rows
            .iter()
            .map(|row| FrontierItem::NodeRef(row.target_id))
            .collect();
        match self.config.mode {
            CrawlMode::Bfs => {
                if self.config.max_depth == 0 {
                    for child in children {
                        self.frontier.push_back(child);
                    }
                } else if self.depth < self.config.max_depth {
                    self.frontier
                        .push_back(FrontierItem::DepthMarker(self.depth + 1));
                    for child in children {
                        self.frontier.push_back(child);
                    }
                }
            }
            CrawlMode::Dfs => {
                if self.config.max_depth == 0 {
                    self.frontier.push_front_all(children);
                } else if self.depth < self.config.max_depth {
                    // Entry marker ahead of the children, resume marker behind
                    // them, so popping a marker always lands on the exact
                    // current depth.
                    let mut block = Vec::with_capacity(children.len() + 2);
                    block.push(FrontierItem::DepthMarker(self.depth + 1));
                    block.extend(children);
                    block.push(FrontierItem::DepthMarker(self.depth));
                    self.frontier.push_front_all(block);
                }
            }
            CrawlMode::Walk => unreachable!("walk mode does not use the frontier"),
        }
        Ok(())
    }

    /// Random walk: one uniformly random neighbor per step, no visited set,
    /// warp on a dead end or a successful roll.
    fn run_walk(&mut self) -> Result<CrawlOutcome, GraphCrawlError> {
        self.frontier.clear();
        let mut current = self.config.seeds[0];
        let mut expanded = Vec::new();
        let termination = loop {
            if self.step_limit_reached(expanded.len()) {
                break Termination::StepLimit;
            }
            if self.config.restart_probability > 0 {
                let roll = self.rng.gen_range(0..100u8);
                if roll < self.config.restart_probability {
                    match self.jump()? {
                        Some(id) => {
                            current = id;
                        }
                        None => break Termination::RestartExhausted,
                    }
                }
            }
            expanded.push(current);
            let rows = self.store.match_pattern(Some(current))?;
            if rows.is_empty() {
                match self.jump()? {
                    Some(id) => {
                        current = id;
                        continue;
                    }
                    None => break Termination::RestartExhausted,
                }
            }
            let row = rows[self.rng.gen_range(0..rows.len())].clone();
            self.replicate_node(row.target_id, &row.target_attrs);
            self.replicate_edge(&row);
            current = row.target_id;
            self.pace(self.config.pace_ms);
        };
        Ok(CrawlOutcome {
            termination,
            steps: expanded.len(),
            expanded,
            epochs: self.epoch,
        })
    }

    /// Discards the frontier, clears the visited set and seeds a fresh epoch
    /// from the restart policy. Returns false when no node could be drawn.
    fn restart(&mut self) -> Result<bool, GraphCrawlError> {
        self.frontier.clear();
        self.visited.clear();
        self.depth = 0;
        match warp(&self.store, &mut self.rng)? {
            Some(id) => {
                self.epoch += 1;
                info!(seed = id, epoch = self.epoch, "restarting from random node");
                let node = self.store.get_node(id)?;
                self.replicate_node(id, &node.attrs);
                self.frontier.push_back(FrontierItem::NodeRef(id));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Walk-mode restart: draw a random node and replicate it.
    fn jump(&mut self) -> Result<Option<i64>, GraphCrawlError> {
        match warp(&self.store, &mut self.rng)? {
            Some(id) => {
                self.epoch += 1;
                info!(seed = id, epoch = self.epoch, "walk warped to random node");
                let node = self.store.get_node(id)?;
                self.replicate_node(id, &node.attrs);
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    fn replicate_node(&mut self, id: i64, attrs: &AttrMap) {
        let key = self.key_for(id, attrs);
        self.dispatcher.replicate_node(&CanonicalNode {
            key,
            attrs: attrs.clone(),
        });
    }

    fn replicate_edge(&mut self, row: &NeighborRow) {
        let source_key = self.key_for(row.origin_id, &AttrMap::new());
        let target_key = self.key_for(row.target_id, &row.target_attrs);
        let key = canonical::edge_key(&source_key, &target_key, &row.rel_type);
        self.dispatcher.replicate_edge(&CanonicalEdge {
            key,
            source_key,
            target_key,
            rel_type: row.rel_type.clone(),
            attrs: row.rel_attrs.clone(),
        });
    }

    /// Canonical key for a store node, cached per id. Attribute-less nodes
    /// fall back to an id-derived key so they stay distinguishable.
    fn key_for(&mut self, id: i64, attrs: &AttrMap) -> String {
        if let Some(key) = self.keys.get(&id) {
            return key.clone();
        }
        let key = if attrs.is_empty() {
            format!("n{id}")
        } else {
            canonical::node_key(attrs)
        };
        self.keys.insert(id, key.clone());
        key
    }

    fn step_limit_reached(&self, steps: usize) -> bool {
        self.config.step_limit > 0 && steps >= self.config.step_limit
    }

    fn pace(&self, ms: u64) {
        if ms > 0 {
            thread::sleep(Duration::from_millis(ms));
        }
    }
}
