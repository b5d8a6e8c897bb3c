//! Crawls a property graph held in a durable store and mirrors every
//! discovered node and edge into independent backend graphs, without creating
//! duplicates and without getting stuck in one region of a large graph.

pub mod backends;
pub mod cache;
pub mod canonical;
pub mod config;
pub mod crawl;
pub mod errors;
pub mod fanout;
pub mod frontier;
pub mod gexf;
pub mod paths;
pub mod resolver;
pub mod schema;
pub mod sqlite_store;
pub mod store;
pub mod warp;

pub use crate::config::{AppConfig, BackendConfig, CrawlConfig, CrawlMode, ImportConfig};
pub use crate::crawl::{CrawlOutcome, CrawlSession, Termination};
pub use crate::errors::GraphCrawlError;
pub use crate::fanout::{
    BackendStatus, CanonicalEdge, CanonicalNode, FanoutDispatcher, MirrorBackend,
    ReplicationReport,
};
pub use crate::frontier::{Frontier, FrontierItem};
pub use crate::resolver::{Resolved, resolve_or_create_edge, resolve_or_create_node};
pub use crate::sqlite_store::SqliteStore;
pub use crate::store::{AttrMap, GraphStore, NeighborRow, StoreEdge, StoreNode, attrs};
