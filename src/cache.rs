use ahash::AHashMap;
use parking_lot::RwLock;

use crate::store::NeighborRow;

/// Per-origin cache of pattern-match rows, cleared on every write.
#[derive(Default)]
pub struct NeighborCache {
    inner: RwLock<AHashMap<i64, Vec<NeighborRow>>>,
}

impl NeighborCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(AHashMap::new()),
        }
    }

    pub fn get(&self, origin: i64) -> Option<Vec<NeighborRow>> {
        self.inner.read().get(&origin).cloned()
    }

    pub fn insert(&self, origin: i64, rows: Vec<NeighborRow>) {
        self.inner.write().insert(origin, rows);
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }
}
