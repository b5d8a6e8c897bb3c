//! Restart sampling: an approximately uniform random draw over the store's
//! node population, built from a possibly stale count estimate and an
//! offset fetch into an unordered scan.

use rand::Rng;

use crate::{errors::GraphCrawlError, store::GraphStore};

pub const WARP_ATTEMPTS: usize = 10;

/// Draws a random node id, or `None` when the store looks empty or every
/// attempt missed (concurrent deletions can shrink the store below the
/// estimate). Absence is explicit; 0 can be a legitimate node id and is never
/// used as a fallback.
pub fn warp<S: GraphStore, R: Rng>(
    store: &S,
    rng: &mut R,
) -> Result<Option<i64>, GraphCrawlError> {
    let count = store.estimate_node_count()?;
    if count <= 0 {
        return Ok(None);
    }
    for _ in 0..WARP_ATTEMPTS {
        let offset = rng.gen_range(0..count);
        if let Some(node) = store.fetch_node_at_offset(offset)? {
            return Ok(Some(node.id));
        }
    }
    Ok(None)
}
