use std::collections::HashSet;
use std::sync::Arc;
use tilenav_common::Heightfield;

/// Heightfield snapshot taken after a tile build
///
/// Holds the heightfield with every collider in `colliders` already
/// rasterized, so the next build only has to add colliders that arrived
/// since. The snapshot stays valid for as long as colliders are only added
/// to the tile; a removal cannot be undone on a heightfield and discards it.
#[derive(Debug, Clone)]
pub struct DynamicTileCheckpoint {
    /// Snapshot of the heightfield state
    pub heightfield: Arc<Heightfield>,
    /// Collider ids already baked into `heightfield`
    pub colliders: HashSet<u64>,
}

impl DynamicTileCheckpoint {
    pub fn new(heightfield: Arc<Heightfield>, colliders: HashSet<u64>) -> Self {
        DynamicTileCheckpoint {
            heightfield,
            colliders,
        }
    }

    /// Whether the collider is already part of the snapshot
    pub fn contains(&self, collider_id: u64) -> bool {
        self.colliders.contains(&collider_id)
    }
}
