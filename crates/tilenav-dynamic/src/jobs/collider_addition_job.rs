use crate::colliders::Collider;
use crate::dynamic_tile::{DynamicTile, TileCoord};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Job for adding a collider to dynamic tiles
#[derive(Debug, Clone)]
pub struct ColliderAdditionJob {
    collider_id: u64,
    collider: Arc<dyn Collider>,
    /// Tiles whose bounds the collider overlaps, computed at enqueue time
    affected_tiles: BTreeSet<TileCoord>,
}

impl ColliderAdditionJob {
    pub fn new(
        collider_id: u64,
        collider: Arc<dyn Collider>,
        affected_tiles: BTreeSet<TileCoord>,
    ) -> Self {
        ColliderAdditionJob {
            collider_id,
            collider,
            affected_tiles,
        }
    }

    pub fn collider_id(&self) -> u64 {
        self.collider_id
    }

    pub fn affected_tiles(&self) -> &BTreeSet<TileCoord> {
        &self.affected_tiles
    }

    pub fn process<D>(&self, tile: &mut DynamicTile<D>) {
        tile.add_collider(self.collider_id, Arc::clone(&self.collider));
    }
}
