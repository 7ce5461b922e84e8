use crate::dynamic_tile::{DynamicTile, TileCoord};
use std::collections::BTreeSet;

/// Job for removing a collider from dynamic tiles
#[derive(Debug, Clone)]
pub struct ColliderRemovalJob {
    collider_id: u64,
    /// Tiles holding the collider when the removal was requested
    affected_tiles: BTreeSet<TileCoord>,
}

impl ColliderRemovalJob {
    pub fn new(collider_id: u64, affected_tiles: BTreeSet<TileCoord>) -> Self {
        ColliderRemovalJob {
            collider_id,
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
        tile.remove_collider(self.collider_id);
    }
}
