use super::{ColliderAdditionJob, ColliderRemovalJob};
use crate::dynamic_tile::{DynamicTile, TileCoord};
use std::collections::BTreeSet;

/// A pending change to the tiles of a dynamic navmesh
#[derive(Debug, Clone)]
pub enum DynamicTileJob {
    AddCollider(ColliderAdditionJob),
    RemoveCollider(ColliderRemovalJob),
}

impl DynamicTileJob {
    /// Tiles the job has to be applied to
    pub fn affected_tiles(&self) -> &BTreeSet<TileCoord> {
        match self {
            DynamicTileJob::AddCollider(job) => job.affected_tiles(),
            DynamicTileJob::RemoveCollider(job) => job.affected_tiles(),
        }
    }

    /// Applies the job to one of its affected tiles
    pub fn process<D>(&self, tile: &mut DynamicTile<D>) {
        match self {
            DynamicTileJob::AddCollider(job) => job.process(tile),
            DynamicTileJob::RemoveCollider(job) => job.process(tile),
        }
    }

    pub fn description(&self) -> String {
        match self {
            DynamicTileJob::AddCollider(job) => format!(
                "Add collider {} to {} tiles",
                job.collider_id(),
                job.affected_tiles().len()
            ),
            DynamicTileJob::RemoveCollider(job) => format!(
                "Remove collider {} from {} tiles",
                job.collider_id(),
                job.affected_tiles().len()
            ),
        }
    }
}

impl From<ColliderAdditionJob> for DynamicTileJob {
    fn from(job: ColliderAdditionJob) -> Self {
        DynamicTileJob::AddCollider(job)
    }
}

impl From<ColliderRemovalJob> for DynamicTileJob {
    fn from(job: ColliderRemovalJob) -> Self {
        DynamicTileJob::RemoveCollider(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colliders::{BoxCollider, Collider};
    use crate::test_helpers::ground_tile;
    use glam::Vec3;
    use std::sync::Arc;

    #[test]
    fn test_add_then_remove() {
        let tiles: BTreeSet<TileCoord> = [TileCoord::new(0, 0)].into_iter().collect();
        let collider: Arc<dyn Collider> = Arc::new(BoxCollider::new(Vec3::ONE, Vec3::ONE, 0, 1.0));
        let add = DynamicTileJob::from(ColliderAdditionJob::new(5, collider, tiles.clone()));
        let remove = DynamicTileJob::from(ColliderRemovalJob::new(5, tiles));

        let mut tile = DynamicTile::<()>::new(ground_tile(0, 0)).unwrap();
        add.process(&mut tile);
        assert!(tile.contains_collider(5));
        remove.process(&mut tile);
        assert!(!tile.contains_collider(5));

        assert_eq!(add.description(), "Add collider 5 to 1 tiles");
        assert_eq!(remove.description(), "Remove collider 5 from 1 tiles");
    }
}
