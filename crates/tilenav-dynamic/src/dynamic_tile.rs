//! Dynamic tile implementation
//!
//! A dynamic tile owns the pristine voxels of one tile, the colliders that
//! currently overlap it and the navmesh data of its last build.

use crate::checkpoint::DynamicTileCheckpoint;
use crate::colliders::{utils, Collider};
use crate::config::{DynamicNavMeshConfig, TileBuildConfig};
use crate::io::VoxelTile;
use crate::mesh::{NavMeshBackend, NavMeshCreateParams, TileBuildResult, TileMeshBuilder};
use glam::Vec3;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tilenav_common::{Heightfield, Result};

/// Integer coordinate of a tile in the XZ tile grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: i32,
    pub z: i32,
}

impl TileCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Packs the coordinate as `(z << 32) | x`.
    ///
    /// `x` occupies the low half as its unsigned bit pattern, so every
    /// `(x, z)` pair maps to a distinct key.
    pub fn key(self) -> i64 {
        ((self.z as i64) << 32) | (self.x as u32 as i64)
    }

    pub fn from_key(key: i64) -> Self {
        Self {
            x: key as i32,
            z: (key >> 32) as i32,
        }
    }
}

/// What a tile keeps from its last build when intermediate results are
/// enabled
#[derive(Debug, Clone)]
pub struct TileIntermediateResults {
    pub heightfield: Arc<Heightfield>,
    pub build_result: Option<TileBuildResult>,
}

pub struct DynamicTile<D> {
    voxel_tile: Arc<VoxelTile>,
    heightfield: Arc<Heightfield>,
    checkpoint: Option<DynamicTileCheckpoint>,
    colliders: BTreeMap<u64, Arc<dyn Collider>>,
    mesh_data: Option<D>,
    intermediate: Option<TileIntermediateResults>,
    dirty: bool,
}

impl<D> DynamicTile<D> {
    /// Creates a tile over `voxel_tile`, decoding its spans once up front
    pub fn new(voxel_tile: VoxelTile) -> Result<Self> {
        let heightfield = Arc::new(voxel_tile.heightfield()?);
        Ok(Self {
            voxel_tile: Arc::new(voxel_tile),
            heightfield,
            checkpoint: None,
            colliders: BTreeMap::new(),
            mesh_data: None,
            intermediate: None,
            dirty: true,
        })
    }

    pub fn coord(&self) -> TileCoord {
        TileCoord::new(self.voxel_tile.tile_x, self.voxel_tile.tile_z)
    }

    pub fn voxel_tile(&self) -> &VoxelTile {
        &self.voxel_tile
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn checkpoint(&self) -> Option<&DynamicTileCheckpoint> {
        self.checkpoint.as_ref()
    }

    pub fn mesh_data(&self) -> Option<&D> {
        self.mesh_data.as_ref()
    }

    pub fn intermediate(&self) -> Option<&TileIntermediateResults> {
        self.intermediate.as_ref()
    }

    pub fn collider_count(&self) -> usize {
        self.colliders.len()
    }

    pub fn collider_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.colliders.keys().copied()
    }

    pub fn contains_collider(&self, id: u64) -> bool {
        self.colliders.contains_key(&id)
    }

    /// Registers a collider; it is rasterized on the next build
    pub fn add_collider(&mut self, id: u64, collider: Arc<dyn Collider>) {
        self.colliders.insert(id, collider);
        self.dirty = true;
    }

    /// Unregisters a collider, dropping the checkpoint it may be baked into
    pub fn remove_collider(&mut self, id: u64) -> bool {
        if self.colliders.remove(&id).is_none() {
            return false;
        }
        self.dirty = true;
        self.checkpoint = None;
        true
    }

    /// Inclusive XZ overlap between an AABB and the tile bounds
    pub fn intersects_xz(&self, min: Vec3, max: Vec3) -> bool {
        utils::overlap_xz(min, max, self.voxel_tile.bounds_min, self.voxel_tile.bounds_max)
    }

    /// Heightfield matching the tile's last build, if one is known
    pub fn query_heightfield(&self) -> Option<Arc<Heightfield>> {
        if let Some(checkpoint) = &self.checkpoint {
            return Some(Arc::clone(&checkpoint.heightfield));
        }
        if let Some(intermediate) = &self.intermediate {
            return Some(Arc::clone(&intermediate.heightfield));
        }
        self.colliders
            .is_empty()
            .then(|| Arc::clone(&self.heightfield))
    }

    /// Voxel tile holding the tile's current heightfield
    pub fn to_voxel_tile(&self) -> VoxelTile {
        match self.query_heightfield() {
            Some(hf) if !Arc::ptr_eq(&hf, &self.heightfield) => {
                VoxelTile::from_heightfield(self.voxel_tile.tile_x, self.voxel_tile.tile_z, &hf)
            }
            _ => VoxelTile::clone(&self.voxel_tile),
        }
    }

    /// Rebuilds the tile if it is dirty.
    ///
    /// Returns whether anything was rebuilt. A failed build leaves the tile
    /// dirty.
    pub fn build<B>(
        &mut self,
        builder: &dyn TileMeshBuilder,
        backend: &B,
        config: &DynamicNavMeshConfig,
    ) -> Result<bool>
    where
        B: NavMeshBackend<MeshData = D> + ?Sized,
    {
        if !self.dirty {
            return Ok(false);
        }

        let heightfield = Arc::new(self.rasterize_colliders()?);
        if config.enable_checkpoints {
            self.checkpoint = Some(DynamicTileCheckpoint::new(
                Arc::clone(&heightfield),
                self.colliders.keys().copied().collect(),
            ));
        }

        let mut build_config = TileBuildConfig::new(config, &self.voxel_tile);
        build_config.bmax = heightfield.bmax;
        let result = builder.build_tile_mesh(&heightfield, &build_config)?;
        self.mesh_data = match &result {
            Some(result) if result.has_polygons() => backend.create_tile_mesh_data(
                &NavMeshCreateParams::from_build_result(result, &build_config),
            )?,
            _ => None,
        };

        let coord = self.coord();
        log::debug!(
            "Built tile ({}, {}): {} colliders, {} spans, mesh {}",
            coord.x,
            coord.z,
            self.colliders.len(),
            heightfield.span_count(),
            if self.mesh_data.is_some() { "present" } else { "empty" }
        );

        self.intermediate = config.keep_intermediate_results.then(|| TileIntermediateResults {
            heightfield,
            build_result: result,
        });
        self.dirty = false;
        Ok(true)
    }

    /// Heightfield with every current collider applied, starting from the
    /// checkpoint when there is one
    fn rasterize_colliders(&self) -> Result<Heightfield> {
        let (mut heightfield, baked) = match &self.checkpoint {
            Some(checkpoint) => (Heightfield::clone(&checkpoint.heightfield), Some(checkpoint)),
            None => (Heightfield::clone(&self.heightfield), None),
        };

        let ch = heightfield.ch;
        for (&id, collider) in &self.colliders {
            if baked.is_some_and(|checkpoint| checkpoint.contains(id)) {
                continue;
            }
            let (_, max) = collider.bounds();
            heightfield.bmax.y = heightfield.bmax.y.max(max.y + 2.0 * ch);
            collider.rasterize(&mut heightfield)?;
        }
        Ok(heightfield)
    }
}

impl<D> fmt::Debug for DynamicTile<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicTile")
            .field("coord", &self.coord())
            .field("bounds_min", &self.voxel_tile.bounds_min)
            .field("bounds_max", &self.voxel_tile.bounds_max)
            .field("dirty", &self.dirty)
            .field(
                "colliders",
                &format!("[{} collider(s)]", self.colliders.len()),
            )
            .field("checkpoint", &self.checkpoint.is_some())
            .field("mesh_data", &self.mesh_data.is_some())
            .field("intermediate", &self.intermediate.is_some())
            .finish()
    }
}
