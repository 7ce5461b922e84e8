//! Dynamic navigation mesh implementation
//!
//! This module provides the orchestrator that owns the tiles, queues collider
//! changes and rebuilds the navmesh snapshot from tile mesh data.

use crate::colliders::Collider;
use crate::config::DynamicNavMeshConfig;
use crate::dynamic_tile::{DynamicTile, TileCoord};
use crate::io::{VoxelFile, VoxelTile};
use crate::jobs::{ColliderAdditionJob, ColliderRemovalJob, JobQueue};
use crate::mesh::{
    NavMeshBackend, NavMeshParams, TileMeshBuilder, MAX_POLYS_PER_TILE, MAX_VERTS_PER_POLY,
};
use crate::voxel_query::VoxelQuery;
use glam::Vec3;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tilenav_common::{Error, Result};

/// Main dynamic navigation mesh manager
///
/// Colliders can be added and removed through a shared reference from any
/// thread. Changes are queued and only applied by [`build`](Self::build),
/// [`update`](Self::update) and their async variants, which need exclusive
/// access and replace the navmesh snapshot when any tile changed.
pub struct DynamicNavMesh<B: NavMeshBackend> {
    config: Arc<DynamicNavMeshConfig>,
    nav_mesh_params: NavMeshParams,
    builder: Arc<dyn TileMeshBuilder>,
    backend: Arc<B>,
    tiles: HashMap<i64, DynamicTile<B::MeshData>>,
    /// Smallest and largest tile coordinate present, per axis
    tile_extent: Option<(TileCoord, TileCoord)>,
    queue: JobQueue,
    /// Tiles touched by applied jobs that have not been rebuilt yet
    pending: BTreeSet<i64>,
    current_collider_id: AtomicU64,
    /// Current navigation mesh, replaced on every rebuild
    nav_mesh: Option<Arc<B::NavMesh>>,
    /// Number of snapshots built so far
    update_counter: u64,
    /// Set when tile mesh data changed since the last snapshot
    dirty: bool,
}

impl<B: NavMeshBackend> DynamicNavMesh<B> {
    /// Creates a navmesh over the tiles of `voxel_file`, configured from the
    /// file's build parameters
    pub fn from_voxel_file(
        voxel_file: &VoxelFile,
        builder: Arc<dyn TileMeshBuilder>,
        backend: Arc<B>,
    ) -> Result<Self> {
        let config = DynamicNavMeshConfig::from_voxel_file(voxel_file);
        Self::with_config(voxel_file, config, builder, backend)
    }

    /// Creates a navmesh over the tiles of `voxel_file` with an explicit
    /// configuration
    pub fn with_config(
        voxel_file: &VoxelFile,
        config: DynamicNavMeshConfig,
        builder: Arc<dyn TileMeshBuilder>,
        backend: Arc<B>,
    ) -> Result<Self> {
        config.validate()?;

        let nav_mesh_params = NavMeshParams {
            origin: config.world_min.to_array(),
            tile_width: if config.use_tiles {
                config.cell_size * config.tile_size_x as f32
            } else {
                config.world_max.x - config.world_min.x
            },
            tile_height: if config.use_tiles {
                config.cell_size * config.tile_size_z as f32
            } else {
                config.world_max.z - config.world_min.z
            },
            max_tiles: voxel_file.tiles.len() as i32,
            max_polys_per_tile: MAX_POLYS_PER_TILE,
        };

        let mut tiles = HashMap::with_capacity(voxel_file.tiles.len());
        for voxel_tile in &voxel_file.tiles {
            let tile = DynamicTile::new(voxel_tile.clone())?;
            let coord = tile.coord();
            if tiles.insert(coord.key(), tile).is_some() {
                return Err(Error::InvalidFormat(format!(
                    "duplicate tile ({}, {})",
                    coord.x, coord.z
                )));
            }
        }

        let tile_extent = tiles
            .values()
            .map(|tile| (tile.coord(), tile.coord()))
            .reduce(|(lo, hi), (c, _)| {
                (
                    TileCoord::new(lo.x.min(c.x), lo.z.min(c.z)),
                    TileCoord::new(hi.x.max(c.x), hi.z.max(c.z)),
                )
            });

        Ok(Self {
            config: Arc::new(config),
            nav_mesh_params,
            builder,
            backend,
            tiles,
            tile_extent,
            queue: JobQueue::new(),
            pending: BTreeSet::new(),
            current_collider_id: AtomicU64::new(0),
            nav_mesh: None,
            update_counter: 0,
            dirty: true,
        })
    }

    /// Queues `collider` for addition and returns its id.
    ///
    /// The collider takes effect on the next build or update.
    pub fn add_collider(&self, collider: Arc<dyn Collider>) -> u64 {
        let collider_id = self.current_collider_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (min, max) = collider.bounds();
        let affected_tiles = self.tiles_by_bounds(min, max);
        self.queue
            .enqueue(ColliderAdditionJob::new(collider_id, collider, affected_tiles));
        collider_id
    }

    /// Queues removal of a collider from every tile currently holding it
    pub fn remove_collider(&self, collider_id: u64) {
        let affected_tiles = self
            .tiles
            .values()
            .filter(|tile| tile.contains_collider(collider_id))
            .map(DynamicTile::coord)
            .collect();
        self.queue
            .enqueue(ColliderRemovalJob::new(collider_id, affected_tiles));
    }

    /// Existing tiles whose XZ bounds overlap the AABB `min..max`
    ///
    /// The candidate tile range is clamped to the tiles that exist, so
    /// arbitrarily large bounds cost at most one pass over the tiles.
    pub fn tiles_by_bounds(&self, min: Vec3, max: Vec3) -> BTreeSet<TileCoord> {
        let mut result = BTreeSet::new();
        let Some((lo, hi)) = self.tile_extent else {
            return result;
        };
        let params = &self.nav_mesh_params;
        // Range arithmetic stays in f32 so huge bounds cannot overflow
        let tile_range = |vmin: f32, vmax: f32, origin: f32, size: f32, lo: i32, hi: i32| {
            let first = (((vmin - origin) / size).floor() - 1.0).max(lo as f32);
            let last = (((vmax - origin) / size).floor() + 1.0).min(hi as f32);
            (first as i32, last as i32)
        };
        let (min_x, max_x) = tile_range(min.x, max.x, params.origin[0], params.tile_width, lo.x, hi.x);
        let (min_z, max_z) = tile_range(min.z, max.z, params.origin[2], params.tile_height, lo.z, hi.z);
        if min_x > max_x || min_z > max_z {
            return result;
        }

        let candidates = (max_x as i64 - min_x as i64 + 1) * (max_z as i64 - min_z as i64 + 1);
        if candidates > self.tiles.len() as i64 {
            result.extend(
                self.tiles
                    .values()
                    .filter(|tile| {
                        let c = tile.coord();
                        (min_x..=max_x).contains(&c.x)
                            && (min_z..=max_z).contains(&c.z)
                            && tile.intersects_xz(min, max)
                    })
                    .map(DynamicTile::coord),
            );
            return result;
        }

        for z in min_z..=max_z {
            for x in min_x..=max_x {
                let coord = TileCoord::new(x, z);
                if let Some(tile) = self.tiles.get(&coord.key()) {
                    if tile.intersects_xz(min, max) {
                        result.insert(coord);
                    }
                }
            }
        }
        result
    }

    /// Applies queued jobs, rebuilds every dirty tile and refreshes the
    /// snapshot. Returns whether the snapshot changed.
    pub fn build(&mut self) -> Result<bool> {
        self.process_queue();
        let keys = self.sorted_keys();
        self.rebuild(keys)
    }

    /// Applies queued jobs and rebuilds only the tiles they touched,
    /// including tiles left over from a failed update.
    /// Returns whether the snapshot changed.
    pub fn update(&mut self) -> Result<bool> {
        self.process_queue();
        let keys = self.pending.iter().copied().collect();
        self.rebuild(keys)
    }

    /// [`build`](Self::build) with one blocking task per tile
    pub async fn build_async(&mut self) -> Result<bool>
    where
        B: 'static,
    {
        self.process_queue();
        let keys = self.sorted_keys();
        self.rebuild_async(keys).await
    }

    /// [`update`](Self::update) with one blocking task per tile
    pub async fn update_async(&mut self) -> Result<bool>
    where
        B: 'static,
    {
        self.process_queue();
        let keys = self.pending.iter().copied().collect();
        self.rebuild_async(keys).await
    }

    /// Drains the queue and applies every job to each tile it addresses,
    /// marking the touched tiles pending
    fn process_queue(&mut self) {
        let jobs = self.queue.drain();
        for job in &jobs {
            log::debug!("Processing job: {}", job.description());
            for coord in job.affected_tiles() {
                match self.tiles.get_mut(&coord.key()) {
                    Some(tile) => {
                        job.process(tile);
                        self.pending.insert(coord.key());
                    }
                    None => log::warn!(
                        "Job addresses unknown tile ({}, {}): {}",
                        coord.x,
                        coord.z,
                        job.description()
                    ),
                }
            }
        }
    }

    fn rebuild(&mut self, keys: Vec<i64>) -> Result<bool> {
        let mut changed = false;
        for key in keys {
            let Some(tile) = self.tiles.get_mut(&key) else {
                continue;
            };
            match tile.build(self.builder.as_ref(), self.backend.as_ref(), &self.config) {
                Ok(built) => {
                    changed |= built;
                    self.pending.remove(&key);
                }
                Err(err) => {
                    self.dirty |= changed;
                    return Err(err);
                }
            }
        }
        self.dirty |= changed;
        self.update_nav_mesh()
    }

    async fn rebuild_async(&mut self, keys: Vec<i64>) -> Result<bool>
    where
        B: 'static,
    {
        let mut handles = Vec::new();
        for key in keys {
            if !self.tiles.get(&key).is_some_and(DynamicTile::is_dirty) {
                self.pending.remove(&key);
                continue;
            }
            let Some(mut tile) = self.tiles.remove(&key) else {
                continue;
            };
            let builder = Arc::clone(&self.builder);
            let backend = Arc::clone(&self.backend);
            let config = Arc::clone(&self.config);
            handles.push(tokio::task::spawn_blocking(move || {
                // The tile is handed back even when its build panics
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    tile.build(builder.as_ref(), backend.as_ref(), &config)
                }));
                (key, tile, result)
            }));
        }

        let mut changed = false;
        let mut first_error = None;
        let mut first_panic = None;
        for handle in handles {
            match handle.await {
                Ok((key, tile, result)) => {
                    self.tiles.insert(key, tile);
                    match result {
                        Ok(Ok(built)) => {
                            changed |= built;
                            self.pending.remove(&key);
                        }
                        Ok(Err(err)) => {
                            first_error.get_or_insert(err);
                        }
                        Err(payload) => {
                            first_panic.get_or_insert(payload);
                        }
                    }
                }
                Err(err) if err.is_panic() => {
                    first_panic.get_or_insert(err.into_panic());
                }
                Err(err) => {
                    first_error.get_or_insert(Error::Build(format!("tile build task failed: {}", err)));
                }
            }
        }
        self.dirty |= changed;

        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
        if let Some(err) = first_error {
            return Err(err);
        }
        self.update_nav_mesh()
    }

    /// Rebuilds the snapshot from every tile's mesh data when anything
    /// changed since the last one
    fn update_nav_mesh(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }

        let mut nav_mesh = self
            .backend
            .create_nav_mesh(&self.nav_mesh_params, MAX_VERTS_PER_POLY)?;
        let mut tile_count = 0;
        for key in self.sorted_keys() {
            if let Some(data) = self.tiles.get(&key).and_then(DynamicTile::mesh_data) {
                self.backend.add_tile(&mut nav_mesh, data)?;
                tile_count += 1;
            }
        }

        self.nav_mesh = Some(Arc::new(nav_mesh));
        self.dirty = false;
        self.update_counter += 1;
        log::info!(
            "Navigation mesh updated (update {}, tiles with mesh: {}/{})",
            self.update_counter,
            tile_count,
            self.tiles.len()
        );
        Ok(true)
    }

    fn sorted_keys(&self) -> Vec<i64> {
        let mut keys: Vec<i64> = self.tiles.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn config(&self) -> &DynamicNavMeshConfig {
        &self.config
    }

    pub fn nav_mesh_params(&self) -> &NavMeshParams {
        &self.nav_mesh_params
    }

    /// Get the current navigation mesh snapshot
    pub fn nav_mesh(&self) -> Option<Arc<B::NavMesh>> {
        self.nav_mesh.clone()
    }

    pub fn tile(&self, x: i32, z: i32) -> Option<&DynamicTile<B::MeshData>> {
        self.tiles.get(&TileCoord::new(x, z).key())
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn pending_jobs(&self) -> usize {
        self.queue.len()
    }

    /// Raycast access to the heightfields of the last build
    pub fn voxel_query(&self) -> VoxelQuery<'_> {
        VoxelQuery::new(
            Vec3::from_array(self.nav_mesh_params.origin),
            self.nav_mesh_params.tile_width,
            self.nav_mesh_params.tile_height,
            Box::new(move |x, z| {
                self.tiles
                    .get(&TileCoord::new(x, z).key())
                    .and_then(DynamicTile::query_heightfield)
            }),
        )
    }

    /// Voxel tiles holding each tile's current heightfield, ordered by tile key
    pub fn voxel_tiles(&self) -> Vec<VoxelTile> {
        self.sorted_keys()
            .iter()
            .filter_map(|key| self.tiles.get(key))
            .map(DynamicTile::to_voxel_tile)
            .collect()
    }

    /// Voxel file capturing the current state of every tile
    pub fn to_voxel_file(&self) -> VoxelFile {
        VoxelFile::from_tiles(&self.config, self.voxel_tiles())
    }

    /// Get statistics about the dynamic navigation mesh
    pub fn statistics(&self) -> DynamicNavMeshStatistics {
        let mut colliders = HashSet::new();
        let mut stats = DynamicNavMeshStatistics {
            total_tiles: self.tiles.len(),
            pending_jobs: self.queue.len(),
            update_counter: self.update_counter,
            ..DynamicNavMeshStatistics::default()
        };
        for tile in self.tiles.values() {
            stats.dirty_tiles += usize::from(tile.is_dirty());
            stats.tiles_with_checkpoint += usize::from(tile.checkpoint().is_some());
            stats.tiles_with_mesh += usize::from(tile.mesh_data().is_some());
            colliders.extend(tile.collider_ids());
        }
        stats.active_colliders = colliders.len();
        stats
    }
}

/// Statistics about the dynamic navigation mesh
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicNavMeshStatistics {
    /// Total number of tiles
    pub total_tiles: usize,
    /// Number of dirty tiles needing rebuild
    pub dirty_tiles: usize,
    /// Number of pending jobs in the queue
    pub pending_jobs: usize,
    pub tiles_with_checkpoint: usize,
    pub tiles_with_mesh: usize,
    /// Distinct colliders applied to at least one tile
    pub active_colliders: usize,
    /// Number of snapshots built so far
    pub update_counter: u64,
}
