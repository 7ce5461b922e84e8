//! Deterministic stand-ins for the mesh pipeline and navmesh container

use crate::config::{DynamicNavMeshConfig, TileBuildConfig};
use crate::io::{VoxelFile, VoxelTile};
use crate::mesh::{
    NavMeshBackend, NavMeshCreateParams, NavMeshParams, PolyMesh, TileBuildResult,
    TileMeshBuilder, MESH_NULL_IDX,
};
use glam::Vec3;
use std::sync::atomic::{AtomicUsize, Ordering};
use tilenav_common::{Error, Heightfield, Result, Span, WALKABLE_AREA};

/// Emits one quad per non-empty column, lying on the column's top span
#[derive(Debug, Default)]
pub struct ColumnTopBuilder {
    pub calls: AtomicUsize,
}

impl ColumnTopBuilder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TileMeshBuilder for ColumnTopBuilder {
    fn build_tile_mesh(
        &self,
        heightfield: &Heightfield,
        config: &TileBuildConfig,
    ) -> Result<Option<TileBuildResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if heightfield.is_empty() {
            return Ok(None);
        }

        let nvp = config.verts_per_poly as usize;
        let mut mesh = PolyMesh {
            nvp,
            bmin: heightfield.bmin,
            bmax: heightfield.bmax,
            cs: heightfield.cs,
            ch: heightfield.ch,
            border_size: heightfield.border_size,
            ..PolyMesh::default()
        };
        for z in 0..heightfield.height {
            for x in 0..heightfield.width {
                let Some(top) = heightfield.column(x, z).and_then(|c| c.last()) else {
                    continue;
                };
                let base = mesh.nverts as u16;
                let y = top.max as u16;
                let (x, z) = (x as u16, z as u16);
                for (vx, vz) in [(x, z), (x + 1, z), (x + 1, z + 1), (x, z + 1)] {
                    mesh.verts.extend_from_slice(&[vx, y, vz]);
                }
                mesh.nverts += 4;
                let mut poly = vec![MESH_NULL_IDX; nvp * 2];
                for (slot, i) in poly.iter_mut().zip(0..4) {
                    *slot = base + i;
                }
                mesh.polys.extend_from_slice(&poly);
                mesh.regs.push(1);
                mesh.areas.push(top.area);
                mesh.npolys += 1;
            }
        }

        Ok(Some(TileBuildResult {
            tile_x: config.tile_x,
            tile_z: config.tile_z,
            poly_mesh: mesh,
            detail_mesh: None,
        }))
    }
}

/// Always fails, for error propagation tests
#[derive(Debug, Default)]
pub struct FailingBuilder;

impl TileMeshBuilder for FailingBuilder {
    fn build_tile_mesh(&self, _: &Heightfield, config: &TileBuildConfig) -> Result<Option<TileBuildResult>> {
        Err(Error::Build(format!(
            "pipeline rejected tile ({}, {})",
            config.tile_x, config.tile_z
        )))
    }
}

/// Fails the first `failures` builds of one tile, then delegates to
/// [`ColumnTopBuilder`]
#[derive(Debug)]
pub struct FlakyBuilder {
    pub tile: (i32, i32),
    pub failures: AtomicUsize,
    pub inner: ColumnTopBuilder,
}

impl FlakyBuilder {
    pub fn new(tile_x: i32, tile_z: i32, failures: usize) -> Self {
        Self {
            tile: (tile_x, tile_z),
            failures: AtomicUsize::new(failures),
            inner: ColumnTopBuilder::default(),
        }
    }
}

impl TileMeshBuilder for FlakyBuilder {
    fn build_tile_mesh(
        &self,
        heightfield: &Heightfield,
        config: &TileBuildConfig,
    ) -> Result<Option<TileBuildResult>> {
        let failing = (config.tile_x, config.tile_z) == self.tile
            && self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
        if failing {
            return Err(Error::Build("transient".to_string()));
        }
        self.inner.build_tile_mesh(heightfield, config)
    }
}

/// Panics while building one tile
#[derive(Debug)]
pub struct PanickingBuilder {
    pub tile: (i32, i32),
}

impl TileMeshBuilder for PanickingBuilder {
    fn build_tile_mesh(
        &self,
        heightfield: &Heightfield,
        config: &TileBuildConfig,
    ) -> Result<Option<TileBuildResult>> {
        if (config.tile_x, config.tile_z) == self.tile {
            panic!("pipeline crashed on tile ({}, {})", config.tile_x, config.tile_z);
        }
        ColumnTopBuilder::default().build_tile_mesh(heightfield, config)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedNavMesh {
    pub params: NavMeshParams,
    pub max_verts_per_poly: i32,
    pub tiles: Vec<NavMeshCreateParams>,
}

/// Keeps create parameters verbatim as tile data
#[derive(Debug, Default)]
pub struct RecordingBackend;

impl NavMeshBackend for RecordingBackend {
    type MeshData = NavMeshCreateParams;
    type NavMesh = RecordedNavMesh;

    fn create_tile_mesh_data(&self, params: &NavMeshCreateParams) -> Result<Option<Self::MeshData>> {
        Ok(Some(params.clone()))
    }

    fn create_nav_mesh(&self, params: &NavMeshParams, max_verts_per_poly: i32) -> Result<Self::NavMesh> {
        Ok(RecordedNavMesh {
            params: params.clone(),
            max_verts_per_poly,
            tiles: Vec::new(),
        })
    }

    fn add_tile(&self, nav_mesh: &mut Self::NavMesh, data: &Self::MeshData) -> Result<()> {
        nav_mesh.tiles.push(data.clone());
        Ok(())
    }
}

pub const TILE_CELLS: i32 = 8;
pub const CELL_SIZE: f32 = 1.0;
pub const CELL_HEIGHT: f32 = 0.5;

/// Flat ground tile: every column holds one span whose top is at y = 0
pub fn ground_tile(tile_x: i32, tile_z: i32) -> VoxelTile {
    let size = TILE_CELLS as f32 * CELL_SIZE;
    let bmin = Vec3::new(tile_x as f32 * size, -1.0, tile_z as f32 * size);
    let bmax = Vec3::new(bmin.x + size, 4.0, bmin.z + size);
    let mut hf = Heightfield::new(TILE_CELLS, TILE_CELLS, bmin, bmax, CELL_SIZE, CELL_HEIGHT);
    for z in 0..TILE_CELLS {
        for x in 0..TILE_CELLS {
            // Span [0, 2] * 0.5 above y = -1 ends at y = 0
            hf.push_span(x, z, Span::new(0, 2, WALKABLE_AREA))
                .expect("cell inside grid");
        }
    }
    VoxelTile::from_heightfield(tile_x, tile_z, &hf)
}

/// Voxel file made of a `nx` by `nz` grid of ground tiles
pub fn ground_file(nx: i32, nz: i32) -> VoxelFile {
    let mut tiles = Vec::new();
    for z in 0..nz {
        for x in 0..nx {
            tiles.push(ground_tile(x, z));
        }
    }
    let config = DynamicNavMeshConfig::new(true, TILE_CELLS, TILE_CELLS, CELL_SIZE)
        .with_cell_height(CELL_HEIGHT);
    VoxelFile::from_tiles(&config, tiles)
}
