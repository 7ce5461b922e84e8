//! Seams to the mesh pipeline and the navmesh container
//!
//! Turning a heightfield into polygons, packing polygons into navmesh tile
//! data and assembling tiles into a navmesh are done by external code. The
//! dynamic navmesh drives them through [`TileMeshBuilder`] and
//! [`NavMeshBackend`], and hands data across in the layouts below.

use crate::config::TileBuildConfig;
use glam::Vec3;
use tilenav_common::{Heightfield, Result};

/// Largest polygon the navmesh container accepts
pub const MAX_VERTS_PER_POLY: i32 = 6;

/// Polygon index marking an unused slot
pub const MESH_NULL_IDX: u16 = 0xffff;

/// Flag given to every polygon produced by a dynamic rebuild
pub const POLY_FLAG_WALK: u16 = 0x01;

/// Polygons per tile the navmesh container is sized for
pub const MAX_POLYS_PER_TILE: i32 = 0x8000;

/// Polygon mesh of one tile, in voxel coordinates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyMesh {
    /// Vertices `[x, y, z]` * nverts
    pub verts: Vec<u16>,
    /// Per polygon: `nvp` vertex indices followed by `nvp` neighbour slots
    pub polys: Vec<u16>,
    /// Region id of each polygon
    pub regs: Vec<u16>,
    /// Area id of each polygon
    pub areas: Vec<u8>,
    pub nverts: usize,
    pub npolys: usize,
    pub nvp: usize,
    pub bmin: Vec3,
    pub bmax: Vec3,
    pub cs: f32,
    pub ch: f32,
    pub border_size: i32,
}

/// Height detail for the polygons of a [`PolyMesh`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolyMeshDetail {
    /// Per polygon `[vert base, vert count, tri base, tri count]`
    pub meshes: Vec<u32>,
    /// World-space vertices `[x, y, z]`
    pub verts: Vec<f32>,
    /// Triangles `[a, b, c, flags]`
    pub tris: Vec<u8>,
    pub nmeshes: usize,
    pub nverts: usize,
    pub ntris: usize,
}

/// Output of the mesh pipeline for one tile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileBuildResult {
    pub tile_x: i32,
    pub tile_z: i32,
    pub poly_mesh: PolyMesh,
    pub detail_mesh: Option<PolyMeshDetail>,
}

impl TileBuildResult {
    pub fn has_polygons(&self) -> bool {
        self.poly_mesh.npolys > 0
    }
}

/// Builds a tile's polygon mesh from its heightfield.
///
/// Returns `Ok(None)` when the heightfield produces no mesh at all.
pub trait TileMeshBuilder: Send + Sync {
    fn build_tile_mesh(
        &self,
        heightfield: &Heightfield,
        config: &TileBuildConfig,
    ) -> Result<Option<TileBuildResult>>;
}

/// Navmesh-wide layout parameters
#[derive(Debug, Clone, PartialEq)]
pub struct NavMeshParams {
    pub origin: [f32; 3],
    pub tile_width: f32,
    pub tile_height: f32,
    pub max_tiles: i32,
    pub max_polys_per_tile: i32,
}

/// Everything needed to create the navmesh data of one tile
#[derive(Debug, Clone, PartialEq)]
pub struct NavMeshCreateParams {
    pub verts: Vec<u16>,
    pub vert_count: usize,
    pub polys: Vec<u16>,
    pub poly_flags: Vec<u16>,
    pub poly_areas: Vec<u8>,
    pub poly_count: usize,
    pub nvp: usize,

    pub detail_meshes: Vec<u32>,
    pub detail_verts: Vec<f32>,
    pub detail_vert_count: usize,
    pub detail_tris: Vec<u8>,
    pub detail_tri_count: usize,

    pub off_mesh_con_verts: Vec<f32>,
    pub off_mesh_con_rad: Vec<f32>,
    pub off_mesh_con_flags: Vec<u16>,
    pub off_mesh_con_areas: Vec<u8>,
    pub off_mesh_con_dir: Vec<u8>,
    pub off_mesh_con_user_id: Vec<u32>,
    pub off_mesh_con_count: usize,

    pub tile_x: i32,
    pub tile_z: i32,
    pub tile_layer: i32,
    pub bmin: [f32; 3],
    pub bmax: [f32; 3],

    pub walkable_height: f32,
    pub walkable_radius: f32,
    pub walkable_climb: f32,
    pub cs: f32,
    pub ch: f32,
    pub build_bv_tree: bool,
}

impl NavMeshCreateParams {
    /// Tile creation parameters for a freshly built tile.
    ///
    /// Every polygon is flagged walkable and no off-mesh connections are
    /// emitted.
    pub fn from_build_result(result: &TileBuildResult, config: &TileBuildConfig) -> Self {
        let mesh = &result.poly_mesh;
        let detail = result.detail_mesh.as_ref();
        Self {
            verts: mesh.verts.clone(),
            vert_count: mesh.nverts,
            polys: mesh.polys.clone(),
            poly_flags: vec![POLY_FLAG_WALK; mesh.npolys],
            poly_areas: mesh.areas.clone(),
            poly_count: mesh.npolys,
            nvp: mesh.nvp,

            detail_meshes: detail.map(|d| d.meshes.clone()).unwrap_or_default(),
            detail_verts: detail.map(|d| d.verts.clone()).unwrap_or_default(),
            detail_vert_count: detail.map_or(0, |d| d.nverts),
            detail_tris: detail.map(|d| d.tris.clone()).unwrap_or_default(),
            detail_tri_count: detail.map_or(0, |d| d.ntris),

            off_mesh_con_verts: Vec::new(),
            off_mesh_con_rad: Vec::new(),
            off_mesh_con_flags: Vec::new(),
            off_mesh_con_areas: Vec::new(),
            off_mesh_con_dir: Vec::new(),
            off_mesh_con_user_id: Vec::new(),
            off_mesh_con_count: 0,

            tile_x: result.tile_x,
            tile_z: result.tile_z,
            tile_layer: 0,
            bmin: mesh.bmin.to_array(),
            bmax: mesh.bmax.to_array(),

            walkable_height: config.walkable_height_world,
            walkable_radius: config.walkable_radius_world,
            walkable_climb: config.walkable_climb_world,
            cs: config.cs,
            ch: config.ch,
            build_bv_tree: true,
        }
    }
}

/// Creates tile data and assembles navmeshes
pub trait NavMeshBackend: Send + Sync {
    /// Packed data of one navmesh tile
    type MeshData: Send + Sync + 'static;
    /// The assembled navmesh
    type NavMesh: Send + Sync;

    /// Packs one tile, `Ok(None)` if the parameters describe no usable tile
    fn create_tile_mesh_data(&self, params: &NavMeshCreateParams) -> Result<Option<Self::MeshData>>;

    fn create_nav_mesh(&self, params: &NavMeshParams, max_verts_per_poly: i32) -> Result<Self::NavMesh>;

    fn add_tile(&self, nav_mesh: &mut Self::NavMesh, data: &Self::MeshData) -> Result<()>;
}
