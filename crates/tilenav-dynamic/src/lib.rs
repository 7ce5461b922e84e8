//! Dynamic Navigation Mesh Generation
//!
//! This crate rebuilds a tiled navigation mesh incrementally as obstacles are
//! added and removed at runtime. Tiles start from pre-voxelized heightfields
//! loaded from a voxel file; colliders are rasterized into the tiles they
//! overlap and only those tiles are sent back through the mesh pipeline.
//!
//! # Features
//!
//! - **Dynamic Obstacle Management**: Add and remove colliders at runtime, from any thread
//! - **Incremental Updates**: Only rebuild affected tiles
//! - **Async Processing**: Parallel tile rebuilds on Tokio's blocking pool
//! - **Multiple Collider Types**: Box, sphere, capsule, cylinder, trimesh and composite colliders
//! - **Checkpoint System**: Added colliders are rasterized on top of the last build
//! - **Voxel-based Queries**: Raycasting against the current heightfields
//! - **Serialization**: Read and write VOXL voxel files in either byte order, optionally LZ4 compressed
//!
//! The mesh pipeline and the navmesh container are supplied by the caller
//! through [`TileMeshBuilder`] and [`NavMeshBackend`].
//!
//! # Example
//!
//! ```rust,no_run
//! use tilenav_dynamic::colliders::BoxCollider;
//! use tilenav_dynamic::io::VoxelFile;
//! use tilenav_dynamic::{DynamicNavMesh, NavMeshBackend, TileMeshBuilder};
//! use glam::Vec3;
//! use std::sync::Arc;
//!
//! # fn example<B: NavMeshBackend>(
//! #     builder: Arc<dyn TileMeshBuilder>,
//! #     backend: Arc<B>,
//! # ) -> tilenav_dynamic::Result<()> {
//! let file = VoxelFile::load("level.voxl")?;
//! let mut navmesh = DynamicNavMesh::from_voxel_file(&file, builder, backend)?;
//! navmesh.build()?;
//!
//! // Add a dynamic obstacle (area=0 for unwalkable, flag_merge_threshold=1.0)
//! let crate_id = navmesh.add_collider(Arc::new(BoxCollider::new(
//!     Vec3::new(5.0, 0.0, 5.0),  // center
//!     Vec3::new(1.0, 2.0, 1.0),  // half extents
//!     0,
//!     1.0,
//! )));
//!
//! // Apply queued changes, rebuilding only the touched tiles
//! navmesh.update()?;
//!
//! if let Some(hit) = navmesh
//!     .voxel_query()
//!     .raycast(Vec3::new(0.0, 1.0, 0.0), Vec3::new(5.0, 1.0, 5.0))
//! {
//!     println!("Hit obstacle at {:?}", hit.position);
//! }
//!
//! navmesh.remove_collider(crate_id);
//! navmesh.update()?;
//! # Ok(())
//! # }
//! ```

pub mod checkpoint;
pub mod colliders;
pub mod config;
pub mod dynamic_navmesh;
pub mod dynamic_tile;
pub mod io;
pub mod jobs;
pub mod mesh;
pub mod voxel_query;

#[cfg(test)]
mod test_helpers;

// Re-export main types
pub use checkpoint::DynamicTileCheckpoint;
pub use config::{DynamicNavMeshConfig, TileBuildConfig};
pub use dynamic_navmesh::{DynamicNavMesh, DynamicNavMeshStatistics};
pub use dynamic_tile::{DynamicTile, TileCoord, TileIntermediateResults};

// Re-export collider types
pub use colliders::{
    BoxCollider, CapsuleCollider, Collider, CompositeCollider, CylinderCollider,
    SerializableCollider, SphereCollider, TrimeshCollider,
};

// Re-export I/O types
pub use io::{ByteOrder, VoxelFile, VoxelFileReader, VoxelFileWriter, VoxelTile};

// Re-export the pipeline seams
pub use mesh::{
    NavMeshBackend, NavMeshCreateParams, NavMeshParams, PolyMesh, PolyMeshDetail,
    TileBuildResult, TileMeshBuilder,
};

// Re-export voxel query
pub use voxel_query::{VoxelQuery, VoxelRaycastHit};

// Re-export job system
pub use jobs::{ColliderAdditionJob, ColliderRemovalJob, DynamicTileJob, JobQueue};

pub use tilenav_common::{Error, Heightfield, Result, Span};
