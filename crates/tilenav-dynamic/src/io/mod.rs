//! Persisted voxel tiles
//!
//! A voxel file stores the build parameters of a navmesh together with the
//! raw heightfield of every tile, so a dynamic navmesh can be rebuilt at
//! runtime without the source geometry.

mod byte_order;
mod compressor;
mod voxel_file;
mod voxel_file_reader;
mod voxel_file_writer;
mod voxel_tile;

pub use byte_order::*;
pub use compressor::*;
pub use voxel_file::*;
pub use voxel_file_reader::*;
pub use voxel_file_writer::*;
pub use voxel_tile::*;
