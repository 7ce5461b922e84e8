//! Common data structures shared by the tilenav crates
//!
//! Holds the crate-wide error type and the voxel [`Heightfield`] that tiles,
//! colliders and queries all operate on.

mod heightfield;

pub use heightfield::*;

/// Represents a 3D position
pub type Vec3 = glam::Vec3;

/// Error types for the library
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid voxel file: {0}")]
    InvalidFormat(String),

    #[error("unsupported voxel file version: {0:#06x}")]
    UnsupportedVersion(u32),

    #[error("compression error: {0}")]
    Compression(String),

    #[error("heightfield error: {0}")]
    Heightfield(String),

    #[error("tile build failed: {0}")]
    Build(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for tilenav operations
pub type Result<T> = std::result::Result<T, Error>;
