//! Deferred tile mutations
//!
//! Collider changes are recorded as jobs and only applied to tiles when the
//! navmesh is rebuilt.

mod collider_addition_job;
mod collider_removal_job;
mod dynamic_tile_job;
mod job_queue;

pub use collider_addition_job::ColliderAdditionJob;
pub use collider_removal_job::ColliderRemovalJob;
pub use dynamic_tile_job::DynamicTileJob;
pub use job_queue::JobQueue;
