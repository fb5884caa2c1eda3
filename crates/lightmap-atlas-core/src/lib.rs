//! Core library for building static light-map atlases.
//!
//! - Grouping: allocations sharing a light set, brightness bucket and material share atlases
//! - Packing: binary-tree allocator that prefers not to grow the texture
//! - Filtering: coverage-weighted mip chain with per-level dilation
//! - Batching: `BatchScheduler` flushes by pending sample bytes, `finalize` flushes the rest
//!
//! Quick example:
//! ```
//! use lightmap_atlas_core::prelude::*;
//! # fn main() -> lightmap_atlas_core::Result<()> {
//! let cfg = AtlasConfig::builder().max_atlas_extent(256).build();
//! let mut scheduler = BatchScheduler::new(cfg)?;
//! let samples = vec![Sample::mapped(200); 32 * 16];
//! let alloc = RawAllocation::new(AllocationId(1), 32, 16, samples, 1.0, [LightId(7)], MaterialRef(0))?;
//! let mut out = scheduler.submit(alloc)?.unwrap_or_default();
//! out.extend(scheduler.finalize()?);
//! let placement = out
//!     .placement(AllocationId(1))
//!     .ok_or(LightmapAtlasError::UnknownAllocation(AllocationId(1)))?;
//! assert_eq!(placement.atlas_id, 0);
//! println!("atlas {} scale {:?} bias {:?}", placement.atlas_id, placement.uv_scale, placement.uv_bias);
//! # Ok(()) }
//! ```

pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod grouping;
pub mod mip;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod sampler;
pub mod scheduler;

pub use config::*;
pub use error::*;
pub use export::*;
pub use model::*;
pub use packer::*;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `lightmap_atlas_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{AllocationOrder, AtlasConfig, AtlasConfigBuilder};
    pub use crate::grouping::{AtlasGroup, CompatibilityGrouper, group_allocations};
    pub use crate::mip::MipFilterPipeline;
    pub use crate::model::{
        AllocationId, CompatibilityKey, FinalAtlas, LightId, LinearSample, MaterialRef, PackStats,
        Placement, RawAllocation, Rect, Sample, SampleGrid,
    };
    pub use crate::packer::{Packer, RectLayoutAllocator};
    pub use crate::sampler::RuntimeSampler;
    pub use crate::scheduler::BatchScheduler;
    pub use crate::{BuildOutput, LightmapAtlasError, build_atlases, encode_group, encode_groups};
}
