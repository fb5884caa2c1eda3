use crate::compositing::merge_group;
use crate::config::AtlasConfig;
use crate::error::Result;
use crate::grouping::{AtlasGroup, group_allocations};
use crate::mip::MipFilterPipeline;
use crate::model::{AllocationId, FinalAtlas, PackStats, Placement, RawAllocation};
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Atlases produced by one flush (or one `build_atlases` call).
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub atlases: Vec<FinalAtlas>,
}

impl BuildOutput {
    /// Computes packing statistics for this output.
    pub fn stats(&self) -> PackStats {
        PackStats::from_atlases(&self.atlases)
    }

    /// Finds the placement of `id` across all atlases.
    pub fn placement(&self, id: AllocationId) -> Option<&Placement> {
        self.atlases.iter().find_map(|a| a.placement(id))
    }

    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.atlases.iter().flat_map(|a| a.placements.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.atlases.is_empty()
    }

    pub fn extend(&mut self, other: BuildOutput) {
        self.atlases.extend(other.atlases);
    }
}

/// Merges, filters and finalizes one group. The group's extent is final at this point.
pub fn encode_group(group: AtlasGroup, atlas_id: usize, cfg: &AtlasConfig) -> Result<FinalAtlas> {
    let level0 = merge_group(&group)?;
    let mips = MipFilterPipeline::from_config(cfg).run(level0);
    let (width, height) = group.extent();
    debug!(
        atlas = atlas_id,
        width,
        height,
        mips = mips.len(),
        members = group.members().len(),
        dedicated = group.is_dedicated(),
        "encoded atlas"
    );
    Ok(FinalAtlas {
        id: atlas_id,
        width,
        height,
        mips,
        placements: group.placements(atlas_id),
        key: group.key().clone(),
        dedicated: group.is_dedicated(),
        padding: group.padding(),
    })
}

/// Encodes `groups` in order, numbering atlases from `first_atlas_id`.
/// Groups share no state, so with feature "parallel" and `cfg.parallel` they are encoded concurrently.
pub fn encode_groups(
    groups: Vec<AtlasGroup>,
    first_atlas_id: usize,
    cfg: &AtlasConfig,
) -> Result<Vec<FinalAtlas>> {
    #[cfg(feature = "parallel")]
    {
        if cfg.parallel {
            return groups
                .into_par_iter()
                .enumerate()
                .map(|(i, g)| encode_group(g, first_atlas_id + i, cfg))
                .collect();
        }
    }

    groups
        .into_iter()
        .enumerate()
        .map(|(i, g)| encode_group(g, first_atlas_id + i, cfg))
        .collect()
}

/// Runs grouping, packing, merging and mip filtering over `allocations`.
///
/// Notes:
/// - Allocations are ordered per `cfg.allocation_order` with id tie-breaks, so results are deterministic.
/// - Oversized allocations get dedicated atlases; no allocation is ever dropped.
#[instrument(skip_all)]
pub fn build_atlases(allocations: Vec<RawAllocation>, cfg: &AtlasConfig) -> Result<BuildOutput> {
    build_atlases_from(allocations, 0, cfg)
}

pub(crate) fn build_atlases_from(
    allocations: Vec<RawAllocation>,
    first_atlas_id: usize,
    cfg: &AtlasConfig,
) -> Result<BuildOutput> {
    cfg.validate()?;
    if allocations.is_empty() {
        return Ok(BuildOutput::default());
    }
    let groups = group_allocations(allocations, cfg)?;
    let atlases = encode_groups(groups, first_atlas_id, cfg)?;
    Ok(BuildOutput { atlases })
}
