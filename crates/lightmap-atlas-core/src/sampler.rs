use crate::error::{LightmapAtlasError, Result};
use crate::model::{AllocationId, FinalAtlas, Placement, SampleGrid};

/// Maps a surface-local UV (0..1) to atlas UV through the placement's scale/bias.
pub fn atlas_uv(placement: &Placement, local_uv: [f32; 2]) -> [f32; 2] {
    [
        local_uv[0] * placement.uv_scale[0] + placement.uv_bias[0],
        local_uv[1] * placement.uv_scale[1] + placement.uv_bias[1],
    ]
}

/// Texel-space position (texel centers at `i + 0.5` map to `i`) of `local_uv` on level 0.
pub fn texel_position(atlas: &FinalAtlas, placement: &Placement, local_uv: [f32; 2]) -> [f32; 2] {
    let uv = atlas_uv(placement, local_uv);
    [
        uv[0] * atlas.width as f32 - 0.5,
        uv[1] * atlas.height as f32 - 0.5,
    ]
}

/// Bilinear fetch of `value` at atlas UV `uv`, clamping lookups to the grid edge.
/// An empty grid reads as 0.
pub fn bilinear(grid: &SampleGrid, uv: [f32; 2]) -> f32 {
    if grid.width == 0 || grid.height == 0 {
        return 0.0;
    }
    let fx = uv[0] * grid.width as f32 - 0.5;
    let fy = uv[1] * grid.height as f32 - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;
    let fetch = |x: f32, y: f32| -> f32 {
        let cx = (x.max(0.0) as u32).min(grid.width - 1);
        let cy = (y.max(0.0) as u32).min(grid.height - 1);
        grid.get(cx, cy).value as f32
    };
    let top = fetch(x0, y0) * (1.0 - tx) + fetch(x0 + 1.0, y0) * tx;
    let bottom = fetch(x0, y0 + 1.0) * (1.0 - tx) + fetch(x0 + 1.0, y0 + 1.0) * tx;
    top * (1.0 - ty) + bottom * ty
}

/// Samples level 0 of `atlas` for the surface described by `placement`.
/// `None` when the atlas has no levels.
pub fn sample(atlas: &FinalAtlas, placement: &Placement, local_uv: [f32; 2]) -> Option<f32> {
    sample_level(atlas, placement, local_uv, 0)
}

/// Samples mip `level` (clamped to the last level) with the same remap.
pub fn sample_level(
    atlas: &FinalAtlas,
    placement: &Placement,
    local_uv: [f32; 2],
    level: usize,
) -> Option<f32> {
    let last = atlas.mips.len().checked_sub(1)?;
    let grid = &atlas.mips[level.min(last)];
    Some(bilinear(grid, atlas_uv(placement, local_uv)))
}

/// Renderer-side view over a finished atlas.
pub struct RuntimeSampler<'a> {
    atlas: &'a FinalAtlas,
}

impl<'a> RuntimeSampler<'a> {
    pub fn new(atlas: &'a FinalAtlas) -> Self {
        Self { atlas }
    }

    /// Encoded value (0..=255) of allocation `id` at `local_uv`.
    pub fn sample(&self, id: AllocationId, local_uv: [f32; 2]) -> Result<f32> {
        let placement = self.placement(id)?;
        sample(self.atlas, placement, local_uv).ok_or_else(|| self.no_levels())
    }

    /// Linear intensity of allocation `id` at `local_uv`.
    pub fn sample_linear(&self, id: AllocationId, local_uv: [f32; 2]) -> Result<f32> {
        let placement = self.placement(id)?;
        let encoded = sample(self.atlas, placement, local_uv).ok_or_else(|| self.no_levels())?;
        Ok(placement.decode(encoded))
    }

    pub fn sample_level(&self, id: AllocationId, local_uv: [f32; 2], level: usize) -> Result<f32> {
        let placement = self.placement(id)?;
        sample_level(self.atlas, placement, local_uv, level).ok_or_else(|| self.no_levels())
    }

    fn no_levels(&self) -> LightmapAtlasError {
        LightmapAtlasError::EmptyMipChain(self.atlas.id)
    }

    fn placement(&self, id: AllocationId) -> Result<&'a Placement> {
        self.atlas
            .placement(id)
            .ok_or(LightmapAtlasError::UnknownAllocation(id))
    }
}
