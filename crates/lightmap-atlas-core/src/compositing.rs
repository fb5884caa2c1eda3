use crate::error::{LightmapAtlasError, Result};
use crate::grouping::AtlasGroup;
use crate::model::{Sample, SampleGrid};

/// Copy a `sw x sh` row-major block of samples into `canvas` with its top-left at (dx, dy).
/// Rows and columns falling outside the canvas are skipped.
pub fn blit_samples(src: &[Sample], sw: u32, sh: u32, canvas: &mut SampleGrid, dx: u32, dy: u32) {
    let (cw, ch) = (canvas.width, canvas.height);
    if dx >= cw || dy >= ch {
        return;
    }
    let run = sw.min(cw - dx) as usize;
    for yy in 0..sh.min(ch - dy) {
        let s = yy as usize * sw as usize;
        let d = canvas.index(dx, dy + yy);
        canvas.samples[d..d + run].copy_from_slice(&src[s..s + run]);
    }
}

/// Merges every member of `group` into one grid sized to the group's extent.
/// Texels no member touches stay `{0,0}`. The result is mip level 0.
pub fn merge_group(group: &AtlasGroup) -> Result<SampleGrid> {
    let (w, h) = group.extent();
    let mut canvas = SampleGrid::new(w, h);
    for member in group.members() {
        let alloc = &member.allocation;
        if !alloc.matches(group.key()) {
            return Err(LightmapAtlasError::IncompatibleMergeRequest {
                allocation: alloc.id(),
                group: group.id(),
            });
        }
        debug_assert!(member.base_x + alloc.size_x() <= w && member.base_y + alloc.size_y() <= h);
        blit_samples(
            alloc.samples(),
            alloc.size_x(),
            alloc.size_y(),
            &mut canvas,
            member.base_x,
            member.base_y,
        );
    }
    Ok(canvas)
}
