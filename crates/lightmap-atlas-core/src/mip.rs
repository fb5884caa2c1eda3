//! Coverage-aware mip chain generation.
//!
//! Downsampling weights every source texel by its coverage so unmapped texels
//! never bleed into mapped ones. Each level is then dilated once: unmapped
//! texels take a weighted average of their mapped 3x3 neighbours, which keeps
//! bilinear filtering near footprint edges from pulling in garbage.

use crate::config::AtlasConfig;
use crate::model::{Sample, SampleGrid};

/// Dilation weights, indexed `[dy + 1][dx + 1]`. The centre never contributes.
const DILATION_WEIGHTS: [[u64; 3]; 3] = [[1, 255, 1], [255, 0, 255], [1, 255, 1]];

/// Extent of the level after `(w, h)`, or `None` once the chain is complete
/// (1x1 reached, or both axes already at `min_extent`).
pub fn next_mip_extent(w: u32, h: u32, min_extent: u32) -> Option<(u32, u32)> {
    let min_extent = min_extent.max(1);
    let nw = (w >> 1).max(min_extent).min(w);
    let nh = (h >> 1).max(min_extent).min(h);
    if (nw, nh) == (w, h) {
        None
    } else {
        Some((nw, nh))
    }
}

/// Number of levels `build_mip_chain` produces for a `w x h` base.
pub fn mip_count(w: u32, h: u32, min_extent: u32) -> usize {
    let mut count = 1;
    let (mut cw, mut ch) = (w, h);
    while let Some((nw, nh)) = next_mip_extent(cw, ch, min_extent) {
        count += 1;
        cw = nw;
        ch = nh;
    }
    count
}

/// Box-filters `src` down to `dst_w x dst_h`, weighting each contributor by its coverage.
///
/// Each destination texel covers an integer `fx x fy` block of `src`
/// (`fx = src.width / dst_w`). Its value is the coverage-weighted mean of the
/// block and its coverage the plain mean of the block's coverages, so partial
/// coverage survives across levels. Blocks with no coverage produce `{0,0}`.
pub fn downsample(src: &SampleGrid, dst_w: u32, dst_h: u32) -> SampleGrid {
    let fx = (src.width / dst_w.max(1)).max(1);
    let fy = (src.height / dst_h.max(1)).max(1);
    let block = (fx * fy) as u64;
    let mut dst = SampleGrid::new(dst_w, dst_h);
    for y in 0..dst_h {
        for x in 0..dst_w {
            let mut weighted = 0u64;
            let mut coverage = 0u64;
            for sy in y * fy..(y + 1) * fy {
                for sx in x * fx..(x + 1) * fx {
                    let s = src.get(sx, sy);
                    if s.coverage > 0 {
                        weighted += s.value as u64 * s.coverage as u64;
                        coverage += s.coverage as u64;
                    }
                }
            }
            if coverage > 0 {
                let value = (weighted + coverage / 2) / coverage;
                dst.set(x, y, Sample::new(value as u8, (coverage / block) as u8));
            }
        }
    }
    dst
}

/// One dilation pass over `grid`.
///
/// Only texels with zero coverage are written, and their coverage stays zero,
/// so a filled texel never feeds a neighbour within the same pass.
pub fn dilate(grid: &mut SampleGrid) {
    let (w, h) = (grid.width as i64, grid.height as i64);
    for y in 0..h {
        for x in 0..w {
            if grid.get(x as u32, y as u32).coverage > 0 {
                continue;
            }
            let mut weighted = 0u64;
            let mut total = 0u64;
            for dy in -1i64..=1 {
                let sy = y + dy;
                if sy < 0 || sy >= h {
                    continue;
                }
                for dx in -1i64..=1 {
                    let sx = x + dx;
                    if sx < 0 || sx >= w {
                        continue;
                    }
                    let s = grid.get(sx as u32, sy as u32);
                    if s.coverage == 0 {
                        continue;
                    }
                    let weight = s.coverage as u64 * DILATION_WEIGHTS[(dy + 1) as usize][(dx + 1) as usize];
                    weighted += s.value as u64 * weight;
                    total += weight;
                }
            }
            if total > 0 {
                let value = (weighted + total / 2) / total;
                grid.set(x as u32, y as u32, Sample::new(value as u8, 0));
            }
        }
    }
}

/// Builds the full chain from `level0`: every level is downsampled from the
/// previous undilated level, then each level is dilated exactly once.
pub fn build_mip_chain(level0: SampleGrid, min_extent: u32) -> Vec<SampleGrid> {
    let mut levels = vec![level0];
    loop {
        let last = &levels[levels.len() - 1];
        let Some((nw, nh)) = next_mip_extent(last.width, last.height, min_extent) else {
            break;
        };
        let next = downsample(last, nw, nh);
        levels.push(next);
    }
    for level in &mut levels {
        dilate(level);
    }
    levels
}

/// Mip filtering stage bound to a minimum level extent.
#[derive(Debug, Clone, Copy)]
pub struct MipFilterPipeline {
    min_mip_extent: u32,
}

impl MipFilterPipeline {
    pub fn new(min_mip_extent: u32) -> Self {
        Self {
            min_mip_extent: min_mip_extent.max(1),
        }
    }

    pub fn from_config(cfg: &AtlasConfig) -> Self {
        Self::new(cfg.min_mip_extent)
    }

    pub fn min_mip_extent(&self) -> u32 {
        self.min_mip_extent
    }

    pub fn run(&self, level0: SampleGrid) -> Vec<SampleGrid> {
        build_mip_chain(level0, self.min_mip_extent)
    }
}
