use crate::error::{LightmapAtlasError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Brightest linear value a light-map texel may carry before quantization.
pub const MAX_LIGHT_INTENSITY: f32 = 16.0;
/// Peak magnitudes at or below this land in brightness bucket 0.
pub const BRIGHTNESS_EPSILON: f32 = 1.0e-5;
/// Gamma used when quantizing linear samples to 8 bits.
pub const ENCODE_GAMMA: f32 = 2.2;

/// Identifier of one surface's light-map request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AllocationId(pub u64);

impl fmt::Display for AllocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "allocation#{}", self.0)
    }
}

/// Opaque light identifier (typically a GUID).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LightId(pub u128);

/// Opaque handle of the material a surface is rendered with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MaterialRef(pub u64);

/// One baked texel: gamma-encoded intensity plus coverage.
/// `coverage == 0` marks a texel outside the surface footprint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Sample {
    pub value: u8,
    pub coverage: u8,
}

impl Sample {
    pub const UNMAPPED: Sample = Sample {
        value: 0,
        coverage: 0,
    };

    pub fn new(value: u8, coverage: u8) -> Self {
        Self { value, coverage }
    }
    /// Fully covered texel.
    pub fn mapped(value: u8) -> Self {
        Self {
            value,
            coverage: 255,
        }
    }
    pub fn is_mapped(&self) -> bool {
        self.coverage > 0
    }
}

/// Unquantized solver output for one texel.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct LinearSample {
    pub value: f32,
    pub mapped: bool,
}

/// `next_power_of_two(ceil(peak))`, or 0 for (near) black surfaces.
pub fn brightness_bucket(peak_magnitude: f32) -> u32 {
    if peak_magnitude.is_nan() || peak_magnitude <= BRIGHTNESS_EPSILON {
        return 0;
    }
    let ceil = peak_magnitude.ceil().min(u32::MAX as f32) as u32;
    ceil.max(1).checked_next_power_of_two().unwrap_or(1 << 31)
}

/// One surface's request for atlas space. Immutable once built.
///
/// Deserialization goes through [`RawAllocation::new`], so a stored record is
/// checked the same way and its brightness bucket is re-derived from the peak.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawAllocationRecord")]
pub struct RawAllocation {
    id: AllocationId,
    size_x: u32,
    size_y: u32,
    samples: Vec<Sample>,
    peak_magnitude: f32,
    brightness_bucket: u32,
    light_set: BTreeSet<LightId>,
    material: MaterialRef,
}

impl RawAllocation {
    /// Builds an allocation from already quantized samples (row-major, `size_x * size_y`).
    pub fn new(
        id: AllocationId,
        size_x: u32,
        size_y: u32,
        samples: Vec<Sample>,
        peak_magnitude: f32,
        light_set: impl IntoIterator<Item = LightId>,
        material: MaterialRef,
    ) -> Result<Self> {
        if size_x == 0 || size_y == 0 {
            return Err(LightmapAtlasError::InvalidAllocationSize {
                id,
                width: size_x,
                height: size_y,
            });
        }
        let expected = size_x as usize * size_y as usize;
        if samples.len() != expected {
            return Err(LightmapAtlasError::SampleCountMismatch {
                id,
                expected,
                actual: samples.len(),
            });
        }
        Ok(Self {
            id,
            size_x,
            size_y,
            samples,
            peak_magnitude,
            brightness_bucket: brightness_bucket(peak_magnitude),
            light_set: light_set.into_iter().collect(),
            material,
        })
    }

    /// Quantizes linear solver output: the peak over mapped texels (clamped to
    /// `MAX_LIGHT_INTENSITY`) becomes the scale, values are normalized by it and
    /// gamma encoded; mapped texels get full coverage.
    pub fn from_linear(
        id: AllocationId,
        size_x: u32,
        size_y: u32,
        samples: &[LinearSample],
        light_set: impl IntoIterator<Item = LightId>,
        material: MaterialRef,
    ) -> Result<Self> {
        let peak = samples
            .iter()
            .filter(|s| s.mapped)
            .fold(0.0f32, |acc, s| acc.max(s.value.min(MAX_LIGHT_INTENSITY)));
        let inv_scale = 1.0 / peak.max(BRIGHTNESS_EPSILON);
        let quantized = samples
            .iter()
            .map(|s| {
                let normalized = (s.value * inv_scale).max(0.0);
                let encoded = (normalized.powf(1.0 / ENCODE_GAMMA) * 255.0).trunc();
                Sample {
                    value: encoded.clamp(0.0, 255.0) as u8,
                    coverage: if s.mapped { 255 } else { 0 },
                }
            })
            .collect();
        Self::new(id, size_x, size_y, quantized, peak, light_set, material)
    }

    pub fn id(&self) -> AllocationId {
        self.id
    }
    pub fn size_x(&self) -> u32 {
        self.size_x
    }
    pub fn size_y(&self) -> u32 {
        self.size_y
    }
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
    pub fn peak_magnitude(&self) -> f32 {
        self.peak_magnitude
    }
    pub fn brightness_bucket(&self) -> u32 {
        self.brightness_bucket
    }
    pub fn light_set(&self) -> &BTreeSet<LightId> {
        &self.light_set
    }
    pub fn material(&self) -> MaterialRef {
        self.material
    }
    pub fn texel_count(&self) -> usize {
        self.samples.len()
    }
    /// Bytes of sample memory held by this allocation.
    pub fn byte_size(&self) -> usize {
        self.samples.len() * std::mem::size_of::<Sample>()
    }
    pub fn compatibility_key(&self) -> CompatibilityKey {
        CompatibilityKey {
            light_set: self.light_set.clone(),
            brightness_bucket: self.brightness_bucket,
            material: self.material,
        }
    }
    /// True when this allocation may share an atlas whose key is `key`.
    pub fn matches(&self, key: &CompatibilityKey) -> bool {
        self.brightness_bucket == key.brightness_bucket
            && self.material == key.material
            && self.light_set == key.light_set
    }
}

/// Serialized shape of a `RawAllocation`. A stored `brightness_bucket` is ignored.
#[derive(Deserialize)]
struct RawAllocationRecord {
    id: AllocationId,
    size_x: u32,
    size_y: u32,
    samples: Vec<Sample>,
    peak_magnitude: f32,
    light_set: BTreeSet<LightId>,
    material: MaterialRef,
}

impl TryFrom<RawAllocationRecord> for RawAllocation {
    type Error = LightmapAtlasError;

    fn try_from(r: RawAllocationRecord) -> Result<Self> {
        Self::new(
            r.id,
            r.size_x,
            r.size_y,
            r.samples,
            r.peak_magnitude,
            r.light_set,
            r.material,
        )
    }
}

/// Allocations may only share an atlas when all three fields are equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CompatibilityKey {
    pub light_set: BTreeSet<LightId>,
    pub brightness_bucket: u32,
    pub material: MaterialRef,
}

/// Axis-aligned rectangle (texels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn x2(&self) -> u32 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`).
    pub fn y2(&self) -> u32 {
        self.y + self.h
    }
    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }
    /// Returns true if `r` is fully inside `self`.
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.x2() <= self.x2() && r.y2() <= self.y2()
    }
    pub fn overlaps(&self, r: &Rect) -> bool {
        !(self.x >= r.x2() || r.x >= self.x2() || self.y >= r.y2() || r.y >= self.y2())
    }
}

/// A row-major grid of samples; one mip level of an atlas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SampleGrid {
    pub width: u32,
    pub height: u32,
    pub samples: Vec<Sample>,
}

impl SampleGrid {
    /// Grid of unmapped `{0,0}` texels.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            samples: vec![Sample::UNMAPPED; width as usize * height as usize],
        }
    }
    pub fn from_samples(width: u32, height: u32, samples: Vec<Sample>) -> Self {
        debug_assert_eq!(samples.len(), width as usize * height as usize);
        Self {
            width,
            height,
            samples,
        }
    }
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Sample {
        self.samples[self.index(x, y)]
    }
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, s: Sample) {
        let i = self.index(x, y);
        self.samples[i] = s;
    }
    pub fn mapped_count(&self) -> usize {
        self.samples.iter().filter(|s| s.is_mapped()).count()
    }
}

/// Where one allocation ended up and how to remap its UVs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    pub allocation_id: AllocationId,
    /// Id of the `FinalAtlas` owning this placement.
    pub atlas_id: usize,
    /// Top-left of the content (inside any padding).
    pub base_x: u32,
    pub base_y: u32,
    pub size_x: u32,
    pub size_y: u32,
    pub uv_scale: [f32; 2],
    pub uv_bias: [f32; 2],
    /// Linear intensity that an encoded 255 stands for.
    pub value_scale: f32,
}

impl Placement {
    /// Computes the UV remap of content at `(base_x, base_y)` of size `size_x x size_y`
    /// inside an atlas of `atlas_w x atlas_h`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        allocation_id: AllocationId,
        atlas_id: usize,
        base_x: u32,
        base_y: u32,
        size_x: u32,
        size_y: u32,
        atlas_w: u32,
        atlas_h: u32,
        value_scale: f32,
    ) -> Self {
        let aw = atlas_w as f32;
        let ah = atlas_h as f32;
        Self {
            allocation_id,
            atlas_id,
            base_x,
            base_y,
            size_x,
            size_y,
            uv_scale: [size_x as f32 / aw, size_y as f32 / ah],
            uv_bias: [(base_x as f32 + 0.5) / aw, (base_y as f32 + 0.5) / ah],
            value_scale,
        }
    }

    pub fn content_rect(&self) -> Rect {
        Rect::new(self.base_x, self.base_y, self.size_x, self.size_y)
    }

    /// Converts an encoded (possibly filtered) value back to linear intensity.
    pub fn decode(&self, encoded: f32) -> f32 {
        (encoded / 255.0).clamp(0.0, 1.0).powf(ENCODE_GAMMA) * self.value_scale
    }
}

/// A finished atlas: mip chain plus the placements it owns. Never mutated after emission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalAtlas {
    pub id: usize,
    pub width: u32,
    pub height: u32,
    /// Level 0 first.
    pub mips: Vec<SampleGrid>,
    pub placements: Vec<Placement>,
    pub key: CompatibilityKey,
    /// Holds a single oversized allocation without padding.
    pub dedicated: bool,
    pub padding: u32,
}

impl FinalAtlas {
    pub fn placement(&self, id: AllocationId) -> Option<&Placement> {
        self.placements.iter().find(|p| p.allocation_id == id)
    }

    /// Level 0, or `None` for an atlas assembled by hand without levels.
    /// Atlases from `encode_group` always carry at least one.
    pub fn base_level(&self) -> Option<&SampleGrid> {
        self.mips.first()
    }

    /// Renders a mip level as luma (value) + alpha (coverage) for previews.
    #[cfg(feature = "image")]
    pub fn mip_image(&self, level: usize) -> Option<image::GrayAlphaImage> {
        let grid = self.mips.get(level)?;
        let raw: Vec<u8> = grid
            .samples
            .iter()
            .flat_map(|s| [s.value, s.coverage])
            .collect();
        image::GrayAlphaImage::from_raw(grid.width, grid.height, raw)
    }
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    pub num_atlases: usize,
    pub num_placements: usize,
    /// Atlases holding one oversized allocation.
    pub num_dedicated: usize,
    /// Sum of level-0 width * height over all atlases.
    pub total_atlas_area: u64,
    /// Sum of content texels over all placements.
    pub content_area: u64,
    /// Content plus padding texels.
    pub padded_area: u64,
    /// content_area / total_atlas_area (0.0 to 1.0).
    pub occupancy: f64,
    pub max_atlas_width: u32,
    pub max_atlas_height: u32,
}

impl PackStats {
    pub fn from_atlases(atlases: &[FinalAtlas]) -> Self {
        let mut stats = PackStats {
            num_atlases: atlases.len(),
            num_placements: 0,
            num_dedicated: 0,
            total_atlas_area: 0,
            content_area: 0,
            padded_area: 0,
            occupancy: 0.0,
            max_atlas_width: 0,
            max_atlas_height: 0,
        };
        for atlas in atlases {
            stats.total_atlas_area += atlas.width as u64 * atlas.height as u64;
            stats.max_atlas_width = stats.max_atlas_width.max(atlas.width);
            stats.max_atlas_height = stats.max_atlas_height.max(atlas.height);
            if atlas.dedicated {
                stats.num_dedicated += 1;
            }
            let pad2 = atlas.padding as u64 * 2;
            for p in &atlas.placements {
                stats.num_placements += 1;
                stats.content_area += p.size_x as u64 * p.size_y as u64;
                stats.padded_area += (p.size_x as u64 + pad2) * (p.size_y as u64 + pad2);
            }
        }
        if stats.total_atlas_area > 0 {
            stats.occupancy = stats.content_area as f64 / stats.total_atlas_area as f64;
        }
        stats
    }

    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Atlases: {} ({} dedicated), Placements: {}, Occupancy: {:.2}%, Total Area: {} texels, Content Area: {} texels",
            self.num_atlases,
            self.num_dedicated,
            self.num_placements,
            self.occupancy * 100.0,
            self.total_atlas_area,
            self.content_area,
        )
    }

    /// Returns unused texels.
    pub fn wasted_area(&self) -> u64 {
        self.total_atlas_area.saturating_sub(self.content_area)
    }

    /// Returns wasted space as a percentage (0.0 to 100.0).
    pub fn waste_percentage(&self) -> f64 {
        if self.total_atlas_area > 0 {
            (self.wasted_area() as f64 / self.total_atlas_area as f64) * 100.0
        } else {
            0.0
        }
    }
}
