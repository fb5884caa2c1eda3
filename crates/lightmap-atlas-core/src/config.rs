use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Order in which pending allocations are fed to the grouper.
/// Every order breaks ties by ascending allocation id so results are deterministic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AllocationOrder {
    /// Largest side first (the classic light-map encoder order).
    MaxSideDesc,
    AreaDesc,
    HeightDesc,
    WidthDesc,
    IdAsc,
    /// Keep submission order.
    None,
}

impl FromStr for AllocationOrder {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "max_side_desc" => Ok(Self::MaxSideDesc),
            "area_desc" => Ok(Self::AreaDesc),
            "height_desc" => Ok(Self::HeightDesc),
            "width_desc" => Ok(Self::WidthDesc),
            "id_asc" => Ok(Self::IdAsc),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasConfig {
    /// Side length of a shared atlas (square). Shared atlases never exceed it.
    pub max_atlas_extent: u32,
    /// Texels of padding on every side of each shared allocation.
    pub padding: u32,
    /// Pending sample bytes that trigger an automatic flush.
    pub group_flush_threshold_bytes: usize,
    /// Round committed atlas extents up to powers of two.
    pub power_of_two_only: bool,
    /// Smallest mip extent per axis (format block size). Also the initial atlas extent.
    #[serde(default = "default_min_mip_extent")]
    pub min_mip_extent: u32,
    #[serde(default = "default_allocation_order")]
    pub allocation_order: AllocationOrder,
    /// Encode independent groups in parallel when feature "parallel" is on.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            max_atlas_extent: 512,
            padding: 2,
            // four full-size atlases worth of two-byte samples
            group_flush_threshold_bytes: 512 * 512 * 4 * std::mem::size_of::<crate::model::Sample>(),
            power_of_two_only: true,
            min_mip_extent: default_min_mip_extent(),
            allocation_order: default_allocation_order(),
            parallel: default_parallel(),
        }
    }
}

impl AtlasConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - `max_atlas_extent` or `min_mip_extent` is zero
    /// - `power_of_two_only` is set and `max_atlas_extent` is not a power of two
    /// - padding leaves no room for a 1x1 allocation in a shared atlas
    /// - the flush threshold is zero
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::LightmapAtlasError;

        if self.max_atlas_extent == 0 {
            return Err(LightmapAtlasError::InvalidConfig(
                "max_atlas_extent must be greater than zero".into(),
            ));
        }
        if self.min_mip_extent == 0 {
            return Err(LightmapAtlasError::InvalidConfig(
                "min_mip_extent must be greater than zero".into(),
            ));
        }
        if self.power_of_two_only && !self.max_atlas_extent.is_power_of_two() {
            return Err(LightmapAtlasError::InvalidConfig(format!(
                "max_atlas_extent ({}) must be a power of two when power_of_two_only is set",
                self.max_atlas_extent
            )));
        }
        if self.padding.saturating_mul(2).saturating_add(1) > self.max_atlas_extent {
            return Err(LightmapAtlasError::InvalidConfig(format!(
                "padding ({}) * 2 leaves no usable space in a {}x{} atlas",
                self.padding, self.max_atlas_extent, self.max_atlas_extent
            )));
        }
        if self.group_flush_threshold_bytes == 0 {
            return Err(LightmapAtlasError::InvalidConfig(
                "group_flush_threshold_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn default_min_mip_extent() -> u32 {
    1
}
fn default_allocation_order() -> AllocationOrder {
    AllocationOrder::MaxSideDesc
}
fn default_parallel() -> bool {
    false
}

/// Builder for `AtlasConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn max_atlas_extent(mut self, v: u32) -> Self {
        self.cfg.max_atlas_extent = v;
        self
    }
    pub fn padding(mut self, v: u32) -> Self {
        self.cfg.padding = v;
        self
    }
    pub fn flush_threshold_bytes(mut self, v: usize) -> Self {
        self.cfg.group_flush_threshold_bytes = v;
        self
    }
    pub fn pow2(mut self, v: bool) -> Self {
        self.cfg.power_of_two_only = v;
        self
    }
    pub fn min_mip_extent(mut self, v: u32) -> Self {
        self.cfg.min_mip_extent = v;
        self
    }
    pub fn allocation_order(mut self, v: AllocationOrder) -> Self {
        self.cfg.allocation_order = v;
        self
    }
    pub fn parallel(mut self, v: bool) -> Self {
        self.cfg.parallel = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}

impl AtlasConfig {
    /// Create a fluent builder for `AtlasConfig`.
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }
}
