use crate::config::{AllocationOrder, AtlasConfig};
use crate::error::{LightmapAtlasError, Result};
use crate::model::{AllocationId, CompatibilityKey, Placement, RawAllocation, Rect};
use crate::packer::{Packer, RectLayoutAllocator};
use tracing::{debug, instrument};

/// An allocation bound to a group, with the top-left of its content.
#[derive(Debug, Clone)]
pub struct GroupMember {
    pub allocation: RawAllocation,
    pub base_x: u32,
    pub base_y: u32,
}

/// One output texture under construction.
#[derive(Debug, Clone)]
pub struct AtlasGroup {
    id: usize,
    key: CompatibilityKey,
    layout: RectLayoutAllocator,
    dedicated: bool,
    padding: u32,
    members: Vec<GroupMember>,
}

impl AtlasGroup {
    /// Empty shared group spanning `max_atlas_extent` squared.
    pub fn shared(id: usize, key: CompatibilityKey, cfg: &AtlasConfig) -> Self {
        let max = cfg.max_atlas_extent;
        Self {
            id,
            key,
            layout: RectLayoutAllocator::new(
                max,
                max,
                cfg.min_mip_extent,
                cfg.min_mip_extent,
                cfg.power_of_two_only,
            ),
            dedicated: false,
            padding: cfg.padding,
            members: Vec::new(),
        }
    }

    /// Group sized exactly to `allocation`, unpadded and closed to sharing.
    pub fn dedicated(id: usize, allocation: RawAllocation) -> Result<Self> {
        let (w, h) = (allocation.size_x(), allocation.size_y());
        let mut group = Self {
            id,
            key: allocation.compatibility_key(),
            layout: RectLayoutAllocator::new(w, h, 1, 1, false),
            dedicated: true,
            padding: 0,
            members: Vec::new(),
        };
        let (x, y) = group.layout.add(w, h)?;
        group.push_member(allocation, x, y)?;
        Ok(group)
    }

    pub fn id(&self) -> usize {
        self.id
    }
    pub fn key(&self) -> &CompatibilityKey {
        &self.key
    }
    pub fn is_dedicated(&self) -> bool {
        self.dedicated
    }
    pub fn padding(&self) -> u32 {
        self.padding
    }
    pub fn members(&self) -> &[GroupMember] {
        &self.members
    }
    pub fn layout(&self) -> &RectLayoutAllocator {
        &self.layout
    }
    /// Current (committed) texture extent.
    pub fn extent(&self) -> (u32, u32) {
        self.layout.extent()
    }

    /// Reserves a `w x h` region, growing the texture if needed.
    /// `None` when the layout is exhausted.
    pub fn reserve(&mut self, w: u32, h: u32) -> Result<Option<(u32, u32)>> {
        if w == 0 || h == 0 {
            return Err(LightmapAtlasError::InvalidSize {
                width: w,
                height: h,
            });
        }
        let request = Rect::new(0, 0, w, h);
        if self.dedicated || !self.layout.can_pack(&request) {
            return Ok(None);
        }
        Ok(self.layout.pack(&request).map(|r| (r.x, r.y)))
    }

    /// Binds `allocation` with content at `(base_x, base_y)`. The allocation's key must match.
    pub fn push_member(&mut self, allocation: RawAllocation, base_x: u32, base_y: u32) -> Result<()> {
        if !allocation.matches(&self.key) {
            return Err(LightmapAtlasError::IncompatibleMergeRequest {
                allocation: allocation.id(),
                group: self.id,
            });
        }
        self.members.push(GroupMember {
            allocation,
            base_x,
            base_y,
        });
        Ok(())
    }

    /// Content rectangles grown by the group's padding.
    pub fn padded_rects(&self) -> Vec<Rect> {
        let p = self.padding;
        self.members
            .iter()
            .map(|m| {
                Rect::new(
                    m.base_x - p,
                    m.base_y - p,
                    m.allocation.size_x() + p * 2,
                    m.allocation.size_y() + p * 2,
                )
            })
            .collect()
    }

    /// UV remaps of every member against the current extent.
    pub fn placements(&self, atlas_id: usize) -> Vec<Placement> {
        let (w, h) = self.extent();
        self.members
            .iter()
            .map(|m| {
                Placement::new(
                    m.allocation.id(),
                    atlas_id,
                    m.base_x,
                    m.base_y,
                    m.allocation.size_x(),
                    m.allocation.size_y(),
                    w,
                    h,
                    m.allocation.peak_magnitude(),
                )
            })
            .collect()
    }

    pub fn contains(&self, id: AllocationId) -> bool {
        self.members.iter().any(|m| m.allocation.id() == id)
    }
}

/// Assigns allocations to groups in the order they are pushed.
pub struct CompatibilityGrouper {
    cfg: AtlasConfig,
    groups: Vec<AtlasGroup>,
}

impl CompatibilityGrouper {
    pub fn new(cfg: AtlasConfig) -> Self {
        Self {
            cfg,
            groups: Vec::new(),
        }
    }

    /// Places one allocation: first matching shared group with room wins,
    /// otherwise a new shared group, or a dedicated one if it cannot fit a shared atlas.
    /// Returns the index of the chosen group.
    pub fn push(&mut self, allocation: RawAllocation) -> Result<usize> {
        let pad = self.cfg.padding;
        let pw = allocation.size_x() + pad * 2;
        let ph = allocation.size_y() + pad * 2;

        let mut target = None;
        for (i, group) in self.groups.iter_mut().enumerate() {
            if group.is_dedicated() || !allocation.matches(group.key()) {
                continue;
            }
            if let Some(origin) = group.reserve(pw, ph)? {
                target = Some((i, origin));
                break;
            }
        }
        if let Some((i, (x, y))) = target {
            debug!(id = %allocation.id(), group = i, x, y, "placed in existing group");
            self.groups[i].push_member(allocation, x + pad, y + pad)?;
            return Ok(i);
        }

        let id = self.groups.len();
        let max = self.cfg.max_atlas_extent;
        if pw <= max && ph <= max {
            let mut group = AtlasGroup::shared(id, allocation.compatibility_key(), &self.cfg);
            let (x, y) = group.layout.add(pw, ph)?;
            debug!(id = %allocation.id(), group = id, "opened shared group");
            group.push_member(allocation, x + pad, y + pad)?;
            self.groups.push(group);
        } else {
            debug!(
                id = %allocation.id(),
                group = id,
                w = allocation.size_x(),
                h = allocation.size_y(),
                "allocation exceeds shared atlas extent, opening dedicated group"
            );
            self.groups.push(AtlasGroup::dedicated(id, allocation)?);
        }
        Ok(id)
    }

    pub fn groups(&self) -> &[AtlasGroup] {
        &self.groups
    }

    pub fn finish(self) -> Vec<AtlasGroup> {
        self.groups
    }
}

/// Stable sort by `order`, ties broken by ascending id.
pub fn sort_allocations(allocations: &mut [RawAllocation], order: AllocationOrder) {
    let area = |a: &RawAllocation| a.size_x() as u64 * a.size_y() as u64;
    match order {
        AllocationOrder::None => {}
        AllocationOrder::IdAsc => allocations.sort_by_key(|a| a.id()),
        AllocationOrder::MaxSideDesc => allocations.sort_by(|a, b| {
            b.size_x()
                .max(b.size_y())
                .cmp(&a.size_x().max(a.size_y()))
                .then_with(|| a.id().cmp(&b.id()))
        }),
        AllocationOrder::AreaDesc => {
            allocations.sort_by(|a, b| area(b).cmp(&area(a)).then_with(|| a.id().cmp(&b.id())))
        }
        AllocationOrder::HeightDesc => allocations.sort_by(|a, b| {
            b.size_y()
                .cmp(&a.size_y())
                .then_with(|| a.id().cmp(&b.id()))
        }),
        AllocationOrder::WidthDesc => allocations.sort_by(|a, b| {
            b.size_x()
                .cmp(&a.size_x())
                .then_with(|| a.id().cmp(&b.id()))
        }),
    }
}

/// Partitions `allocations` into atlas groups. Every allocation lands in exactly one group.
#[instrument(skip_all)]
pub fn group_allocations(
    mut allocations: Vec<RawAllocation>,
    cfg: &AtlasConfig,
) -> Result<Vec<AtlasGroup>> {
    sort_allocations(&mut allocations, cfg.allocation_order);
    let mut grouper = CompatibilityGrouper::new(cfg.clone());
    for allocation in allocations {
        grouper.push(allocation)?;
    }
    let groups = grouper.finish();
    debug!(groups = groups.len(), "grouping complete");
    Ok(groups)
}
