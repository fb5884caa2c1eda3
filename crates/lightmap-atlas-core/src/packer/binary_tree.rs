use crate::error::{LightmapAtlasError, Result};
use crate::model::Rect;
use crate::packer::Packer;

/// Node of the layout tree. Either a leaf (`children == None`) or split into two
/// children that exactly tile it. Only leaves are ever `used`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutNode {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    pub used: bool,
    pub children: Option<(usize, usize)>,
}

impl LayoutNode {
    fn leaf(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self {
            x,
            y,
            w,
            h,
            used: false,
            children: None,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }
}

/// Binary-tree rectangle allocator for a single texture.
///
/// The tree spans the maximum extent; the committed extent (what the texture
/// would be if finished now) grows as regions are used, so callers can first
/// try to fit without growing and only then allow growth.
#[derive(Debug, Clone)]
pub struct RectLayoutAllocator {
    nodes: Vec<LayoutNode>,
    size_x: u32,
    size_y: u32,
    power_of_two: bool,
}

impl RectLayoutAllocator {
    /// `max_*` is the root extent, `min_*` the starting committed extent (clamped to the root).
    pub fn new(max_w: u32, max_h: u32, min_w: u32, min_h: u32, power_of_two: bool) -> Self {
        let mut size_x = min_w.clamp(1, max_w.max(1));
        let mut size_y = min_h.clamp(1, max_h.max(1));
        if power_of_two {
            size_x = size_x.next_power_of_two();
            size_y = size_y.next_power_of_two();
        }
        Self {
            nodes: vec![LayoutNode::leaf(0, 0, max_w, max_h)],
            size_x,
            size_y,
            power_of_two,
        }
    }

    /// Committed extent: the smallest texture containing every used region.
    pub fn extent(&self) -> (u32, u32) {
        (self.size_x, self.size_y)
    }

    pub fn max_extent(&self) -> (u32, u32) {
        (self.nodes[0].w, self.nodes[0].h)
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    /// Rectangles of all used leaves.
    pub fn used_rects(&self) -> Vec<Rect> {
        self.nodes
            .iter()
            .filter(|n| n.used)
            .map(LayoutNode::rect)
            .collect()
    }

    /// True if `w x h` could fit the root at all.
    pub fn can_ever_fit(&self, w: u32, h: u32) -> bool {
        let (mw, mh) = self.max_extent();
        w <= mw && h <= mh
    }

    /// Places `w x h` and returns its origin, or `None` if no free leaf accepts it.
    /// With `allow_grow == false` the region must lie inside the committed extent.
    pub fn try_add(&mut self, w: u32, h: u32, allow_grow: bool) -> Result<Option<(u32, u32)>> {
        if w == 0 || h == 0 {
            return Err(LightmapAtlasError::InvalidSize {
                width: w,
                height: h,
            });
        }
        let Some(idx) = self.insert(0, w, h, allow_grow) else {
            return Ok(None);
        };
        let node = &mut self.nodes[idx];
        node.used = true;
        let (x, y) = (node.x, node.y);
        self.commit(x + w, y + h);
        Ok(Some((x, y)))
    }

    /// Fits without growing if possible, otherwise with growth.
    /// Fails with `LayoutExhausted` when the tree has no room at all.
    pub fn add(&mut self, w: u32, h: u32) -> Result<(u32, u32)> {
        if let Some(origin) = self.try_add(w, h, false)? {
            return Ok(origin);
        }
        self.try_add(w, h, true)?
            .ok_or(LightmapAtlasError::LayoutExhausted {
                width: w,
                height: h,
            })
    }

    fn has_room(&self, idx: usize, w: u32, h: u32) -> bool {
        let node = &self.nodes[idx];
        match node.children {
            Some((a, b)) => self.has_room(a, w, h) || self.has_room(b, w, h),
            None => !node.used && node.w >= w && node.h >= h,
        }
    }

    fn commit(&mut self, x2: u32, y2: u32) {
        let (x2, y2) = if self.power_of_two {
            (x2.next_power_of_two(), y2.next_power_of_two())
        } else {
            (x2, y2)
        };
        self.size_x = self.size_x.max(x2);
        self.size_y = self.size_y.max(y2);
    }

    fn insert(&mut self, idx: usize, w: u32, h: u32, allow_grow: bool) -> Option<usize> {
        let node = self.nodes[idx];
        if let Some((a, b)) = node.children {
            return self
                .insert(a, w, h, allow_grow)
                .or_else(|| self.insert(b, w, h, allow_grow));
        }
        if node.used || node.w < w || node.h < h {
            return None;
        }
        if !allow_grow && (node.x + w > self.size_x || node.y + h > self.size_y) {
            return None;
        }
        if node.w == w && node.h == h {
            return Some(idx);
        }

        let excess_w = node.w - w;
        let excess_h = node.h - h;
        let (first, second) = if excess_w > excess_h {
            (
                LayoutNode::leaf(node.x, node.y, w, node.h),
                LayoutNode::leaf(node.x + w, node.y, excess_w, node.h),
            )
        } else {
            (
                LayoutNode::leaf(node.x, node.y, node.w, h),
                LayoutNode::leaf(node.x, node.y + h, node.w, excess_h),
            )
        };
        let a = self.nodes.len();
        self.nodes.push(first);
        self.nodes.push(second);
        self.nodes[idx].children = Some((a, a + 1));
        self.insert(a, w, h, allow_grow)
    }
}

impl Packer for RectLayoutAllocator {
    /// True if some free leaf can take `rect`, growing the extent if needed.
    fn can_pack(&self, rect: &Rect) -> bool {
        rect.w > 0 && rect.h > 0 && self.has_room(0, rect.w, rect.h)
    }

    fn pack(&mut self, rect: &Rect) -> Option<Rect> {
        let (x, y) = self.add(rect.w, rect.h).ok()?;
        Some(Rect::new(x, y, rect.w, rect.h))
    }
}
