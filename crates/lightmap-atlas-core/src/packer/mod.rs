use crate::model::Rect;

pub mod binary_tree;

pub use binary_tree::{LayoutNode, RectLayoutAllocator};

/// A packer places rectangles into one texture.
///
/// Implementations must never overlap placed rectangles. Only the size of the
/// requested `rect` is used; `pack` returns the placed rectangle, or `None` if
/// it cannot be placed on this texture.
pub trait Packer {
    fn can_pack(&self, rect: &Rect) -> bool;
    fn pack(&mut self, rect: &Rect) -> Option<Rect>;
}
