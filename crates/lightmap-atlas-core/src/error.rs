use crate::model::AllocationId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LightmapAtlasError {
    #[error("Invalid allocation size for {id}: {width}x{height}")]
    InvalidAllocationSize {
        id: AllocationId,
        width: u32,
        height: u32,
    },
    #[error("Sample count mismatch for {id}: expected {expected}, got {actual}")]
    SampleCountMismatch {
        id: AllocationId,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid layout request: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    /// The layout tree has no leaf that can hold the request, even with growth.
    #[error("Layout exhausted: no room for {width}x{height}")]
    LayoutExhausted { width: u32, height: u32 },
    #[error("Allocation {allocation} does not match the compatibility key of group {group}")]
    IncompatibleMergeRequest {
        allocation: AllocationId,
        group: usize,
    },
    #[error("Allocation {0} was submitted twice")]
    DuplicateAllocation(AllocationId),
    #[error("Allocation {0} has no placement in this atlas")]
    UnknownAllocation(AllocationId),
    #[error("Atlas {0} has no mip levels")]
    EmptyMipChain(usize),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, LightmapAtlasError>;
