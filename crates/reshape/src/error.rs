use thiserror::Error;

/// Failures raised while turning a dataspace and a set of dimension
/// specifications into a [`crate::Plan`] (`spec.md` §4.5).
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("fragment of {tuples_per_frag} tuples exceeds half the memory buffer ({memory_buffer} bytes)")]
    MemoryBudget {
        tuples_per_frag: u64,
        memory_buffer: u64,
    },

    #[error("explicit dimensions are fragmented: tuples_per_frag {tuples_per_frag} is not a multiple of {curr_rows}")]
    FragmentedDimensions { tuples_per_frag: u64, curr_rows: u64 },

    #[error("dimension {dim} has start {start} > end {end}")]
    InvalidBounds { dim: usize, start: u64, end: u64 },

    #[error("dimension ordinals are not a bijection over 0..{rank}")]
    BadOrdinals { rank: usize },

    #[error("fragment key range [{start}, {end}) lies outside 1..={total}")]
    KeyRangeOutOfBounds { start: u64, end: u64, total: u64 },

    #[error("dimension {dim} would be read with zero extent")]
    ZeroExtent { dim: usize },
}
