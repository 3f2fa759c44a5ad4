//! Dimension-ID codec and reshape planner (`spec.md` §4.2, §4.5): turns a
//! dataspace plus the caller's requested dimension subsets into the
//! single `Plan` value the Reader/Transposer consumes.

mod codec;
mod dim;
mod error;
mod plan;
mod tile;

pub use codec::DimensionCodec;
pub use dim::DimSpec;
pub use error::PlanError;
pub use plan::{plan_fragment, select_tile_sizes, Plan, ReadRegime, TransposeLayout};
pub use tile::TileCursor;
