//! Reader/Transposer, Row Builder, and the engine context that ties
//! array sources, expressions, and the reshape planner together.

mod config;
mod context;
mod error;
mod reader;
mod record;
pub mod tracing_setup;

pub use config::EngineConfig;
pub use context::EngineContext;
pub use error::EngineError;
pub use reader::{read_fragment, read_r0, read_r1, read_r2};
pub use record::{CompressionPlugin, Passthrough, Record, RecordSet, RowBuilder};

pub use ioengine_reshape::{plan_fragment, DimSpec, DimensionCodec, Plan, PlanError, ReadRegime};
