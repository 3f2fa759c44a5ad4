use thiserror::Error;

use ioengine_array_source::SourceError;
use ioengine_expr::EvalError;
use ioengine_reshape::PlanError;

/// The six error kinds of `spec.md` §7, layered as a `thiserror` enum
/// wrapping the more specific per-component errors, in the style of
/// `crates/core/src/error.rs`'s umbrella enums.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("required argument `{0}` is missing")]
    NullParam(&'static str),

    /// Allocation failure or buffer exceeding the memory budget (I4).
    /// The concrete-examples text in `spec.md` §8 (scenario S4) labels
    /// this case `ExecError`; this crate follows the `spec.md` §7 "Kinds"
    /// taxonomy instead, which defines budget overruns as `MemoryError`
    /// (see `DESIGN.md`).
    #[error("memory budget exceeded: {0}")]
    Memory(String),

    #[error("expression evaluation failed: {0}")]
    Parse(#[from] EvalError),

    /// Dataspace mismatch, dim-order invariant violated, or
    /// fragmentation of internal explicit dims (`spec.md` §7, scenario
    /// S5).
    #[error("execution error: {0}")]
    Exec(String),

    #[error("array source failure: {0}")]
    Source(#[from] SourceError),

    #[error("plugin function failed: {0}")]
    Plugin(String),
}

impl From<PlanError> for EngineError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::MemoryBudget { .. } => EngineError::Memory(e.to_string()),
            other => EngineError::Exec(other.to_string()),
        }
    }
}
