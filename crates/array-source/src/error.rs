use thiserror::Error;

/// Failures surfaced by an [`crate::ArraySource`] implementation or by the
/// mutex discipline wrapped around it. Kept distinct from the engine's
/// `ExecError`/`MemoryError` per `spec.md` §7: any adapter failure
/// collapses to `SourceError` at this layer, and the engine wraps it.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to open container `{name}`: {reason}")]
    OpenContainer { name: String, reason: String },

    #[error("failed to open dataset `{var}`: {reason}")]
    OpenDataset { var: String, reason: String },

    #[error("failed to read dataspace metadata: {0}")]
    Dataspace(String),

    #[error("read of {requested} bytes failed: {reason}")]
    Read { requested: usize, reason: String },

    #[error("destination buffer has {got} bytes, expected {expected}")]
    BufferSize { expected: usize, got: usize },

    #[error("invalid source path `{0}`: {1}")]
    InvalidPath(String, &'static str),

    #[error("adapter does not support `{0}`")]
    Unsupported(&'static str),
}
