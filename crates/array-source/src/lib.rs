//! Abstract interface to an external N-dimensional array store (§4.1), and
//! the mutex discipline the engine requires around it (§5). This crate
//! knows nothing about fragments, reshaping, or rows; it only models
//! "open a container, open a dataset, describe it, read a hyper-rectangle
//! out of it".

mod error;
mod in_memory;
mod path;

pub use error::SourceError;
pub use in_memory::InMemoryArraySource;
pub use path::{parse_source_path, SourcePath, SCHEME_PREFIX};

use ioengine_primitives::ElementType;
use parking_lot::Mutex;

/// Rank, per-dimension extents, element type, and optional fill value of a
/// dataset. Immutable for the life of a read (`spec.md` §3).
#[derive(Clone, Debug, PartialEq)]
pub struct Dataspace {
    pub extents: Vec<u64>,
    pub element_type: ElementType,
    pub fill_value: Option<FillValue>,
}

impl Dataspace {
    pub fn rank(&self) -> usize {
        self.extents.len()
    }
}

/// A typed fill value, used to pre-initialize destination buffers ahead of
/// a streaming read (see `SPEC_FULL.md` §4.6).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FillValue {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
}

impl FillValue {
    /// Writes this fill value's little-endian bytes into `dst`, once per
    /// element. `dst.len()` must be a multiple of the element size.
    pub fn fill(&self, dst: &mut [u8]) {
        let bytes: &[u8] = match self {
            FillValue::I8(v) => &v.to_le_bytes(),
            FillValue::I16(v) => &v.to_le_bytes(),
            FillValue::I32(v) => &v.to_le_bytes(),
            FillValue::I64(v) => &v.to_le_bytes(),
            FillValue::F32(v) => &v.to_le_bytes(),
            FillValue::F64(v) => &v.to_le_bytes(),
        };
        for chunk in dst.chunks_exact_mut(bytes.len()) {
            chunk.copy_from_slice(bytes);
        }
    }
}

/// A hyper-rectangle to read: `start[d]..start[d]+count[d]` for every
/// dimension `d`, in the dataset's own (source) dimension order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subspace {
    pub start: Vec<u64>,
    pub count: Vec<u64>,
}

impl Subspace {
    pub fn element_count(&self) -> u64 {
        self.count.iter().product()
    }
}

/// Callback-based reduction over blocks delivered by [`ArraySource::read_stream`].
pub trait BlockReducer {
    /// Called once per block the adapter chooses to deliver. `block_start`
    /// is the block's offset within the requested subspace (not the whole
    /// dataset); `data` is the raw little-endian element bytes for that
    /// block.
    fn reduce_block(&mut self, block_start: &[u64], data: &[u8]);
}

/// Capability set consumed by the core (`spec.md` §4.1). Implementors
/// represent one external array store; the engine never assumes anything
/// about `Container`/`Dataset` beyond what this trait exposes.
pub trait ArraySource {
    type Container;
    type Dataset;

    fn open_container(&self, name: &str) -> Result<Self::Container, SourceError>;
    fn close_container(&self, container: Self::Container) -> Result<(), SourceError>;

    fn open_dataset(&self, container: &Self::Container, var_name: &str) -> Result<Self::Dataset, SourceError>;
    fn close_dataset(&self, dataset: Self::Dataset) -> Result<(), SourceError>;

    fn dataspace(&self, dataset: &Self::Dataset) -> Result<Dataspace, SourceError>;

    /// Reads `sub` into `dst`. `dst.len()` must equal
    /// `sub.element_count() * element_size`; implementations should return
    /// [`SourceError::BufferSize`] otherwise rather than panicking.
    fn read(&self, dataset: &Self::Dataset, sub: &Subspace, dst: &mut [u8]) -> Result<(), SourceError>;

    /// Streams `sub` block-by-block into `reducer`. The default
    /// implementation reports the capability as unsupported; adapters that
    /// can reduce during read (e.g. online aggregation) override this.
    fn read_stream(
        &self,
        _dataset: &Self::Dataset,
        _sub: &Subspace,
        _reducer: &mut dyn BlockReducer,
    ) -> Result<(), SourceError> {
        Err(SourceError::Unsupported("read_stream"))
    }
}

/// Wraps any [`ArraySource`] so that every `open`/`close`/`dataspace` call
/// is serialized under one mutex, per `spec.md` §5's `nc_lock` discipline.
/// The mutex is deliberately *not* held across [`ArraySource::read`] or
/// [`ArraySource::read_stream`] — those may block for a long time and must
/// run concurrently across fragments.
pub struct MutexArraySource<A> {
    inner: A,
    lock: Mutex<()>,
}

impl<A: ArraySource> MutexArraySource<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            lock: Mutex::new(()),
        }
    }

    pub fn open_container(&self, name: &str) -> Result<A::Container, SourceError> {
        let _guard = self.lock.lock();
        tracing::trace!(container = name, "open_container under nc_lock");
        self.inner.open_container(name)
    }

    pub fn close_container(&self, container: A::Container) -> Result<(), SourceError> {
        let _guard = self.lock.lock();
        tracing::trace!("close_container under nc_lock");
        self.inner.close_container(container)
    }

    pub fn open_dataset(&self, container: &A::Container, var_name: &str) -> Result<A::Dataset, SourceError> {
        let _guard = self.lock.lock();
        tracing::trace!(var_name, "open_dataset under nc_lock");
        self.inner.open_dataset(container, var_name)
    }

    pub fn close_dataset(&self, dataset: A::Dataset) -> Result<(), SourceError> {
        let _guard = self.lock.lock();
        tracing::trace!("close_dataset under nc_lock");
        self.inner.close_dataset(dataset)
    }

    pub fn dataspace(&self, dataset: &A::Dataset) -> Result<Dataspace, SourceError> {
        let _guard = self.lock.lock();
        tracing::trace!("dataspace under nc_lock");
        self.inner.dataspace(dataset)
    }

    /// Not serialized under the mutex: see struct docs.
    pub fn read(&self, dataset: &A::Dataset, sub: &Subspace, dst: &mut [u8]) -> Result<(), SourceError> {
        self.inner.read(dataset, sub, dst)
    }

    /// Not serialized under the mutex: see struct docs.
    pub fn read_stream(
        &self,
        dataset: &A::Dataset,
        sub: &Subspace,
        reducer: &mut dyn BlockReducer,
    ) -> Result<(), SourceError> {
        self.inner.read_stream(dataset, sub, reducer)
    }
}
