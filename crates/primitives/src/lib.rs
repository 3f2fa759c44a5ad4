//! Small identifier and scalar-type primitives shared across the io-engine
//! crates. Kept dependency-free (besides `thiserror`) so every other crate
//! in the workspace can depend on it without pulling in the rest of the
//! engine, matching the role `spacetimedb-primitives` plays as the leaf of
//! the SpacetimeDB crate graph.

use std::fmt;

mod element_type;
pub use element_type::ElementType;

/// 0-based position of a dimension in the source array's own ordering.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct SourceOrdinal(pub u32);

/// 0-based position of a dimension in the user-requested (explicit-first)
/// ordering. Distinct from [`SourceOrdinal`]; see the GLOSSARY entry for
/// "Ordinal/level".
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct Level(pub u32);

/// 1-based linear index over the explicit cross-product, absolute within
/// the full array (not fragment-relative).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RowId {
    fn from(v: u64) -> Self {
        RowId(v)
    }
}

impl From<RowId> for u64 {
    fn from(v: RowId) -> Self {
        v.0
    }
}

/// Whether a dimension's coordinate becomes part of the row key (explicit)
/// or is folded into the payload (implicit).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DimRole {
    Explicit,
    Implicit,
}
