use ioengine_array_source::{Dataspace, Subspace};
use ioengine_primitives::{DimRole, ElementType};

use crate::codec::DimensionCodec;
use crate::dim::DimSpec;
use crate::error::PlanError;

/// Which algorithmic regime the Reader/Transposer should use for a
/// fragment (`spec.md` §4.6). The planner only distinguishes
/// "transpose required or not"; choosing `R1` over the default `R2`
/// when transpose is required is an engine-level decision (e.g. for
/// very small fragments where tiling overhead isn't worth it).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReadRegime {
    R0,
    R2,
}

/// Tile sizes and stride tables needed by [`crate::TileCursor`] when
/// `regime` is [`ReadRegime::R2`]. `dims` is the fragment's read shape,
/// one entry per dimension, in a single fixed order shared by every
/// field below.
#[derive(Clone, Debug)]
pub struct TransposeLayout {
    pub extents: Vec<u64>,
    pub blocks: Vec<u64>,
    pub src_products: Vec<u64>,
    pub dst_products: Vec<u64>,
}

/// The output of the Reshape Planner (`spec.md` §4.5, §9 Design Notes):
/// the single seam the three reader regimes consume.
#[derive(Clone, Debug)]
pub struct Plan {
    pub regime: ReadRegime,
    pub read_subspace: Subspace,
    pub array_length: u64,
    pub frag_key_start: u64,
    pub tuples_per_frag: u64,
    pub element_type: ElementType,
    pub transpose: Option<TransposeLayout>,
}

impl Plan {
    pub fn cache_buffer_len_bytes(&self) -> u64 {
        self.tuples_per_frag * self.array_length * self.element_type.size_of() as u64
    }
}

fn validate_ordinals(dims: &[DimSpec]) -> Result<(), PlanError> {
    let mut seen = vec![false; dims.len()];
    for d in dims {
        let o = d.ordinal as usize;
        if o >= dims.len() || seen[o] {
            return Err(PlanError::BadOrdinals { rank: dims.len() });
        }
        seen[o] = true;
    }
    Ok(())
}

/// Chooses per-dimension tile sizes for a cache-blocked transpose over
/// `extents` (`spec.md` §4.5 "Tile-size selection"), given the element
/// size and the cache geometry.
pub fn select_tile_sizes(extents: &[u64], elem_size: usize, cache_line_size: u64, cache_size: u64) -> Vec<u64> {
    let n = extents.len() as u32;
    let line = (cache_line_size / elem_size as u64).max(1);
    let max_blocks = ((cache_size / 2) / elem_size as u64).max(1);
    let mut b = (max_blocks as f64).powf(1.0 / n as f64).floor() as u64;
    b = b.max(1);
    if b > line {
        b = (b / line) * line;
        b = b.max(line);
    }
    extents.iter().map(|&e| e.min(b).max(1)).collect()
}

/// Builds a [`Plan`] for one fragment: dataspace plus dimension specs in
/// on `spec.md` §4.5 steps 1-7.
pub fn plan_fragment(
    dataspace: &Dataspace,
    dims: &[DimSpec],
    tuples_per_frag: u64,
    frag_key_start: u64,
    memory_buffer: u64,
    cache_line_size: u64,
    cache_size: u64,
) -> Result<Plan, PlanError> {
    validate_ordinals(dims)?;
    for (i, d) in dims.iter().enumerate() {
        if d.start > d.end {
            return Err(PlanError::InvalidBounds { dim: i, start: d.start, end: d.end });
        }
    }

    // Step 1: nexp, nimp, A.
    let explicit: Vec<&DimSpec> = dims.iter().filter(|d| d.role == DimRole::Explicit).collect();
    let implicit: Vec<&DimSpec> = dims.iter().filter(|d| d.role == DimRole::Implicit).collect();
    let array_length: u64 = implicit.iter().map(|d| d.count()).product::<u64>().max(1);
    let elem_size = dataspace.element_type.size_of() as u64;

    // Step 2: memory budget (I4).
    if tuples_per_frag.saturating_mul(elem_size).saturating_mul(array_length) > memory_buffer / 2 {
        return Err(PlanError::MemoryBudget { tuples_per_frag, memory_buffer });
    }

    let mut explicit_sorted = explicit.clone();
    explicit_sorted.sort_by_key(|d| d.ordinal);

    let total_explicit: u64 = explicit_sorted.iter().map(|d| d.count()).product::<u64>().max(1);
    if frag_key_start < 1 || frag_key_start + tuples_per_frag - 1 > total_explicit {
        return Err(PlanError::KeyRangeOutOfBounds {
            start: frag_key_start,
            end: frag_key_start + tuples_per_frag,
            total: total_explicit,
        });
    }

    // Step 3: most external explicit dim M with extent > 1.
    let m_pos = explicit_sorted.iter().position(|d| d.count() > 1).unwrap_or(explicit_sorted.len().saturating_sub(1));

    // Step 4: product of extents strictly inside M (more internal, i.e. later in the sorted order).
    let curr_rows: u64 = explicit_sorted[m_pos + 1..].iter().map(|d| d.count()).product::<u64>().max(1);
    if explicit_sorted.len() > m_pos + 1 {
        if tuples_per_frag < curr_rows || tuples_per_frag % curr_rows != 0 {
            return Err(PlanError::FragmentedDimensions { tuples_per_frag, curr_rows });
        }
    }
    let m_extent_in_frag = tuples_per_frag / curr_rows;

    // Step 6 (computed ahead of step 5 since step 5 consumes it): decode
    // frag_key_start through the codec over explicit extents (level order).
    let codec = DimensionCodec::new(explicit_sorted.iter().map(|d| d.count()).collect());
    let start_coords = codec.decode(frag_key_start);

    // Step 5: build count[]/start[] in source order, folding in step 6's offsets.
    let mut by_source: Vec<&DimSpec> = dims.iter().collect();
    by_source.sort_by_key(|d| d.source_index);

    let mut start = Vec::with_capacity(dims.len());
    let mut count = Vec::with_capacity(dims.len());
    for d in &by_source {
        if d.role == DimRole::Implicit {
            start.push(d.start);
            count.push(d.count());
            continue;
        }
        let pos = explicit_sorted.iter().position(|e| e.ordinal == d.ordinal).expect("explicit dim in sorted list");
        let coord = start_coords[pos]; // 1-based
        if pos == m_pos {
            start.push(d.start + coord - 1);
            count.push(m_extent_in_frag);
        } else {
            start.push(d.start + coord - 1);
            count.push(if pos > m_pos { d.count() } else { 1 });
        }
    }
    if count.iter().any(|&c| c == 0) {
        let dim = count.iter().position(|&c| c == 0).unwrap();
        return Err(PlanError::ZeroExtent { dim });
    }

    let read_subspace = Subspace { start, count: count.clone() };

    // Step 7: does destination (explicit-then-implicit, by ordinal) order
    // match source order?
    let mut by_ordinal: Vec<&DimSpec> = dims.iter().collect();
    by_ordinal.sort_by_key(|d| d.ordinal);
    let needs_transpose = by_ordinal.iter().map(|d| d.source_index).collect::<Vec<_>>()
        != by_source.iter().map(|d| d.source_index).collect::<Vec<_>>();

    if !needs_transpose {
        tracing::debug!(frag_key_start, tuples_per_frag, regime = "R0", "fragment needs no transpose");
        return Ok(Plan {
            regime: ReadRegime::R0,
            read_subspace,
            array_length,
            frag_key_start,
            tuples_per_frag,
            element_type: dataspace.element_type,
            transpose: None,
        });
    }

    // Build stride tables for both orderings over the same per-`by_source`-index dims.
    // `count` was built while iterating `by_source`, so it's already indexed the same way.
    let src_extents: Vec<u64> = count.clone();
    let src_products = row_major_products(&src_extents);

    let dest_order_source_indices: Vec<usize> = by_ordinal.iter().map(|d| d.source_index).collect();
    let dest_extents: Vec<u64> = by_ordinal
        .iter()
        .map(|d| {
            let pos = by_source.iter().position(|x| x.source_index == d.source_index).unwrap();
            count[pos]
        })
        .collect();
    let dst_products_in_dest_order = row_major_products(&dest_extents);
    // Re-express destination strides in source-index order, matching src_products' indexing.
    let mut dst_products = vec![0u64; by_source.len()];
    for (dest_pos, &src_idx) in dest_order_source_indices.iter().enumerate() {
        let src_pos = by_source.iter().position(|x| x.source_index == src_idx).unwrap();
        dst_products[src_pos] = dst_products_in_dest_order[dest_pos];
    }

    let blocks = select_tile_sizes(&src_extents, elem_size as usize, cache_line_size, cache_size);
    tracing::debug!(frag_key_start, tuples_per_frag, regime = "R2", ?blocks, "fragment requires cache-blocked transpose");

    Ok(Plan {
        regime: ReadRegime::R2,
        read_subspace,
        array_length,
        frag_key_start,
        tuples_per_frag,
        element_type: dataspace.element_type,
        transpose: Some(TransposeLayout {
            extents: src_extents,
            blocks,
            src_products,
            dst_products,
        }),
    })
}

/// Row-major element strides for `extents`: `products[i] = product of
/// extents[i+1..]`.
fn row_major_products(extents: &[u64]) -> Vec<u64> {
    let mut products = vec![1u64; extents.len()];
    for i in (0..extents.len().saturating_sub(1)).rev() {
        products[i] = products[i + 1] * extents[i + 1];
    }
    products
}
