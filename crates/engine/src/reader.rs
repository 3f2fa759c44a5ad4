use ioengine_array_source::{ArraySource, FillValue, Subspace};
use ioengine_primitives::{DimRole, ElementType};
use ioengine_reshape::{DimSpec, Plan, ReadRegime, TileCursor, TransposeLayout};

use crate::context::EngineContext;
use crate::error::EngineError;
use crate::record::{RecordSet, RowBuilder};

/// R0, per `spec.md` §4.6: source order already matches destination
/// order (or a reduction kernel makes every row independent), so each
/// row is read with its own 1-row subspace computed from the
/// Dimension-ID Codec and emitted directly.
///
/// Supplemented from `original_source`: when the dataset reports a fill
/// value, the row buffer is pre-filled with it before the read, so any
/// cell the adapter leaves untouched (e.g. a short read at the edge of
/// the array) still carries a defined value rather than uninitialized
/// memory.
pub fn read_r0<A: ArraySource>(
    ctx: &EngineContext,
    source: &A,
    dataset: &A::Dataset,
    dims: &[DimSpec],
    element_type: ElementType,
    array_length: u64,
    frag_key_start: u64,
    tuples_per_frag: u64,
    fill_value: Option<FillValue>,
    row_builder: &RowBuilder,
) -> Result<RecordSet, EngineError> {
    let mut explicit_sorted: Vec<&DimSpec> = dims.iter().filter(|d| d.role == DimRole::Explicit).collect();
    explicit_sorted.sort_by_key(|d| d.ordinal);
    let codec = ioengine_reshape::DimensionCodec::new(explicit_sorted.iter().map(|d| d.count()).collect());

    let mut by_source: Vec<&DimSpec> = dims.iter().collect();
    by_source.sort_by_key(|d| d.source_index);

    let row_bytes = (array_length * element_type.size_of() as u64) as usize;
    let mut records = RecordSet::new();

    for ii in 0..tuples_per_frag {
        let id = frag_key_start + ii;
        let coords = codec.decode(id);

        let mut start = Vec::with_capacity(dims.len());
        let mut count = Vec::with_capacity(dims.len());
        for d in &by_source {
            if d.role == DimRole::Implicit {
                start.push(d.start);
                count.push(d.count());
            } else {
                let pos = explicit_sorted.iter().position(|e| e.ordinal == d.ordinal).expect("explicit dim");
                start.push(d.start + coords[pos] - 1);
                count.push(1);
            }
        }
        let subspace = Subspace { start, count };

        let _reservation = ctx.reserve_memory(row_bytes as u64)?;
        let mut buf = vec![0u8; row_bytes];
        if let Some(fv) = fill_value {
            fv.fill(&mut buf);
        }
        source.read(dataset, &subspace, &mut buf)?;
        records.push(row_builder.build(id, &buf));
    }

    Ok(records)
}

/// Bulk-reads the whole fragment into a cache buffer in source order,
/// then walks `transpose` to produce the destination-order buffer,
/// emitting one row per `array_length`-element slice.
fn read_transposed<A: ArraySource>(
    ctx: &EngineContext,
    source: &A,
    dataset: &A::Dataset,
    plan: &Plan,
    transpose: &TransposeLayout,
    frag_key_start: u64,
    tuples_per_frag: u64,
    array_length: u64,
    row_builder: &RowBuilder,
) -> Result<RecordSet, EngineError> {
    let elem_size = plan.element_type.size_of();
    let total_elems = plan.read_subspace.element_count();
    let buf_bytes = total_elems as usize * elem_size;
    let _cache_reservation = ctx.reserve_memory(buf_bytes as u64)?;
    let mut cache = vec![0u8; buf_bytes];
    source.read(dataset, &plan.read_subspace, &mut cache)?;

    let _dst_reservation = ctx.reserve_memory(buf_bytes as u64)?;
    let mut dst = vec![0u8; buf_bytes];
    let cursor = TileCursor::new(
        transpose.extents.clone(),
        transpose.blocks.clone(),
        transpose.src_products.clone(),
        transpose.dst_products.clone(),
    );
    for (src_off, dst_off, run_len, src_stride, dst_stride) in cursor {
        for k in 0..run_len {
            let s = ((src_off + k * src_stride) as usize) * elem_size;
            let d = ((dst_off + k * dst_stride) as usize) * elem_size;
            dst[d..d + elem_size].copy_from_slice(&cache[s..s + elem_size]);
        }
    }

    let row_bytes = array_length as usize * elem_size;
    let mut records = RecordSet::new();
    for ii in 0..tuples_per_frag {
        let id = frag_key_start + ii;
        let start = ii as usize * row_bytes;
        records.push(row_builder.build(id, &dst[start..start + row_bytes]));
    }
    Ok(records)
}

/// R2, the default transpose regime (`spec.md` §4.6): bulk read followed
/// by a cache-blocked tiled copy, tile sizes as chosen by the planner.
pub fn read_r2<A: ArraySource>(
    ctx: &EngineContext,
    source: &A,
    dataset: &A::Dataset,
    plan: &Plan,
    transpose: &TransposeLayout,
    row_builder: &RowBuilder,
) -> Result<RecordSet, EngineError> {
    read_transposed(
        ctx,
        source,
        dataset,
        plan,
        transpose,
        plan.frag_key_start,
        plan.tuples_per_frag,
        plan.array_length,
        row_builder,
    )
}

/// R1, the non-blocked transpose regime: identical addressing to R2 but
/// with one tile spanning each whole dimension, matching
/// `_oph_ioserver_esdm_cache_to_buffer2`'s unblocked linear walk. Not
/// chosen by the planner by default; callers opt in explicitly (e.g. for
/// small fragments where tiling overhead isn't worth it, or to exercise
/// property P4 against R2).
pub fn read_r1<A: ArraySource>(
    ctx: &EngineContext,
    source: &A,
    dataset: &A::Dataset,
    plan: &Plan,
    transpose: &TransposeLayout,
    row_builder: &RowBuilder,
) -> Result<RecordSet, EngineError> {
    let unblocked = TransposeLayout {
        extents: transpose.extents.clone(),
        blocks: transpose.extents.clone(),
        src_products: transpose.src_products.clone(),
        dst_products: transpose.dst_products.clone(),
    };
    read_transposed(
        ctx,
        source,
        dataset,
        plan,
        &unblocked,
        plan.frag_key_start,
        plan.tuples_per_frag,
        plan.array_length,
        row_builder,
    )
}

/// Dispatches to the regime the planner chose. `R1` is never chosen
/// here since the planner only ever emits `R0`/`R2` (`spec.md` §9); call
/// [`read_r1`] directly to exercise it.
#[tracing::instrument(skip_all, fields(regime = ?plan.regime, frag_key_start = plan.frag_key_start))]
pub fn read_fragment<A: ArraySource>(
    ctx: &EngineContext,
    source: &A,
    dataset: &A::Dataset,
    dims: &[DimSpec],
    plan: &Plan,
    fill_value: Option<ioengine_array_source::FillValue>,
    row_builder: &RowBuilder,
) -> Result<RecordSet, EngineError> {
    match (plan.regime, &plan.transpose) {
        (ReadRegime::R0, _) => read_r0(
            ctx,
            source,
            dataset,
            dims,
            plan.element_type,
            plan.array_length,
            plan.frag_key_start,
            plan.tuples_per_frag,
            fill_value,
            row_builder,
        ),
        (ReadRegime::R2, Some(transpose)) => read_r2(ctx, source, dataset, plan, transpose, row_builder),
        (ReadRegime::R2, None) => Err(EngineError::Exec("R2 regime selected without a transpose layout".into())),
    }
}
