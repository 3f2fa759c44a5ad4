/// Advances a cache-blocked tiled copy over `N` dimensions, yielding one
/// `(src_offset, dst_offset, run_len, src_stride, dst_stride)` tuple per
/// inner-dimension tile sweep (element offsets/strides, not bytes; the
/// caller scales by element size and walks `k in 0..run_len` copying
/// `dst[dst_offset + k*dst_stride] = src[src_offset + k*src_stride]`).
///
/// Grounded on `_oph_ioserver_esdm_cache_to_buffer3` in
/// `oph_io_server_esdm.c`: outer dims advance in `blocks[i]`-sized tiles
/// truncated against `limits[i]` at the array edge; the innermost
/// dimension is swept element-by-element with its own source and
/// destination strides, matching the per-`k` memcpy loop there (the
/// source side is not assumed contiguous, since a transpose can leave
/// the innermost destination dimension strided in the source layout).
pub struct TileCursor {
    last: usize,
    limits: Vec<u64>,
    blocks: Vec<u64>,
    src_products: Vec<u64>,
    dst_products: Vec<u64>,
    counters: Vec<u64>,
    tmp_start: Vec<u64>,
    tmp_end: Vec<u64>,
    done: bool,
}

impl TileCursor {
    /// `limits[d]` is the extent of dimension `d` to cover; `blocks[d]`
    /// is the tile size chosen for it (`spec.md` §4.5); `src_products`/
    /// `dst_products` are the element strides for the source and
    /// destination layouts respectively.
    pub fn new(limits: Vec<u64>, blocks: Vec<u64>, src_products: Vec<u64>, dst_products: Vec<u64>) -> Self {
        let n = limits.len();
        assert!(n > 0, "at least one dimension required");
        assert_eq!(blocks.len(), n);
        assert_eq!(src_products.len(), n);
        assert_eq!(dst_products.len(), n);
        let tmp_end: Vec<u64> = (0..n).map(|i| blocks[i].min(limits[i])).collect();
        TileCursor {
            last: n - 1,
            limits,
            blocks,
            src_products,
            dst_products,
            counters: vec![0; n],
            tmp_start: vec![0; n],
            tmp_end,
            done: false,
        }
    }
}

impl Iterator for TileCursor {
    type Item = (u64, u64, u64, u64, u64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let last = self.last;

        let mut src_addr = 0u64;
        let mut dst_addr = 0u64;
        for i in 0..last {
            src_addr += self.counters[i] * self.src_products[i];
            dst_addr += self.counters[i] * self.dst_products[i];
        }

        let run_start = self.tmp_start[last];
        let run_end = self.tmp_end[last];
        let run_len = run_end - run_start;
        let item = (
            src_addr + run_start * self.src_products[last],
            dst_addr + run_start * self.dst_products[last],
            run_len,
            self.src_products[last],
            self.dst_products[last],
        );

        // Advance block counters starting from the most internal
        // dimension, excluding the innermost (already swept as a run).
        let mut i = last as isize - 1;
        loop {
            if i < 0 {
                if !self.advance_tiles() {
                    self.done = true;
                }
                break;
            }
            let ii = i as usize;
            self.counters[ii] += 1;
            if self.counters[ii] < self.tmp_end[ii] {
                break;
            }
            self.counters[ii] = self.tmp_start[ii];
            i -= 1;
        }

        Some(item)
    }
}

impl TileCursor {
    /// Shifts every dimension's tile window forward by one `blocks[j]`
    /// step, starting from the innermost dimension, wrapping outward.
    /// Returns `false` once the outermost dimension has wrapped past
    /// its limit, meaning every tile has been visited.
    fn advance_tiles(&mut self) -> bool {
        for j in (0..=self.last).rev() {
            self.tmp_start[j] += self.blocks[j];
            self.tmp_end[j] += self.blocks[j];
            if self.tmp_start[j] < self.limits[j] {
                self.counters[j] = self.tmp_start[j];
                if self.tmp_end[j] > self.limits[j] {
                    self.tmp_end[j] = self.limits[j];
                }
                return true;
            }
            self.counters[j] = 0;
            self.tmp_start[j] = 0;
            self.tmp_end[j] = self.blocks[j].min(self.limits[j]);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_every_element_exactly_once_for_a_small_grid() {
        let limits = vec![4, 5];
        let blocks = vec![2, 3];
        // row-major strides for a 4x5 array
        let src_products = vec![5, 1];
        let dst_products = vec![5, 1];
        let cursor = TileCursor::new(limits.clone(), blocks, src_products, dst_products);

        let mut seen = vec![false; (limits[0] * limits[1]) as usize];
        for (src, _dst, run_len, src_stride, _dst_stride) in cursor {
            for k in 0..run_len {
                let idx = (src + k * src_stride) as usize;
                assert!(!seen[idx], "element {idx} visited twice");
                seen[idx] = true;
            }
        }
        assert!(seen.iter().all(|&v| v), "not every element was covered");
    }

    #[test]
    fn single_dimension_covers_the_whole_range() {
        let cursor = TileCursor::new(vec![10], vec![3], vec![1], vec![1]);
        let total: u64 = cursor.map(|(_, _, len, _, _)| len).sum();
        assert_eq!(total, 10);
    }
}
