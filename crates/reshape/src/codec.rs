/// The Dimension-ID Codec (`spec.md` §4.2), grounded on
/// `_oph_ioserver_esdm_get_dimension_id`/
/// `oph_ioserver_esdm_compute_dimension_id` in `oph_io_server_esdm.c`.
///
/// `extents` is the per-explicit-dimension extent `S[0..nexp)`, ordered by
/// the explicit dimension's logical level (not its source ordinal).
/// Caches the running product so repeated `encode`/`decode` calls over
/// the same fragment don't recompute it.
#[derive(Clone, Debug)]
pub struct DimensionCodec {
    extents: Vec<u64>,
}

impl DimensionCodec {
    pub fn new(extents: Vec<u64>) -> Self {
        Self { extents }
    }

    pub fn extents(&self) -> &[u64] {
        &self.extents
    }

    fn total(&self) -> u64 {
        self.extents.iter().product()
    }

    /// Converts explicit coordinates `c[0..nexp)` (each `1 ≤ c[k] ≤
    /// S[k]`) into the 1-based linear index over the explicit
    /// cross-product.
    pub fn encode(&self, coords: &[u64]) -> u64 {
        debug_assert_eq!(coords.len(), self.extents.len());
        let mut id: u64 = 0;
        let mut tot = self.total();
        for k in 0..self.extents.len() {
            tot /= self.extents[k];
            id += (coords[k] - 1) * tot;
        }
        id + 1
    }

    /// Converts a 1-based linear index `id` (`1 ≤ id ≤ ∏S`) into the
    /// explicit coordinate tuple `c[0..nexp)`. Its own inverse with
    /// [`DimensionCodec::encode`] (property P1).
    pub fn decode(&self, id: u64) -> Vec<u64> {
        let nexp = self.extents.len();
        let mut coords = vec![0u64; nexp];
        let mut rem = id - 1;
        let mut tot = self.total();
        for k in 0..nexp.saturating_sub(1) {
            let tmp = tot / self.extents[k];
            coords[k] = rem / tmp + 1;
            rem %= tmp;
            tot = tmp;
        }
        if nexp > 0 {
            coords[nexp - 1] = rem + 1;
        }
        coords
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn worked_example() {
        let codec = DimensionCodec::new(vec![2, 3]);
        assert_eq!(codec.decode(1), vec![1, 1]);
        assert_eq!(codec.decode(6), vec![2, 3]);
        assert_eq!(codec.encode(&[2, 3]), 6);
    }

    #[test]
    fn visits_every_tuple_exactly_once_in_lexicographic_order() {
        let codec = DimensionCodec::new(vec![2, 3, 4]);
        let total = codec.extents().iter().product::<u64>();
        let mut seen = std::collections::HashSet::new();
        let mut prev: Option<Vec<u64>> = None;
        for id in 1..=total {
            let tuple = codec.decode(id);
            assert!(seen.insert(tuple.clone()), "duplicate tuple {tuple:?}");
            if let Some(p) = &prev {
                assert!(p < &tuple, "not lexicographically increasing: {p:?} >= {tuple:?}");
            }
            prev = Some(tuple);
        }
        assert_eq!(seen.len(), total as usize);
    }

    proptest! {
        #[test]
        fn encode_decode_round_trip(
            extents in proptest::collection::vec(1u64..6, 1..5),
        ) {
            let codec = DimensionCodec::new(extents.clone());
            let total: u64 = extents.iter().product();
            for id in 1..=total {
                let coords = codec.decode(id);
                prop_assert_eq!(codec.encode(&coords), id);
            }
        }
    }
}
