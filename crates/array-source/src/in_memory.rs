use std::collections::HashMap;

use parking_lot::RwLock;

use crate::{ArraySource, Dataspace, SourceError, Subspace};

struct StoredArray {
    dataspace: Dataspace,
    /// Row-major bytes in the array's own (source) dimension order.
    data: Vec<u8>,
}

/// A dense in-memory stand-in for the external array store, used by unit
/// and property tests. Mirrors the role `MemoryObjectDB` plays for
/// `ObjectDB` in the teacher codebase: a trivial, fully-synchronous
/// implementation of the trait with no I/O.
#[derive(Default)]
pub struct InMemoryArraySource {
    datasets: RwLock<HashMap<String, StoredArray>>,
}

impl InMemoryArraySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a dataset `container/var_name` with its dataspace and
    /// row-major source-order bytes. Panics if `data.len()` doesn't match
    /// the dataspace (a test-setup bug, not a runtime condition).
    pub fn insert(&self, container: &str, var_name: &str, dataspace: Dataspace, data: Vec<u8>) {
        let expected: u64 = dataspace.extents.iter().product::<u64>() * dataspace.element_type.size_of() as u64;
        assert_eq!(
            data.len() as u64,
            expected,
            "registered buffer does not match dataspace extents"
        );
        let key = format!("{container}/{var_name}");
        self.datasets.write().insert(key, StoredArray { dataspace, data });
    }
}

/// Opaque handles: the in-memory adapter has no real connection state, so
/// both container and dataset handles are just the name used to look the
/// array back up.
pub struct Handle(String);

impl ArraySource for InMemoryArraySource {
    type Container = Handle;
    type Dataset = Handle;

    fn open_container(&self, name: &str) -> Result<Self::Container, SourceError> {
        Ok(Handle(name.to_owned()))
    }

    fn close_container(&self, _container: Self::Container) -> Result<(), SourceError> {
        Ok(())
    }

    fn open_dataset(&self, container: &Self::Container, var_name: &str) -> Result<Self::Dataset, SourceError> {
        let key = format!("{}/{}", container.0, var_name);
        if self.datasets.read().contains_key(&key) {
            Ok(Handle(key))
        } else {
            Err(SourceError::OpenDataset {
                var: var_name.to_owned(),
                reason: "no such dataset registered".to_owned(),
            })
        }
    }

    fn close_dataset(&self, _dataset: Self::Dataset) -> Result<(), SourceError> {
        Ok(())
    }

    fn dataspace(&self, dataset: &Self::Dataset) -> Result<Dataspace, SourceError> {
        self.datasets
            .read()
            .get(&dataset.0)
            .map(|a| a.dataspace.clone())
            .ok_or_else(|| SourceError::Dataspace(format!("no such dataset `{}`", dataset.0)))
    }

    fn read(&self, dataset: &Self::Dataset, sub: &Subspace, dst: &mut [u8]) -> Result<(), SourceError> {
        let datasets = self.datasets.read();
        let array = datasets
            .get(&dataset.0)
            .ok_or_else(|| SourceError::Read {
                requested: dst.len(),
                reason: format!("no such dataset `{}`", dataset.0),
            })?;
        let elem_size = array.dataspace.element_type.size_of();
        let expected = sub.element_count() as usize * elem_size;
        if dst.len() != expected {
            return Err(SourceError::BufferSize {
                expected,
                got: dst.len(),
            });
        }

        let rank = array.dataspace.rank();
        let extents = &array.dataspace.extents;
        // Row-major strides (elements, not bytes) over the full dataset.
        let mut strides = vec![1u64; rank];
        for d in (0..rank.saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * extents[d + 1];
        }

        let mut coord = sub.start.clone();
        let mut out_offset = 0usize;
        loop {
            let mut src_elem = 0u64;
            for d in 0..rank {
                src_elem += coord[d] * strides[d];
            }
            let src_byte = src_elem as usize * elem_size;
            dst[out_offset..out_offset + elem_size].copy_from_slice(&array.data[src_byte..src_byte + elem_size]);
            out_offset += elem_size;

            // Odometer increment, innermost (last) dimension fastest.
            let mut d = rank;
            loop {
                if d == 0 {
                    return Ok(());
                }
                d -= 1;
                coord[d] += 1;
                if coord[d] < sub.start[d] + sub.count[d] {
                    break;
                }
                coord[d] = sub.start[d];
                if d == 0 {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ioengine_primitives::ElementType;

    fn source_2x3_f32() -> InMemoryArraySource {
        let src = InMemoryArraySource::new();
        let data: Vec<f32> = (0..6).map(|i| i as f32).collect();
        let bytes = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        src.insert(
            "c",
            "v",
            Dataspace {
                extents: vec![2, 3],
                element_type: ElementType::F32,
                fill_value: None,
            },
            bytes,
        );
        src
    }

    #[test]
    fn reads_full_array() {
        let src = source_2x3_f32();
        let c = src.open_container("c").unwrap();
        let d = src.open_dataset(&c, "v").unwrap();
        let mut dst = vec![0u8; 6 * 4];
        src.read(
            &d,
            &Subspace {
                start: vec![0, 0],
                count: vec![2, 3],
            },
            &mut dst,
        )
        .unwrap();
        let values: Vec<f32> = dst
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn reads_sub_rectangle() {
        let src = source_2x3_f32();
        let c = src.open_container("c").unwrap();
        let d = src.open_dataset(&c, "v").unwrap();
        let mut dst = vec![0u8; 2 * 4];
        // row 1, columns 1..3
        src.read(
            &d,
            &Subspace {
                start: vec![1, 1],
                count: vec![1, 2],
            },
            &mut dst,
        )
        .unwrap();
        let values: Vec<f32> = dst
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(values, vec![4.0, 5.0]);
    }

    #[test]
    fn rejects_wrong_buffer_size() {
        let src = source_2x3_f32();
        let c = src.open_container("c").unwrap();
        let d = src.open_dataset(&c, "v").unwrap();
        let mut dst = vec![0u8; 3];
        let err = src
            .read(
                &d,
                &Subspace {
                    start: vec![0, 0],
                    count: vec![2, 3],
                },
                &mut dst,
            )
            .unwrap_err();
        assert!(matches!(err, SourceError::BufferSize { .. }));
    }

    /// Generates `(rows, cols, start, count)` for a sub-rectangle that
    /// stays within a `rows x cols` array, rows/cols each bounded small
    /// enough that shrinking stays fast.
    fn subrect_strategy() -> impl proptest::strategy::Strategy<Value = (u64, u64, u64, u64, u64, u64)> {
        use proptest::prelude::*;
        (1u64..6, 1u64..6).prop_flat_map(|(rows, cols)| {
            (0..rows, 0..cols).prop_flat_map(move |(r0, c0)| {
                (1..=(rows - r0), 1..=(cols - c0)).prop_map(move |(rc, cc)| (rows, cols, r0, c0, rc, cc))
            })
        })
    }

    proptest::proptest! {
        /// `read` over an arbitrary sub-rectangle matches an
        /// independently computed row-major reference slice, for any
        /// array size and any in-bounds start/count.
        #[test]
        fn reads_arbitrary_sub_rectangle((rows, cols, r0, c0, rc, cc) in subrect_strategy()) {
            let src = InMemoryArraySource::new();
            let values: Vec<f32> = (0..rows * cols).map(|i| i as f32).collect();
            let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            src.insert(
                "c",
                "v",
                Dataspace { extents: vec![rows, cols], element_type: ioengine_primitives::ElementType::F32, fill_value: None },
                bytes,
            );
            let c = src.open_container("c").unwrap();
            let d = src.open_dataset(&c, "v").unwrap();

            let mut dst = vec![0u8; (rc * cc) as usize * 4];
            src.read(&d, &Subspace { start: vec![r0, c0], count: vec![rc, cc] }, &mut dst).unwrap();
            let got: Vec<f32> = dst.chunks_exact(4).map(|b| f32::from_le_bytes(b.try_into().unwrap())).collect();

            let mut expected = Vec::with_capacity((rc * cc) as usize);
            for r in r0..r0 + rc {
                for c in c0..c0 + cc {
                    expected.push(values[(r * cols + c) as usize]);
                }
            }
            proptest::prop_assert_eq!(got, expected);
        }
    }
}
