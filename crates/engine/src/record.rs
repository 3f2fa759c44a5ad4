/// One output row: `(id_dim, payload)` (`spec.md` §3 "Record"). The
/// fixed two-field schema of every record set this engine produces.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub id_dim: u64,
    pub payload: Vec<u8>,
}

/// An ordered sequence of [`Record`]s plus a running byte counter over
/// every payload written so far, matching the "only externally
/// observable output" framing of `spec.md` §3/§9.
#[derive(Default, Debug)]
pub struct RecordSet {
    records: Vec<Record>,
    frag_size: u64,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record) {
        self.frag_size += record.payload.len() as u64;
        self.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn frag_size(&self) -> u64 {
        self.frag_size
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Release hook for a user-defined payload codec, invoked by
/// [`RowBuilder`] when `compressed` is set. No concrete codec ships;
/// `Passthrough` is the no-op implementation used by tests.
pub trait CompressionPlugin: Send + Sync {
    fn compress(&self, raw: &[u8]) -> Vec<u8>;
}

pub struct Passthrough;
impl CompressionPlugin for Passthrough {
    fn compress(&self, raw: &[u8]) -> Vec<u8> {
        raw.to_vec()
    }
}

/// Builds one [`Record`] from a raw payload slice, either inlining it
/// (`UNCOMPRESSED_VALUE`) or routing it through a [`CompressionPlugin`]
/// (`COMPRESSED_VALUE`), matching the placeholder scheme in
/// `oph_io_server_esdm.c` (`DIM_VALUE`/`UNCOMPRESSED_VALUE`/
/// `COMPRESSED_VALUE`). The general `field_names[]`/placeholder template
/// and typed argument-cell binding protocol are not reproduced here: this
/// engine's output schema is permanently the two fields in [`Record`], so
/// `RowBuilder::build` takes `(id_dim, raw_payload)` directly rather than
/// walking a per-query field template (see `DESIGN.md`).
pub struct RowBuilder<'a> {
    pub compressed: bool,
    pub compressor: &'a dyn CompressionPlugin,
}

impl<'a> RowBuilder<'a> {
    pub fn new(compressed: bool, compressor: &'a dyn CompressionPlugin) -> Self {
        RowBuilder { compressed, compressor }
    }

    pub fn build(&self, id_dim: u64, raw_payload: &[u8]) -> Record {
        let payload = if self.compressed {
            self.compressor.compress(raw_payload)
        } else {
            raw_payload.to_vec()
        };
        Record { id_dim, payload }
    }
}
