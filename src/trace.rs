//! Reading branch traces from disk.

use std::path::Path;
use thiserror::Error;
use crate::branch::*;

/// Errors produced while reading a [`BinaryTrace`].
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("trace length ({len} bytes) isn't a multiple of the 24-byte record size")]
    Truncated { len: usize },

    #[error("record {index}: {source}")]
    InvalidRecord { index: usize, source: InvalidBranchFlags },
}

/// Size of a single record in a [`BinaryTrace`].
///
/// Each record is a little-endian program counter (8 bytes), target address
/// (8 bytes), [`BranchFlags`] (4 bytes), and 4 bytes of padding.
pub const RECORD_SIZE: usize = 24;

/// Encode a record in the on-disk format.
pub fn encode_record(record: &BranchRecord) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    let flags = BranchFlags::new(record.kind, record.outcome);
    buf[0..8].copy_from_slice(&record.pc.to_le_bytes());
    buf[8..16].copy_from_slice(&record.tgt.to_le_bytes());
    buf[16..20].copy_from_slice(&flags.0.to_le_bytes());
    buf
}

fn decode_record(index: usize, buf: &[u8]) -> Result<BranchRecord, TraceError> {
    let word = |range: std::ops::Range<usize>| {
        let mut bytes = [0u8; 8];
        bytes[..range.len()].copy_from_slice(&buf[range]);
        u64::from_le_bytes(bytes)
    };
    let flags = BranchFlags(word(16..20) as u32);
    BranchRecord::new(word(0..8), word(8..16), flags)
        .map_err(|source| TraceError::InvalidRecord { index, source })
}

/// A trace of branch records.
pub struct BinaryTrace {
    pub name: String,
    records: Vec<BranchRecord>,
}
impl BinaryTrace {
    /// Create a [`BinaryTrace`] from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let name = path.file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_bytes(name, &data)
    }

    /// Create a [`BinaryTrace`] from raw bytes.
    pub fn from_bytes(name: impl ToString, data: &[u8]) -> Result<Self, TraceError> {
        if data.len() % RECORD_SIZE != 0 {
            return Err(TraceError::Truncated { len: data.len() });
        }
        let records = data.chunks_exact(RECORD_SIZE).enumerate()
            .map(|(index, buf)| decode_record(index, buf))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { name: name.to_string(), records })
    }

    /// Return the number of records
    pub fn num_entries(&self) -> usize { self.records.len() }

    pub fn name(&self) -> &str { &self.name }

    /// Return a slice of records.
    pub fn as_slice(&self) -> &[BranchRecord] { &self.records }

    /// Return a truncated slice of records
    pub fn as_slice_trunc(&self, limit: usize) -> &[BranchRecord] {
        &self.records[..limit.min(self.records.len())]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(pc: u64, kind: BranchKind, outcome: Outcome) -> BranchRecord {
        BranchRecord { pc, tgt: pc + 0x40, kind, outcome }
    }

    #[test]
    fn decodes_encoded_records() {
        let recs = [
            record(0x1000, BranchKind::DirectBranch, Outcome::T),
            record(0x1004, BranchKind::Return, Outcome::T),
            record(0xdead_beef_0000, BranchKind::DirectBranch, Outcome::N),
        ];
        let bytes: Vec<u8> = recs.iter().flat_map(encode_record).collect();
        let trace = BinaryTrace::from_bytes("t", &bytes).unwrap();
        assert_eq!(trace.as_slice(), &recs);
        assert_eq!(trace.as_slice_trunc(2).len(), 2);
        assert_eq!(trace.as_slice_trunc(100).len(), 3);
    }

    #[test]
    fn rejects_partial_records() {
        let bytes = vec![0u8; RECORD_SIZE + 3];
        assert!(matches!(BinaryTrace::from_bytes("t", &bytes),
            Err(TraceError::Truncated { len: 27 })));
    }

    #[test]
    fn rejects_unknown_flags() {
        let mut bytes = encode_record(&record(0, BranchKind::DirectBranch, Outcome::N)).to_vec();
        bytes[16] = 0b0000_0011;
        assert!(matches!(BinaryTrace::from_bytes("t", &bytes),
            Err(TraceError::InvalidRecord { index: 0, .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let res = BinaryTrace::from_file("/nonexistent/geotage.trace");
        assert!(matches!(res, Err(TraceError::Io(_))));
    }
}
