// src/extract/record.rs

use std::fmt;

/// One normalized finding pulled out of a scanner report.
///
/// Offsets are kept as lowercase hex digits exactly as reported (no `0x`
/// prefix, no re-padding), so records survive offsets wider than 64 bits.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FindingRecord {
    /// AES: key size in bits plus offset.
    SizedKey { key_size: u16, offset: String },
    /// RSA / Serpent / Twofish: offset only.
    Key { offset: String },
}

impl FindingRecord {
    pub fn offset(&self) -> &str {
        match self {
            FindingRecord::SizedKey { offset, .. } | FindingRecord::Key { offset } => offset,
        }
    }

    pub fn key_size(&self) -> Option<u16> {
        match self {
            FindingRecord::SizedKey { key_size, .. } => Some(*key_size),
            FindingRecord::Key { .. } => None,
        }
    }

    /// Offset as a number, if it fits in a `u64`.
    pub fn offset_value(&self) -> Option<u64> {
        u64::from_str_radix(self.offset(), 16).ok()
    }
}

impl fmt::Display for FindingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingRecord::SizedKey { key_size, offset } => write!(f, "{key_size},{offset}"),
            FindingRecord::Key { offset } => f.write_str(offset),
        }
    }
}
