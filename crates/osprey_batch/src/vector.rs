use serde::{Deserialize, Serialize};

use osprey_common::types::{RowId, Timestamp};

/// Word-packed null bitmap for one column. Bit `i` set means row `i` is
/// NULL. An all-zero (or empty) mask means no nulls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullMask {
    words: Vec<u64>,
}

impl NullMask {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn set(&mut self, row: usize) {
        let word = row / 64;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << (row % 64);
    }

    pub fn is_null(&self, row: usize) -> bool {
        self.words
            .get(row / 64)
            .is_some_and(|w| w & (1 << (row % 64)) != 0)
    }

    pub fn any(&self) -> bool {
        self.words.iter().any(|w| *w != 0)
    }
}

/// The physical representation of one column.
///
/// Scalar kinds cover every type the key codec accepts; `RowId` and `Ts`
/// are the system columns the log-tail protocol prepends to every data
/// batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VectorData {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Bool(Vec<bool>),
    /// Fixed- and variable-width strings share one representation.
    String(Vec<String>),
    /// Days since the Unix epoch.
    Date(Vec<i32>),
    /// Microseconds since midnight.
    Time(Vec<i64>),
    /// Microseconds since the Unix epoch, no time zone.
    DateTime(Vec<i64>),
    /// Microseconds since the Unix epoch, UTC.
    Timestamp(Vec<i64>),
    /// Fixed-point decimal: mantissa × 10^(-scale).
    Decimal64 { values: Vec<i64>, scale: u8 },
    Decimal128 { values: Vec<i128>, scale: u8 },
    /// System column: physical row identifiers.
    RowId(Vec<RowId>),
    /// System column: logical MVCC timestamps.
    Ts(Vec<Timestamp>),
}

impl VectorData {
    pub fn len(&self) -> usize {
        match self {
            VectorData::Int8(v) => v.len(),
            VectorData::Int16(v) => v.len(),
            VectorData::Int32(v) => v.len(),
            VectorData::Int64(v) => v.len(),
            VectorData::UInt8(v) => v.len(),
            VectorData::UInt16(v) => v.len(),
            VectorData::UInt32(v) => v.len(),
            VectorData::UInt64(v) => v.len(),
            VectorData::Float32(v) => v.len(),
            VectorData::Float64(v) => v.len(),
            VectorData::Bool(v) => v.len(),
            VectorData::String(v) => v.len(),
            VectorData::Date(v) => v.len(),
            VectorData::Time(v) => v.len(),
            VectorData::DateTime(v) => v.len(),
            VectorData::Timestamp(v) => v.len(),
            VectorData::Decimal64 { values, .. } => values.len(),
            VectorData::Decimal128 { values, .. } => values.len(),
            VectorData::RowId(v) => v.len(),
            VectorData::Ts(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stable kind name for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            VectorData::Int8(_) => "int8",
            VectorData::Int16(_) => "int16",
            VectorData::Int32(_) => "int32",
            VectorData::Int64(_) => "int64",
            VectorData::UInt8(_) => "uint8",
            VectorData::UInt16(_) => "uint16",
            VectorData::UInt32(_) => "uint32",
            VectorData::UInt64(_) => "uint64",
            VectorData::Float32(_) => "float32",
            VectorData::Float64(_) => "float64",
            VectorData::Bool(_) => "bool",
            VectorData::String(_) => "string",
            VectorData::Date(_) => "date",
            VectorData::Time(_) => "time",
            VectorData::DateTime(_) => "datetime",
            VectorData::Timestamp(_) => "timestamp",
            VectorData::Decimal64 { .. } => "decimal64",
            VectorData::Decimal128 { .. } => "decimal128",
            VectorData::RowId(_) => "rowid",
            VectorData::Ts(_) => "ts",
        }
    }
}

/// One decoded column: typed values plus a null bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    pub data: VectorData,
    pub nulls: NullMask,
}

impl Vector {
    pub fn new(data: VectorData) -> Self {
        Self {
            data,
            nulls: NullMask::empty(),
        }
    }

    pub fn with_nulls(data: VectorData, nulls: NullMask) -> Self {
        Self { data, nulls }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_null(&self, row: usize) -> bool {
        self.nulls.is_null(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_mask_set_and_query() {
        let mut mask = NullMask::empty();
        assert!(!mask.any());
        mask.set(0);
        mask.set(70);
        assert!(mask.is_null(0));
        assert!(!mask.is_null(1));
        assert!(mask.is_null(70));
        assert!(!mask.is_null(200));
        assert!(mask.any());
    }

    #[test]
    fn test_vector_len_matches_data() {
        let vec = Vector::new(VectorData::Int64(vec![1, 2, 3]));
        assert_eq!(vec.len(), 3);
        assert!(!vec.is_null(2));
    }

    #[test]
    fn test_kind_names_are_distinct_for_decimals() {
        let d64 = VectorData::Decimal64 {
            values: vec![],
            scale: 2,
        };
        let d128 = VectorData::Decimal128 {
            values: vec![],
            scale: 2,
        };
        assert_ne!(d64.kind_name(), d128.kind_name());
    }
}
