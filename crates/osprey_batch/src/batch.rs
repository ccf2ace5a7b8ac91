use serde::{Deserialize, Serialize};

use osprey_common::error::BatchError;
use osprey_common::types::{RowId, Timestamp};

use crate::vector::{NullMask, Vector, VectorData};

/// Wire form of one column: values plus the rows that are NULL.
///
/// This is the transport-agnostic shape the log-tail RPC layer hands us;
/// serde keeps it independent of any particular codec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireColumn {
    pub data: VectorData,
    #[serde(default)]
    pub null_rows: Vec<u32>,
}

impl WireColumn {
    pub fn new(data: VectorData) -> Self {
        Self {
            data,
            null_rows: Vec::new(),
        }
    }
}

/// Wire form of a whole payload batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireBatch {
    pub columns: Vec<WireColumn>,
}

impl WireBatch {
    pub fn new(columns: Vec<WireColumn>) -> Self {
        Self { columns }
    }
}

/// A decoded, validated columnar batch. All columns have the same row
/// count. Row versions hold `Arc<Batch>` payload references, so the
/// decoded columns stay reachable until the last referencing version is
/// compacted away.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    vecs: Vec<Vector>,
    row_count: usize,
}

impl Batch {
    /// Decode a wire batch, validating column lengths and null bitmaps.
    /// Failure here is a recoverable input error: nothing downstream has
    /// been touched yet.
    pub fn from_wire(wire: &WireBatch) -> Result<Batch, BatchError> {
        let row_count = wire.columns.first().map_or(0, |c| c.data.len());
        let mut vecs = Vec::with_capacity(wire.columns.len());
        for (index, column) in wire.columns.iter().enumerate() {
            let len = column.data.len();
            if len != row_count {
                return Err(BatchError::LengthMismatch {
                    index,
                    len,
                    row_count,
                });
            }
            let mut nulls = NullMask::empty();
            for &row in &column.null_rows {
                if row as usize >= len {
                    return Err(BatchError::NullOutOfRange { index, row, len });
                }
                nulls.set(row as usize);
            }
            vecs.push(Vector::with_nulls(column.data.clone(), nulls));
        }
        Ok(Batch { vecs, row_count })
    }

    /// Build a batch directly from decoded vectors (host-side tests and
    /// replay tooling). Columns must already agree on row count.
    pub fn from_vectors(vecs: Vec<Vector>) -> Result<Batch, BatchError> {
        let row_count = vecs.first().map_or(0, Vector::len);
        for (index, vec) in vecs.iter().enumerate() {
            if vec.len() != row_count {
                return Err(BatchError::LengthMismatch {
                    index,
                    len: vec.len(),
                    row_count,
                });
            }
        }
        Ok(Batch { vecs, row_count })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.vecs.len()
    }

    pub fn vector(&self, index: usize) -> Result<&Vector, BatchError> {
        self.vecs.get(index).ok_or(BatchError::MissingColumn {
            index,
            count: self.vecs.len(),
        })
    }

    /// Fetch the row-id system column at `index`.
    pub fn row_ids(&self, index: usize) -> Result<&[RowId], BatchError> {
        match &self.vector(index)?.data {
            VectorData::RowId(v) => Ok(v),
            other => Err(self.type_error(index, "rowid", other)),
        }
    }

    /// Fetch the logical-timestamp system column at `index`.
    pub fn ts(&self, index: usize) -> Result<&[Timestamp], BatchError> {
        match &self.vector(index)?.data {
            VectorData::Ts(v) => Ok(v),
            other => Err(self.type_error(index, "ts", other)),
        }
    }

    pub fn u64s(&self, index: usize) -> Result<&[u64], BatchError> {
        match &self.vector(index)?.data {
            VectorData::UInt64(v) => Ok(v),
            other => Err(self.type_error(index, "uint64", other)),
        }
    }

    pub fn bools(&self, index: usize) -> Result<&[bool], BatchError> {
        match &self.vector(index)?.data {
            VectorData::Bool(v) => Ok(v),
            other => Err(self.type_error(index, "bool", other)),
        }
    }

    pub fn strs(&self, index: usize) -> Result<&[String], BatchError> {
        match &self.vector(index)?.data {
            VectorData::String(v) => Ok(v),
            other => Err(self.type_error(index, "string", other)),
        }
    }

    fn type_error(&self, index: usize, expected: &'static str, actual: &VectorData) -> BatchError {
        BatchError::ColumnType {
            index,
            expected,
            actual: actual.kind_name(),
        }
    }
}
