use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a physical storage block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct BlockId(pub u64);

/// Unique identifier for a segment (a group of blocks written together).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct SegmentId(pub u64);

/// Physical row identifier. The high 64 bits are the owning [`BlockId`],
/// the low 64 bits are the row's position within that block.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct RowId(pub u128);

impl RowId {
    pub fn new(block: BlockId, offset: u64) -> Self {
        RowId(((block.0 as u128) << 64) | offset as u128)
    }

    /// The block this row belongs to.
    pub fn block_id(self) -> BlockId {
        BlockId((self.0 >> 64) as u64)
    }

    /// Position of the row within its block.
    pub fn offset(self) -> u64 {
        self.0 as u64
    }
}

/// Logical timestamp for MVCC. `ZERO` is the distinguished "empty" value
/// used for unset create/delete/commit times in block metadata.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);
    pub const MIN: Timestamp = Timestamp(0);
    pub const MAX: Timestamp = Timestamp(u64::MAX);

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn next(self) -> Timestamp {
        Timestamp(self.0 + 1)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block:{}", self.0)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment:{}", self.0)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row:{}:{}", self.block_id().0, self.offset())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ts:{}", self.0)
    }
}
