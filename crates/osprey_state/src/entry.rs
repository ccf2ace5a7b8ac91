//! Keys and values of the three partition indices.

use std::cmp::Ordering;
use std::sync::Arc;

use osprey_batch::Batch;
use osprey_common::types::{BlockId, RowId, SegmentId, Timestamp};

/// Key of the row-version index.
///
/// Ordered ascending by block, ascending by row, **descending by time**,
/// so a forward seek at `(block, row, ts)` lands on the newest version
/// with `time <= ts` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowKey {
    pub block_id: BlockId,
    pub row_id: RowId,
    pub time: Timestamp,
}

impl RowKey {
    /// Pivot sorting before every real key of `block`: the all-zero row
    /// id is below any row id whose high bits carry a block number, and
    /// the descending time leg makes `MAX` the earliest time value.
    pub fn block_start(block: BlockId) -> Self {
        Self {
            block_id: block,
            row_id: RowId(0),
            time: Timestamp::MAX,
        }
    }
}

impl Ord for RowKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.block_id
            .cmp(&other.block_id)
            .then_with(|| self.row_id.cmp(&other.row_id))
            .then_with(|| other.time.cmp(&self.time))
    }
}

impl PartialOrd for RowKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One observation of a row at a logical timestamp.
#[derive(Debug, Clone)]
pub struct RowVersion {
    /// Process-wide monotonic version identity, assigned on first
    /// observation of the `(block, row, time)` triple.
    pub id: u64,
    /// Tombstone flag. A later-time version overrules earlier ones.
    pub deleted: bool,
    /// The columnar batch this version was decoded from. Keeps the
    /// source columns reachable without copying.
    pub batch: Arc<Batch>,
    /// Row offset within `batch`.
    pub offset: u32,
    /// Encoded primary key, empty when the table has none.
    pub pk_bytes: Vec<u8>,
}

/// Metadata describing a forming or sealed block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMeta {
    pub create_time: Timestamp,
    /// Empty while the block is live.
    pub delete_time: Timestamp,
    pub sorted: bool,
    /// True once the block has been promoted: its row versions live in
    /// object storage behind `meta_location`, not inline.
    pub entry_state: bool,
    pub meta_location: String,
    pub delta_location: String,
    pub segment_id: SegmentId,
    pub commit_time: Timestamp,
}

impl BlockMeta {
    /// MVCC visibility of the block itself.
    pub fn visible(&self, ts: Timestamp) -> bool {
        self.create_time <= ts && (self.delete_time.is_empty() || ts < self.delete_time)
    }
}

/// Key of the primary-key index: encoded key bytes, then version
/// identity, so versions under one logical key enumerate in insertion
/// order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PkKey {
    pub bytes: Vec<u8>,
    pub row_version_id: u64,
}

/// Denormalized validation fields carried by each primary-key entry;
/// lets readers discard entries whose row version has moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PkEntry {
    pub block_id: BlockId,
    pub row_id: RowId,
}
