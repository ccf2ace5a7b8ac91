//! The partition state aggregate and its snapshot facade.

use parking_lot::RwLock;

use osprey_common::error::OspreyResult;
use osprey_common::types::{BlockId, RowId, Timestamp};

use crate::applier::LogTailEntry;
use crate::blocks::BlockRegistry;
use crate::codec::KeyPacker;
use crate::entry::{BlockMeta, RowKey};
use crate::pk_index::PrimaryKeyIndex;
use crate::rows::RowStore;

/// The materialized logical contents of one table partition: three
/// copy-on-write ordered indices plus the checkpoint locations a fresh
/// replica would bootstrap from before replaying the log tail.
///
/// `clone()` is the snapshot operation: O(1), and the clone is a value —
/// later writes to the source are invisible to it, readers may hold it
/// for as long as they like, and the shared index nodes are reclaimed
/// when the last holder drops them.
#[derive(Clone, Default)]
pub struct PartitionState {
    pub(crate) rows: RowStore,
    pub(crate) blocks: BlockRegistry,
    pub(crate) primary_index: PrimaryKeyIndex,
    pub(crate) checkpoints: Vec<String>,
}

impl PartitionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// O(1) consistent snapshot of all three indices plus the
    /// checkpoint list.
    pub fn snapshot(&self) -> PartitionState {
        self.clone()
    }

    /// Point query: does the row exist as of `ts`?
    pub fn row_exists(&self, row_id: RowId, ts: Timestamp) -> bool {
        self.rows.row_exists(row_id, ts)
    }

    /// Block-level MVCC visibility at `ts`.
    pub fn block_visible(&self, block: BlockId, ts: Timestamp) -> bool {
        self.blocks.visible(block, ts)
    }

    pub fn block_meta(&self, block: BlockId) -> Option<&BlockMeta> {
        self.blocks.get(block)
    }

    /// Blocks visible at `ts`, in block-id order. The planner walks
    /// this to price scans over sealed blocks.
    pub fn visible_blocks(
        &self,
        ts: Timestamp,
    ) -> impl Iterator<Item = (BlockId, &BlockMeta)> + '_ {
        self.blocks
            .iter()
            .filter(move |(_, meta)| meta.visible(ts))
            .map(|(block, meta)| (*block, meta))
    }

    /// Rows whose primary key equals `pk_bytes` and which are visible at
    /// `ts`. Index entries whose row version has been superseded or
    /// compacted away are skipped via their validation fields.
    pub fn pk_lookup(&self, pk_bytes: &[u8], ts: Timestamp) -> Vec<RowId> {
        let mut found = Vec::new();
        for (key, entry) in self.primary_index.range(pk_bytes) {
            if found.contains(&entry.row_id) {
                continue;
            }
            let version_alive = self
                .rows
                .seek(&RowKey {
                    block_id: entry.block_id,
                    row_id: entry.row_id,
                    time: Timestamp::MAX,
                })
                .take_while(|(k, _)| {
                    k.block_id == entry.block_id && k.row_id == entry.row_id
                })
                .any(|(_, version)| version.id == key.row_version_id);
            if !version_alive {
                // Stale entry; ignore.
                continue;
            }
            if self.rows.row_exists(entry.row_id, ts) {
                found.push(entry.row_id);
            }
        }
        found
    }

    /// Opaque external snapshot reference for replay bootstrap.
    pub fn record_checkpoint(&mut self, location: impl Into<String>) {
        self.checkpoints.push(location.into());
    }

    pub fn checkpoints(&self) -> &[String] {
        &self.checkpoints
    }

    pub fn rows(&self) -> &RowStore {
        &self.rows
    }

    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    pub fn primary_index(&self) -> &PrimaryKeyIndex {
        &self.primary_index
    }
}

/// Writer-facing owner of the live partition state.
///
/// One log-tail applier mutates it; any number of readers take
/// snapshots. The write lock is held exactly for the duration of one
/// entry, which is what makes each entry's effect atomic with respect
/// to `snapshot()`.
#[derive(Default)]
pub struct Partition {
    state: RwLock<PartitionState>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// O(1): clones the three index roots under the read lock.
    pub fn snapshot(&self) -> PartitionState {
        self.state.read().clone()
    }

    /// Apply one log-tail entry. Either the whole entry takes effect or
    /// — on a recoverable input error — none of it does.
    pub fn apply(
        &self,
        entry: &LogTailEntry,
        pk_column: Option<usize>,
        packer: &mut KeyPacker,
    ) -> OspreyResult<()> {
        self.state
            .write()
            .handle_logtail_entry(entry, pk_column, packer)
    }

    pub fn record_checkpoint(&self, location: impl Into<String>) {
        self.state.write().record_checkpoint(location);
    }

    /// Convenience point query against the live state.
    pub fn row_exists(&self, row_id: RowId, ts: Timestamp) -> bool {
        self.state.read().row_exists(row_id, ts)
    }

    pub fn block_visible(&self, block: BlockId, ts: Timestamp) -> bool {
        self.state.read().block_visible(block, ts)
    }
}
