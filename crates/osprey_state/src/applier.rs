//! Log-tail entry dispatch and the applier loop.
//!
//! Entries arrive in commit order within a partition and are applied
//! sequentially. An entry either applies completely or has no effect:
//! every fallible extraction (wire decode, column typing, key encoding)
//! happens before the first index mutation. Invariant violations in the
//! feed itself — a metadata delete for a block that was never inserted —
//! are bugs and panic, taking the applier task down.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use osprey_batch::{Batch, WireBatch};
use osprey_common::config::PartitionEngineConfig;
use osprey_common::error::OspreyResult;
use osprey_common::shutdown::ShutdownSignal;
use osprey_common::types::{BlockId, SegmentId};
use serde::{Deserialize, Serialize};

use crate::blocks::BlockMetaPatch;
use crate::catalog::{is_metadata_table, PkCatalog};
use crate::codec::{encode_key_vector, KeyPacker};
use crate::state::{Partition, PartitionState};

/// Wire-level entry kind. Combined with [`is_metadata_table`] this
/// selects one of the four dispatch branches; the enum is closed, so an
/// unrecognized discriminant dies in wire decoding, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    Insert,
    Delete,
}

/// One change-data entry from the transaction log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogTailEntry {
    pub kind: EntryKind,
    pub table_name: String,
    pub batch: WireBatch,
}

// Data batches: [row_id, time, user_col_0, user_col_1, ...]
const DATA_ROW_ID_COL: usize = 0;
const DATA_TS_COL: usize = 1;
const DATA_USER_COLS_START: usize = 2;

// Metadata batches:
// [_, create_time, block_id, entry_state, sorted, meta_loc, delta_loc,
//  commit_time, segment_id]
const META_CREATE_TS_COL: usize = 1;
const META_BLOCK_ID_COL: usize = 2;
const META_ENTRY_STATE_COL: usize = 3;
const META_SORTED_COL: usize = 4;
const META_LOC_COL: usize = 5;
const META_DELTA_LOC_COL: usize = 6;
const META_COMMIT_TS_COL: usize = 7;
const META_SEGMENT_ID_COL: usize = 8;

// Metadata deletes: [row_id, delete_time]
const META_DELETE_ROW_ID_COL: usize = 0;
const META_DELETE_TS_COL: usize = 1;

const ENTRIES_COUNTER: &str = "osprey_logtail_entries_total";

impl PartitionState {
    /// Dispatch one log-tail entry. `pk_column` is the table's
    /// primary-key user-column index, from the catalog.
    pub fn handle_logtail_entry(
        &mut self,
        entry: &LogTailEntry,
        pk_column: Option<usize>,
        packer: &mut KeyPacker,
    ) -> OspreyResult<()> {
        let _span = tracing::debug_span!(
            "logtail_entry",
            table = %entry.table_name,
            kind = ?entry.kind,
        )
        .entered();
        match (entry.kind, is_metadata_table(&entry.table_name)) {
            (EntryKind::Insert, true) => self.handle_metadata_insert(&entry.batch),
            (EntryKind::Insert, false) => {
                self.handle_rows_insert(&entry.batch, pk_column, packer)
            }
            (EntryKind::Delete, true) => self.handle_metadata_delete(&entry.batch),
            (EntryKind::Delete, false) => self.handle_rows_delete(&entry.batch),
        }
    }

    fn handle_rows_insert(
        &mut self,
        input: &WireBatch,
        pk_column: Option<usize>,
        packer: &mut KeyPacker,
    ) -> OspreyResult<()> {
        let batch = Arc::new(Batch::from_wire(input)?);
        let row_ids = batch.row_ids(DATA_ROW_ID_COL)?;
        let times = batch.ts(DATA_TS_COL)?;
        let pk_keys = match pk_column {
            Some(column) => {
                let vector = batch.vector(DATA_USER_COLS_START + column)?;
                encode_key_vector(vector, packer)?
            }
            None => Vec::new(),
        };

        for (i, &row_id) in row_ids.iter().enumerate() {
            let block_id = row_id.block_id();
            let pk_bytes = pk_keys.get(i).cloned().unwrap_or_default();
            let version_id = self.rows.insert_version(
                block_id,
                row_id,
                times[i],
                &batch,
                i as u32,
                pk_bytes.clone(),
            );
            if !pk_bytes.is_empty() {
                self.primary_index
                    .insert(pk_bytes, version_id, block_id, row_id);
            }
        }

        metrics::counter!(ENTRIES_COUNTER, "kind" => "rows_insert").increment(1);
        Ok(())
    }

    fn handle_rows_delete(&mut self, input: &WireBatch) -> OspreyResult<()> {
        let batch = Arc::new(Batch::from_wire(input)?);
        let row_ids = batch.row_ids(DATA_ROW_ID_COL)?;
        let times = batch.ts(DATA_TS_COL)?;

        for (i, &row_id) in row_ids.iter().enumerate() {
            self.rows
                .insert_tombstone(row_id.block_id(), row_id, times[i], &batch, i as u32);
        }

        metrics::counter!(ENTRIES_COUNTER, "kind" => "rows_delete").increment(1);
        Ok(())
    }

    fn handle_metadata_insert(&mut self, input: &WireBatch) -> OspreyResult<()> {
        let batch = Batch::from_wire(input)?;
        let create_times = batch.ts(META_CREATE_TS_COL)?;
        let block_ids = batch.u64s(META_BLOCK_ID_COL)?;
        let entry_states = batch.bools(META_ENTRY_STATE_COL)?;
        let sorted_states = batch.bools(META_SORTED_COL)?;
        let meta_locations = batch.strs(META_LOC_COL)?;
        let delta_locations = batch.strs(META_DELTA_LOC_COL)?;
        let commit_times = batch.ts(META_COMMIT_TS_COL)?;
        let segment_ids = batch.u64s(META_SEGMENT_ID_COL)?;

        for (i, &raw_block_id) in block_ids.iter().enumerate() {
            let block = BlockId(raw_block_id);
            self.blocks.upsert_meta(
                block,
                &BlockMetaPatch {
                    create_time: create_times[i],
                    commit_time: commit_times[i],
                    meta_location: meta_locations[i].clone(),
                    delta_location: delta_locations[i].clone(),
                    segment_id: SegmentId(segment_ids[i]),
                    sorted: sorted_states[i],
                    entry_state: entry_states[i],
                },
            );

            if entry_states[i] {
                // The block is sealed and promoted: release its inline
                // row versions and the primary-key entries pointing at
                // them. From here on the block is queryable only through
                // its meta_location reference.
                let removed = self.rows.delete_block(block);
                tracing::debug!(%block, versions = removed.len(), "block promoted");
                for version in removed {
                    if !version.pk_bytes.is_empty() {
                        self.primary_index.remove(&version.pk_bytes, version.id);
                    }
                }
            }
        }

        metrics::counter!(ENTRIES_COUNTER, "kind" => "meta_insert").increment(1);
        Ok(())
    }

    fn handle_metadata_delete(&mut self, input: &WireBatch) -> OspreyResult<()> {
        let batch = Batch::from_wire(input)?;
        let row_ids = batch.row_ids(META_DELETE_ROW_ID_COL)?;
        let delete_times = batch.ts(META_DELETE_TS_COL)?;

        for (i, &row_id) in row_ids.iter().enumerate() {
            self.blocks.mark_deleted(row_id.block_id(), delete_times[i]);
        }

        metrics::counter!(ENTRIES_COUNTER, "kind" => "meta_delete").increment(1);
        Ok(())
    }
}

/// The per-partition applier task: drains a log-tail channel into a
/// [`Partition`], one entry at a time, observing its stop signal only
/// between entries.
pub struct Applier<C> {
    partition: Arc<Partition>,
    catalog: C,
    shutdown: ShutdownSignal,
    poll_interval: Duration,
    packer: KeyPacker,
}

impl<C: PkCatalog> Applier<C> {
    pub fn new(
        partition: Arc<Partition>,
        catalog: C,
        config: &PartitionEngineConfig,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            partition,
            catalog,
            shutdown,
            poll_interval: Duration::from_millis(config.applier_poll_interval_ms),
            packer: KeyPacker::new(),
        }
    }

    /// Run until the channel closes, the stop signal fires, or an entry
    /// is rejected. Rejection is strict: the failed entry had no effect,
    /// and resumption is the transport's job.
    pub fn run(&mut self, entries: &Receiver<LogTailEntry>) -> OspreyResult<()> {
        loop {
            if self.shutdown.is_stopped() {
                tracing::info!("applier stopped");
                return Ok(());
            }
            match entries.recv_timeout(self.poll_interval) {
                Ok(entry) => {
                    let pk_column = self.catalog.primary_key_column(&entry.table_name);
                    if let Err(err) = self.partition.apply(&entry, pk_column, &mut self.packer) {
                        tracing::error!(table = %entry.table_name, %err, "log-tail entry rejected");
                        return Err(err);
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::info!("log-tail channel closed");
                    return Ok(());
                }
            }
        }
    }
}
