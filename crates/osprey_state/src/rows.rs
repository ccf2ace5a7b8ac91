//! Row-ID-addressed MVCC store of row versions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use osprey_batch::Batch;
use osprey_common::types::{BlockId, RowId, Timestamp};

use crate::btree::{Iter, OrdMap};
use crate::entry::{RowKey, RowVersion};

/// Process-wide version identity counter. Versions are not persisted, so
/// this does not need to survive restarts.
static NEXT_ROW_VERSION_ID: AtomicU64 = AtomicU64::new(1);

fn next_row_version_id() -> u64 {
    NEXT_ROW_VERSION_ID.fetch_add(1, Ordering::Relaxed)
}

/// The row-version index. Cloning shares structure with the source in
/// O(1); see [`crate::btree::OrdMap`].
#[derive(Clone, Default)]
pub struct RowStore {
    map: OrdMap<RowKey, RowVersion>,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, RowKey, RowVersion> {
        self.map.iter()
    }

    pub fn seek(&self, pivot: &RowKey) -> Iter<'_, RowKey, RowVersion> {
        self.map.seek(pivot)
    }

    pub fn get(&self, key: &RowKey) -> Option<&RowVersion> {
        self.map.get(key)
    }

    /// Record a live row observation. On a repeat of an already-seen
    /// `(block, row, time)` triple the payload fields are refreshed but
    /// the tombstone flag is left alone, so a replayed insert cannot
    /// resurrect a delete recorded at the same timestamp.
    pub fn insert_version(
        &mut self,
        block_id: BlockId,
        row_id: RowId,
        time: Timestamp,
        batch: &Arc<Batch>,
        offset: u32,
        pk_bytes: Vec<u8>,
    ) -> u64 {
        let key = RowKey {
            block_id,
            row_id,
            time,
        };
        let version = match self.map.get(&key) {
            Some(existing) => {
                let mut version = existing.clone();
                version.batch = Arc::clone(batch);
                version.offset = offset;
                version.pk_bytes = pk_bytes;
                version
            }
            None => RowVersion {
                id: next_row_version_id(),
                deleted: false,
                batch: Arc::clone(batch),
                offset,
                pk_bytes,
            },
        };
        let id = version.id;
        self.map.insert(key, version);
        id
    }

    /// Record a delete observation. Last writer in log-tail order wins
    /// if a live version was already recorded at the same timestamp.
    pub fn insert_tombstone(
        &mut self,
        block_id: BlockId,
        row_id: RowId,
        time: Timestamp,
        batch: &Arc<Batch>,
        offset: u32,
    ) -> u64 {
        let key = RowKey {
            block_id,
            row_id,
            time,
        };
        let version = match self.map.get(&key) {
            Some(existing) => {
                let mut version = existing.clone();
                version.deleted = true;
                version.batch = Arc::clone(batch);
                version.offset = offset;
                version
            }
            None => RowVersion {
                id: next_row_version_id(),
                deleted: true,
                batch: Arc::clone(batch),
                offset,
                pk_bytes: Vec::new(),
            },
        };
        let id = version.id;
        self.map.insert(key, version);
        id
    }

    /// Does the row exist as of `ts`? The newest version with
    /// `time <= ts` decides; versions newer than `ts` are not visible.
    pub fn row_exists(&self, row_id: RowId, ts: Timestamp) -> bool {
        let block_id = row_id.block_id();
        let pivot = RowKey {
            block_id,
            row_id,
            time: ts,
        };
        for (key, version) in self.map.seek(&pivot) {
            if key.block_id != block_id || key.row_id != row_id {
                break;
            }
            if key.time > ts {
                // Not visible yet.
                continue;
            }
            return !version.deleted;
        }
        false
    }

    /// Remove every version belonging to `block`, returning the removed
    /// versions so the caller can drop their primary-key entries in the
    /// same apply step.
    pub fn delete_block(&mut self, block: BlockId) -> Vec<RowVersion> {
        let keys: Vec<RowKey> = self
            .map
            .seek(&RowKey::block_start(block))
            .take_while(|(key, _)| key.block_id == block)
            .map(|(key, _)| *key)
            .collect();
        let mut removed = Vec::with_capacity(keys.len());
        for key in &keys {
            if let Some(version) = self.map.remove(key) {
                removed.push(version);
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osprey_batch::{Vector, VectorData};

    fn empty_batch() -> Arc<Batch> {
        Arc::new(Batch::from_vectors(Vec::new()).expect("empty batch"))
    }

    fn payload_batch(values: Vec<i64>) -> Arc<Batch> {
        Arc::new(
            Batch::from_vectors(vec![Vector::new(VectorData::Int64(values))])
                .expect("uniform batch"),
        )
    }

    #[test]
    fn test_insert_assigns_monotonic_ids_per_new_triple() {
        let mut store = RowStore::new();
        let batch = empty_batch();
        let row = RowId::new(BlockId(1), 0);
        let a = store.insert_version(BlockId(1), row, Timestamp(10), &batch, 0, vec![]);
        let b = store.insert_version(BlockId(1), row, Timestamp(11), &batch, 0, vec![]);
        assert!(b > a);
        // Same triple again: identity is stable.
        let again = store.insert_version(BlockId(1), row, Timestamp(10), &batch, 0, vec![]);
        assert_eq!(again, a);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_reinsert_refreshes_payload() {
        let mut store = RowStore::new();
        let first = payload_batch(vec![1]);
        let second = payload_batch(vec![2]);
        let row = RowId::new(BlockId(1), 0);
        store.insert_version(BlockId(1), row, Timestamp(10), &first, 0, b"k1".to_vec());
        store.insert_version(BlockId(1), row, Timestamp(10), &second, 3, b"k2".to_vec());
        let key = RowKey {
            block_id: BlockId(1),
            row_id: row,
            time: Timestamp(10),
        };
        let version = store.get(&key).expect("present");
        assert_eq!(version.offset, 3);
        assert_eq!(version.pk_bytes, b"k2".to_vec());
        assert!(Arc::ptr_eq(&version.batch, &second));
    }

    #[test]
    fn test_tombstone_survives_replayed_insert() {
        let mut store = RowStore::new();
        let batch = empty_batch();
        let row = RowId::new(BlockId(1), 0);
        store.insert_tombstone(BlockId(1), row, Timestamp(10), &batch, 0);
        store.insert_version(BlockId(1), row, Timestamp(10), &batch, 0, vec![]);
        assert!(!store.row_exists(row, Timestamp(10)));
    }

    #[test]
    fn test_tombstone_overwrites_live_version_at_same_time() {
        let mut store = RowStore::new();
        let batch = empty_batch();
        let row = RowId::new(BlockId(1), 0);
        let id = store.insert_version(BlockId(1), row, Timestamp(10), &batch, 0, vec![]);
        let tomb_id = store.insert_tombstone(BlockId(1), row, Timestamp(10), &batch, 0);
        assert_eq!(id, tomb_id);
        assert!(!store.row_exists(row, Timestamp(10)));
    }

    #[test]
    fn test_row_exists_time_windows() {
        let mut store = RowStore::new();
        let batch = empty_batch();
        let row = RowId::new(BlockId(1), 0);
        store.insert_version(BlockId(1), row, Timestamp(10), &batch, 0, vec![]);
        assert!(!store.row_exists(row, Timestamp(5)));
        assert!(store.row_exists(row, Timestamp(10)));
        assert!(store.row_exists(row, Timestamp(11)));

        store.insert_tombstone(BlockId(1), row, Timestamp(20), &batch, 0);
        assert!(store.row_exists(row, Timestamp(15)));
        assert!(!store.row_exists(row, Timestamp(20)));
        assert!(!store.row_exists(row, Timestamp(25)));
    }

    #[test]
    fn test_out_of_order_version_arrival() {
        let mut store = RowStore::new();
        let batch = empty_batch();
        let row = RowId::new(BlockId(1), 0);
        store.insert_version(BlockId(1), row, Timestamp(10), &batch, 0, vec![]);
        store.insert_version(BlockId(1), row, Timestamp(5), &batch, 0, vec![]);
        assert!(store.row_exists(row, Timestamp(5)));
        assert!(store.row_exists(row, Timestamp(10)));
        assert!(!store.row_exists(row, Timestamp(4)));
    }

    #[test]
    fn test_delete_block_removes_only_that_block() {
        let mut store = RowStore::new();
        let batch = empty_batch();
        for offset in 0..5 {
            store.insert_version(
                BlockId(7),
                RowId::new(BlockId(7), offset),
                Timestamp(10),
                &batch,
                0,
                vec![offset as u8],
            );
        }
        store.insert_version(
            BlockId(8),
            RowId::new(BlockId(8), 0),
            Timestamp(10),
            &batch,
            0,
            vec![],
        );

        let removed = store.delete_block(BlockId(7));
        assert_eq!(removed.len(), 5);
        assert_eq!(store.len(), 1);
        assert!(!store.row_exists(RowId::new(BlockId(7), 0), Timestamp(99)));
        assert!(store.row_exists(RowId::new(BlockId(8), 0), Timestamp(99)));
    }

    #[test]
    fn test_iteration_order_within_row_is_time_descending() {
        let mut store = RowStore::new();
        let batch = empty_batch();
        let row = RowId::new(BlockId(1), 0);
        for t in [10u64, 30, 20] {
            store.insert_version(BlockId(1), row, Timestamp(t), &batch, 0, vec![]);
        }
        let times: Vec<u64> = store.iter().map(|(k, _)| k.time.0).collect();
        assert_eq!(times, vec![30, 20, 10]);
    }
}
