//! Secondary index from encoded primary-key bytes to row-version
//! identity.
//!
//! Entries for different versions of the same logical row coexist;
//! readers resolve visibility by joining each entry back to its row
//! version. Every entry must reference a live row version — block
//! removal and compaction delete the pointing entries in the same apply
//! step that removes the versions.

use osprey_common::types::{BlockId, RowId};

use crate::btree::OrdMap;
use crate::entry::{PkEntry, PkKey};

#[derive(Clone, Default)]
pub struct PrimaryKeyIndex {
    map: OrdMap<PkKey, PkEntry>,
}

impl PrimaryKeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn insert(&mut self, bytes: Vec<u8>, row_version_id: u64, block_id: BlockId, row_id: RowId) {
        self.map.insert(
            PkKey {
                bytes,
                row_version_id,
            },
            PkEntry { block_id, row_id },
        );
    }

    pub fn remove(&mut self, bytes: &[u8], row_version_id: u64) {
        self.map.remove(&PkKey {
            bytes: bytes.to_vec(),
            row_version_id,
        });
    }

    /// All entries for exactly `bytes`, in ascending version identity
    /// (insertion order of the versions under that key).
    pub fn range<'a>(&'a self, bytes: &'a [u8]) -> impl Iterator<Item = (&'a PkKey, &'a PkEntry)> {
        let pivot = PkKey {
            bytes: bytes.to_vec(),
            row_version_id: 0,
        };
        self.map
            .seek(&pivot)
            .take_while(move |(key, _)| key.bytes.as_slice() == bytes)
    }

    pub fn iter(&self) -> crate::btree::Iter<'_, PkKey, PkEntry> {
        self.map.iter()
    }
}
