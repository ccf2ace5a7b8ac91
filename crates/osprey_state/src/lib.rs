//! In-memory partition state engine for an OspreyDB compute node.
//!
//! A partition's logical contents are materialized by consuming the
//! ordered log-tail stream from the transaction authority and applying
//! each entry to three copy-on-write ordered indices: row versions,
//! block metadata, and the primary-key index. Readers take O(1)
//! snapshots and run time-travel queries against them while the single
//! writer keeps applying.
//!
//! Out of scope here, by design: the RPC transport carrying log-tail
//! batches, the catalog registry (consumed via [`catalog::PkCatalog`]),
//! object storage (sealed blocks are only referenced by location
//! strings), and SQL above point lookup / snapshot visibility.

pub mod applier;
pub mod blocks;
pub mod btree;
pub mod catalog;
pub mod codec;
pub mod entry;
pub mod pk_index;
pub mod rows;
pub mod state;


pub use applier::{Applier, EntryKind, LogTailEntry};
pub use catalog::{is_metadata_table, metadata_table_name, PkCatalog, StaticCatalog};
pub use codec::KeyPacker;
pub use state::{Partition, PartitionState};
