//! Read-only catalog surface the engine consumes.
//!
//! The schema registry proper lives on the control plane; the engine
//! only needs two facts per table: whether a log-tail entry targets the
//! table's block-metadata stream, and which user column carries the
//! primary key.

use std::collections::HashMap;

/// Block-metadata streams are named by prefixing the user table name.
pub const METADATA_TABLE_PREFIX: &str = "__osprey_meta_";

/// Does this log-tail entry carry block metadata rather than row data?
pub fn is_metadata_table(table_name: &str) -> bool {
    table_name.starts_with(METADATA_TABLE_PREFIX)
}

/// Name of the metadata stream paired with a user table.
pub fn metadata_table_name(table_name: &str) -> String {
    format!("{METADATA_TABLE_PREFIX}{table_name}")
}

/// Supplies the primary-key user-column index for a table, or `None`
/// when the table has no primary key.
pub trait PkCatalog {
    fn primary_key_column(&self, table_name: &str) -> Option<usize>;
}

/// Fixed table → primary-key-column map. Hosts with a real schema
/// registry implement [`PkCatalog`] directly.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    tables: HashMap<String, usize>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table_name: impl Into<String>, pk_column: usize) -> Self {
        self.tables.insert(table_name.into(), pk_column);
        self
    }
}

impl PkCatalog for StaticCatalog {
    fn primary_key_column(&self, table_name: &str) -> Option<usize> {
        self.tables.get(table_name).copied()
    }
}
