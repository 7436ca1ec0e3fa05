//! Column family definitions for the RocksDB entry store.
//!
//! Two column families with different access patterns:
//! - entries: record-keyed queue rows, read-modify-write heavy
//! - entry_ids: entry-id -> record-key index for failure/delete lookups

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family for queue entries, keyed by record identity
pub const CF_ENTRIES: &str = "entries";

/// Column family mapping store-assigned entry ids to record keys
pub const CF_ENTRY_IDS: &str = "entry_ids";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_ENTRIES, CF_ENTRY_IDS];

/// Create column family options for entries (short-lived rows, point lookups)
fn entries_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_ENTRIES, entries_options()),
        ColumnFamilyDescriptor::new(CF_ENTRY_IDS, Options::default()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors_cover_all_names() {
        let descriptors = build_cf_descriptors();
        assert_eq!(descriptors.len(), ALL_CF_NAMES.len());
    }
}
