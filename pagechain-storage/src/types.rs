/// Entry number within a dataset. Global or source-local depending on
/// context; a chain translates between the two.
pub type EntryIndex = u64;

/// Element number within a single column. Columns are not required to store
/// exactly one element per entry, so element and entry indices are distinct
/// dimensions.
pub type ElementIndex = u64;

/// Cluster number. Dense, starting at 0 within each dataset; a merged
/// descriptor renumbers clusters into one global sequence.
pub type ClusterId = u64;

/// Dense column id, assigned in schema order.
pub type ColumnId = u32;

/// Dense field id, assigned in schema order.
pub type FieldId = u32;

/// A cluster-relative read coordinate.
///
/// `entry_offset` counts entries from the start of the cluster and is never
/// shifted when clusters are renumbered across chained datasets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterIndex {
    pub cluster_id: ClusterId,
    pub entry_offset: u64,
}

impl ClusterIndex {
    pub fn new(cluster_id: ClusterId, entry_offset: u64) -> Self {
        Self {
            cluster_id,
            entry_offset,
        }
    }
}
