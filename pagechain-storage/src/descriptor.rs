//! Dataset metadata: fields, columns, clusters, and the builder that can
//! splice several datasets' cluster metadata into one descriptor.
//!
//! Descriptors are value types with structural equality; compatibility
//! checking across chained datasets compares them directly.

use crate::types::{ClusterId, ColumnId, ElementIndex, EntryIndex, FieldId};
use bitcode::{Decode, Encode};
use pagechain_result::{Error, Result};

/// One logical field of the schema.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct FieldDescriptor {
    pub(crate) id: FieldId,
    pub(crate) name: String,
    pub(crate) type_name: String,
}

impl FieldDescriptor {
    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

/// One physical column backing a field.
///
/// `element_size` is the fixed byte width of a single element; page payload
/// lengths are always a multiple of it.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct ColumnDescriptor {
    pub(crate) id: ColumnId,
    pub(crate) field_id: FieldId,
    pub(crate) type_name: String,
    pub(crate) element_size: u32,
}

impl ColumnDescriptor {
    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn field_id(&self) -> FieldId {
        self.field_id
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn element_size(&self) -> usize {
        self.element_size as usize
    }
}

/// The run of elements one cluster stores for one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct ColumnRange {
    pub first_element_index: ElementIndex,
    pub element_count: u64,
}

impl ColumnRange {
    /// Index one past the last element of the run.
    pub fn end(&self) -> ElementIndex {
        self.first_element_index + self.element_count
    }
}

/// A contiguous batch of entries and its per-column element ranges.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct ClusterDescriptor {
    pub(crate) id: ClusterId,
    pub(crate) first_entry_index: EntryIndex,
    pub(crate) entry_count: u64,
    pub(crate) column_ranges: Vec<ColumnRange>,
}

impl ClusterDescriptor {
    pub fn id(&self) -> ClusterId {
        self.id
    }

    pub fn first_entry_index(&self) -> EntryIndex {
        self.first_entry_index
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn column_range(&self, column: ColumnId) -> Result<ColumnRange> {
        self.column_ranges
            .get(column as usize)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                what: "column",
                index: column as u64,
                len: self.column_ranges.len() as u64,
            })
    }
}

/// Complete metadata of one dataset: identity, schema, and cluster layout.
///
/// Also describes a chained view, in which case the clusters carry global
/// numbering produced by [`DescriptorBuilder::add_clusters_from`].
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct DatasetDescriptor {
    pub(crate) name: String,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) columns: Vec<ColumnDescriptor>,
    pub(crate) clusters: Vec<ClusterDescriptor>,
}

impl DatasetDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn n_clusters(&self) -> usize {
        self.clusters.len()
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn clusters(&self) -> &[ClusterDescriptor] {
        &self.clusters
    }

    pub fn field(&self, id: FieldId) -> Result<&FieldDescriptor> {
        self.fields.get(id as usize).ok_or(Error::IndexOutOfRange {
            what: "field",
            index: id as u64,
            len: self.fields.len() as u64,
        })
    }

    pub fn column(&self, id: ColumnId) -> Result<&ColumnDescriptor> {
        self.columns
            .get(id as usize)
            .ok_or(Error::IndexOutOfRange {
                what: "column",
                index: id as u64,
                len: self.columns.len() as u64,
            })
    }

    pub fn cluster(&self, id: ClusterId) -> Result<&ClusterDescriptor> {
        self.clusters
            .get(id as usize)
            .ok_or(Error::IndexOutOfRange {
                what: "cluster",
                index: id,
                len: self.clusters.len() as u64,
            })
    }

    /// Total number of entries, derived from the last cluster.
    pub fn n_entries(&self) -> EntryIndex {
        self.clusters
            .last()
            .map(|c| c.first_entry_index + c.entry_count)
            .unwrap_or(0)
    }

    /// Total number of elements stored for `column`, derived from the last
    /// cluster's range for it. Correct whether or not the last cluster is
    /// "full", and 0 for columns with no recorded range.
    pub fn total_elements(&self, column: ColumnId) -> u64 {
        self.clusters
            .last()
            .and_then(|c| c.column_ranges.get(column as usize))
            .map(ColumnRange::end)
            .unwrap_or(0)
    }

    /// The cluster whose entry range covers `entry`.
    pub fn cluster_containing_entry(&self, entry: EntryIndex) -> Result<&ClusterDescriptor> {
        let total = self.n_entries();
        if entry >= total {
            return Err(Error::IndexOutOfRange {
                what: "entry",
                index: entry,
                len: total,
            });
        }
        // Clusters are contiguous and ordered by first entry. A zero-entry
        // cluster shares its first entry with its successor; the partition
        // point lands on the successor, which is the one that owns it.
        let slot = self
            .clusters
            .partition_point(|c| c.first_entry_index <= entry)
            - 1;
        let cluster = &self.clusters[slot];
        if entry < cluster.first_entry_index + cluster.entry_count {
            Ok(cluster)
        } else {
            Err(Error::Internal(format!(
                "entry {entry} falls into a gap after cluster {}",
                cluster.id
            )))
        }
    }
}

/// Incremental [`DatasetDescriptor`] construction.
///
/// A builder is seeded with one dataset's header (identity + schema), after
/// which [`add_clusters_from`](Self::add_clusters_from) splices in cluster
/// metadata from any number of further datasets, renumbered onto the running
/// totals. The splice never re-checks schema compatibility: feeding it
/// mismatched datasets produces exactly the concatenation it was asked for.
#[derive(Debug, Default)]
pub struct DescriptorBuilder {
    name: Option<String>,
    fields: Vec<FieldDescriptor>,
    columns: Vec<ColumnDescriptor>,
    clusters: Vec<ClusterDescriptor>,
}

impl DescriptorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dataset identity and schema. Replaces any previous header.
    pub fn header(
        &mut self,
        name: impl Into<String>,
        fields: Vec<FieldDescriptor>,
        columns: Vec<ColumnDescriptor>,
    ) -> &mut Self {
        self.name = Some(name.into());
        self.fields = fields;
        self.columns = columns;
        self
    }

    /// Append every cluster of `other`, renumbered to continue after the
    /// clusters already present: cluster ids restart at the current count,
    /// entry ranges continue after the current entry total, and each column
    /// range is shifted by the current per-column element total.
    pub fn add_clusters_from(&mut self, other: &DatasetDescriptor) -> &mut Self {
        let entry_offset = self
            .clusters
            .last()
            .map(|c| c.first_entry_index + c.entry_count)
            .unwrap_or(0);
        let element_offsets: Vec<u64> = (0..self.columns.len())
            .map(|c| {
                self.clusters
                    .last()
                    .and_then(|cl| cl.column_ranges.get(c))
                    .map(ColumnRange::end)
                    .unwrap_or(0)
            })
            .collect();

        for cluster in &other.clusters {
            let mut ranges = cluster.column_ranges.clone();
            for (c, range) in ranges.iter_mut().enumerate() {
                range.first_element_index += element_offsets.get(c).copied().unwrap_or(0);
            }
            self.clusters.push(ClusterDescriptor {
                id: self.clusters.len() as ClusterId,
                first_entry_index: cluster.first_entry_index + entry_offset,
                entry_count: cluster.entry_count,
                column_ranges: ranges,
            });
        }
        self
    }

    pub fn build(self) -> Result<DatasetDescriptor> {
        let name = self
            .name
            .ok_or_else(|| Error::Internal("descriptor builder has no header".to_string()))?;
        Ok(DatasetDescriptor {
            name,
            fields: self.fields,
            columns: self.columns,
            clusters: self.clusters,
        })
    }
}
