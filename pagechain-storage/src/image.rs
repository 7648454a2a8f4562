//! The stored form of one dataset: its descriptor plus the raw page
//! payloads, one byte run per cluster per column.
//!
//! Images are encoded with `bitcode`. Decoding is cheap enough to happen on
//! attach; sources keep the decoded image behind an `Arc` so clones share
//! the backing storage without re-reading it.

use crate::descriptor::{
    ColumnDescriptor, ColumnRange, ClusterDescriptor, DatasetDescriptor, FieldDescriptor,
};
use crate::types::{ClusterId, ColumnId, FieldId};
use bitcode::{Decode, Encode};
use pagechain_result::{Error, Result};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct DatasetImage {
    pub(crate) descriptor: DatasetDescriptor,
    /// `cluster_pages[cluster][column]` holds that cluster's column run as
    /// little-endian bytes.
    pub(crate) cluster_pages: Vec<Vec<Vec<u8>>>,
}

impl DatasetImage {
    pub fn builder(name: impl Into<String>) -> DatasetImageBuilder {
        DatasetImageBuilder::new(name)
    }

    pub fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// The raw payload of one cluster's column run.
    pub fn cluster_page(&self, cluster: ClusterId, column: ColumnId) -> Result<&[u8]> {
        self.cluster_pages
            .get(cluster as usize)
            .and_then(|pages| pages.get(column as usize))
            .map(Vec::as_slice)
            .ok_or_else(|| {
                Error::Corrupt(format!(
                    "no page payload stored for cluster {cluster}, column {column}"
                ))
            })
    }

    pub fn encode(&self) -> Vec<u8> {
        bitcode::encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bitcode::decode(bytes).map_err(|e| Error::Corrupt(format!("image decode failed: {e}")))
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.encode())?;
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::decode(&std::fs::read(path)?)
    }

    /// Cross-check the descriptor against the stored payloads: cluster ids
    /// dense, entry and element ranges contiguous, range arity matching the
    /// schema, and every payload exactly as long as its range claims.
    pub fn validate(&self) -> Result<()> {
        let desc = &self.descriptor;
        let n_columns = desc.n_columns();
        if self.cluster_pages.len() != desc.n_clusters() {
            return Err(Error::Corrupt(format!(
                "{} clusters described but {} page groups stored",
                desc.n_clusters(),
                self.cluster_pages.len()
            )));
        }

        let mut next_entry = 0u64;
        let mut next_element = vec![0u64; n_columns];
        for (slot, cluster) in desc.clusters().iter().enumerate() {
            if cluster.id() != slot as ClusterId {
                return Err(Error::Corrupt(format!(
                    "cluster in slot {slot} carries id {}",
                    cluster.id()
                )));
            }
            if cluster.first_entry_index() != next_entry {
                return Err(Error::Corrupt(format!(
                    "cluster {slot} starts at entry {} but {next_entry} entries precede it",
                    cluster.first_entry_index()
                )));
            }
            next_entry += cluster.entry_count();

            let pages = &self.cluster_pages[slot];
            if pages.len() != n_columns || cluster.column_ranges.len() != n_columns {
                return Err(Error::Corrupt(format!(
                    "cluster {slot} stores {} payloads and {} ranges for {n_columns} columns",
                    pages.len(),
                    cluster.column_ranges.len()
                )));
            }
            for (c, (payload, range)) in pages.iter().zip(&cluster.column_ranges).enumerate() {
                let element_size = desc.columns()[c].element_size();
                if element_size == 0 {
                    return Err(Error::Corrupt(format!("column {c} has element size 0")));
                }
                if range.first_element_index != next_element[c] {
                    return Err(Error::Corrupt(format!(
                        "cluster {slot} column {c} starts at element {} but {} elements precede it",
                        range.first_element_index, next_element[c]
                    )));
                }
                if payload.len() as u64 != range.element_count * element_size as u64 {
                    return Err(Error::Corrupt(format!(
                        "cluster {slot} column {c} stores {} bytes for {} elements of {element_size} bytes",
                        payload.len(),
                        range.element_count
                    )));
                }
                next_element[c] = range.end();
            }
        }
        Ok(())
    }
}

/// Builds a [`DatasetImage`] column by column and cluster by cluster,
/// deriving entry and element ranges from the payloads as they are added.
#[derive(Debug)]
pub struct DatasetImageBuilder {
    name: String,
    fields: Vec<FieldDescriptor>,
    columns: Vec<ColumnDescriptor>,
    clusters: Vec<ClusterDescriptor>,
    cluster_pages: Vec<Vec<Vec<u8>>>,
}

impl DatasetImageBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            columns: Vec::new(),
            clusters: Vec::new(),
            cluster_pages: Vec::new(),
        }
    }

    /// Add a field backed by a single column of `element_size`-byte values.
    /// Returns the column's id.
    pub fn column(&mut self, name: &str, type_name: &str, element_size: u32) -> ColumnId {
        let field_id = self.fields.len() as FieldId;
        self.fields.push(FieldDescriptor {
            id: field_id,
            name: name.to_string(),
            type_name: type_name.to_string(),
        });
        let id = self.columns.len() as ColumnId;
        self.columns.push(ColumnDescriptor {
            id,
            field_id,
            type_name: type_name.to_string(),
            element_size,
        });
        id
    }

    /// Append a cluster of `entry_count` entries with one payload per
    /// column. Element counts are derived from the payload lengths; the
    /// payloads must divide evenly by their column's element size.
    pub fn cluster(&mut self, entry_count: u64, pages: Vec<Vec<u8>>) -> Result<ClusterId> {
        if pages.len() != self.columns.len() {
            return Err(Error::InvalidArgument(format!(
                "cluster supplies {} payloads for {} columns",
                pages.len(),
                self.columns.len()
            )));
        }
        let mut ranges = Vec::with_capacity(pages.len());
        for (payload, column) in pages.iter().zip(&self.columns) {
            let element_size = column.element_size();
            if element_size == 0 || payload.len() % element_size != 0 {
                return Err(Error::InvalidArgument(format!(
                    "payload of {} bytes does not divide into {}-byte elements of column {}",
                    payload.len(),
                    column.element_size,
                    column.id
                )));
            }
            let first_element_index = self
                .clusters
                .last()
                .and_then(|c| c.column_ranges.get(column.id as usize))
                .map(ColumnRange::end)
                .unwrap_or(0);
            ranges.push(ColumnRange {
                first_element_index,
                element_count: (payload.len() / element_size) as u64,
            });
        }

        let id = self.clusters.len() as ClusterId;
        self.clusters.push(ClusterDescriptor {
            id,
            first_entry_index: self
                .clusters
                .last()
                .map(|c| c.first_entry_index + c.entry_count)
                .unwrap_or(0),
            entry_count,
            column_ranges: ranges,
        });
        self.cluster_pages.push(pages);
        Ok(id)
    }

    pub fn finish(self) -> DatasetImage {
        DatasetImage {
            descriptor: DatasetDescriptor {
                name: self.name,
                fields: self.fields,
                columns: self.columns,
                clusters: self.clusters,
            },
            cluster_pages: self.cluster_pages,
        }
    }
}
