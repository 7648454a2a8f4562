//! Chains independently stored datasets into one logical page source.
//!
//! A [`SourceChain`] owns an ordered list of [`PageSource`]s and presents
//! their entries, clusters, and column elements under one contiguous global
//! numbering. Reads are translated through prefix-sum tables built at
//! construction, delegated to the owning source, and the returned page is
//! re-windowed into global coordinates before it reaches the caller. The
//! chain is itself a `PageSource`, so chains nest.

use pagechain_result::{Error, Result};
use pagechain_storage::descriptor::{DatasetDescriptor, DescriptorBuilder};
use pagechain_storage::options::ReadOptions;
use pagechain_storage::page::{ClusterInfo, Page};
use pagechain_storage::source::{FileSource, PageSource};
use pagechain_storage::types::{ClusterIndex, ColumnId, EntryIndex};
use rustc_hash::FxHashMap;
use std::path::PathBuf;

/// How a chain takes possession of its sources. One constructor handles all
/// three modes so validation and table building share a single code path.
pub enum SourceSet<'a> {
    /// Open a [`FileSource`] per location, all serving the same dataset.
    Locations(&'a [PathBuf]),
    /// Duplicate each handle via `clone_source`; the originals stay with
    /// the caller.
    Shared(&'a [&'a dyn PageSource]),
    /// Take ownership of sources the caller already built. Sources that
    /// are not yet attached are attached during construction.
    Owned(Vec<Box<dyn PageSource>>),
}

/// An ordered, non-empty list of datasets composed into one.
///
/// Construction attaches every source, checks schema compatibility, and
/// builds the index-translation tables. The merged descriptor is built by
/// [`attach`](PageSource::attach), which must run before pages can be
/// populated. A chain is a single-consumer value: concurrent readers each
/// take their own [`try_clone`](Self::try_clone), which shares the
/// underlying storage but nothing else.
pub struct SourceChain {
    name: String,
    options: ReadOptions,
    sources: Vec<Box<dyn PageSource>>,
    /// Prefix sums over per-source counts; `len() == n_sources + 1`,
    /// leading 0, total in the last slot.
    entry_base: Vec<u64>,
    cluster_base: Vec<u64>,
    /// One row per source boundary, one column per column id of the first
    /// source's schema.
    column_element_base: Vec<Vec<u64>>,
    degraded: bool,
    descriptor: Option<DatasetDescriptor>,
    /// Buffer identity of every live page, mapped to the index of the
    /// source that produced it.
    page_owners: FxHashMap<usize, usize>,
}

impl SourceChain {
    /// Build a chain over `set`, attaching anything not yet attached.
    /// Fails with `EmptyChain` for an empty set; schema disagreement does
    /// NOT fail construction, it flips the chain into degraded mode.
    pub fn new(name: impl Into<String>, set: SourceSet<'_>, options: ReadOptions) -> Result<Self> {
        let name = name.into();
        let mut sources: Vec<Box<dyn PageSource>> = match set {
            SourceSet::Locations(paths) => paths
                .iter()
                .map(|p| {
                    Box::new(FileSource::new(name.clone(), p, options.clone()))
                        as Box<dyn PageSource>
                })
                .collect(),
            SourceSet::Shared(handles) => handles
                .iter()
                .map(|s| s.clone_source())
                .collect::<Result<_>>()?,
            SourceSet::Owned(sources) => sources,
        };
        if sources.is_empty() {
            return Err(Error::EmptyChain);
        }
        for source in &mut sources {
            if !source.is_attached() {
                source.attach()?;
            }
        }

        let degraded = compare_metadata(&sources)?;
        let (entry_base, cluster_base, column_element_base) = build_bases(&sources)?;
        tracing::debug!(
            sources = sources.len(),
            entries = entry_base[sources.len()],
            clusters = cluster_base[sources.len()],
            degraded,
            "composed page source chain"
        );

        Ok(Self {
            name,
            options,
            sources,
            entry_base,
            cluster_base,
            column_element_base,
            degraded,
            descriptor: None,
            page_owners: FxHashMap::default(),
        })
    }

    pub fn from_locations(
        name: impl Into<String>,
        paths: &[PathBuf],
        options: ReadOptions,
    ) -> Result<Self> {
        Self::new(name, SourceSet::Locations(paths), options)
    }

    pub fn from_shared(
        name: impl Into<String>,
        handles: &[&dyn PageSource],
        options: ReadOptions,
    ) -> Result<Self> {
        Self::new(name, SourceSet::Shared(handles), options)
    }

    pub fn from_sources(
        name: impl Into<String>,
        sources: Vec<Box<dyn PageSource>>,
        options: ReadOptions,
    ) -> Result<Self> {
        Self::new(name, SourceSet::Owned(sources), options)
    }

    /// Whether cross-source metadata mismatched at construction. Reads on a
    /// degraded chain still work but may be semantically incoherent; the
    /// flag never clears.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn n_sources(&self) -> usize {
        self.sources.len()
    }

    /// Pages handed out by this chain and not yet released.
    pub fn live_page_count(&self) -> usize {
        self.page_owners.len()
    }

    /// An independent chain over duplicates of the same sources: same
    /// dataset name and options, fresh tracking state, shared backing
    /// storage. Equivalent to re-running the constructor.
    pub fn try_clone(&self) -> Result<Self> {
        let handles: Vec<&dyn PageSource> = self.sources.iter().map(|s| s.as_ref()).collect();
        Self::new(
            self.name.clone(),
            SourceSet::Shared(&handles),
            self.options.clone(),
        )
    }

    fn merged_descriptor(&self) -> Result<&DatasetDescriptor> {
        self.descriptor.as_ref().ok_or(Error::NotAttached)
    }

    /// Global element offset of `column` for pages produced by source
    /// `source_index`. Column ids beyond the first source's schema are
    /// rejected here, before any page is populated.
    fn column_element_base(&self, source_index: usize, column: ColumnId) -> Result<u64> {
        let row = &self.column_element_base[source_index];
        row.get(column as usize)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                what: "column",
                index: column as u64,
                len: row.len() as u64,
            })
    }

    /// Index of the source owning global index `index`, given a prefix-sum
    /// table: the `i` with `base[i] <= index < base[i + 1]`.
    fn locate(base: &[u64], index: u64, what: &'static str) -> Result<usize> {
        let total = base[base.len() - 1];
        if index >= total {
            return Err(Error::IndexOutOfRange {
                what,
                index,
                len: total,
            });
        }
        // base[0] == 0 <= index, so the partition point is at least 1.
        // Sources with zero entries collapse to repeated table values and
        // are skipped by taking the last boundary <= index.
        Ok(base.partition_point(|&b| b <= index) - 1)
    }

    /// Track and re-window a page just produced by `sources[source_index]`.
    fn adopt_page(
        &mut self,
        mut page: Page,
        source_index: usize,
        element_base: u64,
        attribution: ClusterInfo,
    ) -> Page {
        if !page.is_empty() {
            self.page_owners.insert(page.buffer_id(), source_index);
        }
        page.set_window(page.global_range_first() + element_base, attribution);
        page
    }
}

impl PageSource for SourceChain {
    fn dataset_name(&self) -> &str {
        &self.name
    }

    /// Build the merged descriptor: the first source's header and footer,
    /// then every further source's clusters renumbered onto the global
    /// totals. Idempotent, and derived from source state alone.
    fn attach(&mut self) -> Result<()> {
        if self.descriptor.is_some() {
            return Ok(());
        }
        let mut builder = DescriptorBuilder::new();
        self.sources[0].header_and_footer(&mut builder)?;
        for source in &self.sources[1..] {
            builder.add_clusters_from(source.descriptor()?);
        }
        self.descriptor = Some(builder.build()?);
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.descriptor.is_some()
    }

    fn descriptor(&self) -> Result<&DatasetDescriptor> {
        self.merged_descriptor()
    }

    fn populate_page_at(&mut self, column: ColumnId, entry: EntryIndex) -> Result<Page> {
        let source_index = Self::locate(&self.entry_base, entry, "entry")?;
        let element_base = self.column_element_base(source_index, column)?;
        let attribution = {
            let cluster = self.merged_descriptor()?.cluster_containing_entry(entry)?;
            ClusterInfo {
                id: cluster.id(),
                first_element_index: cluster.column_range(column)?.first_element_index,
            }
        };

        let local_entry = entry - self.entry_base[source_index];
        let page = self.sources[source_index].populate_page_at(column, local_entry)?;
        Ok(self.adopt_page(page, source_index, element_base, attribution))
    }

    fn populate_page_in_cluster(&mut self, column: ColumnId, at: ClusterIndex) -> Result<Page> {
        let source_index = Self::locate(&self.cluster_base, at.cluster_id, "cluster")?;
        let element_base = self.column_element_base(source_index, column)?;
        let attribution = {
            let cluster = self.merged_descriptor()?.cluster(at.cluster_id)?;
            ClusterInfo {
                id: at.cluster_id,
                first_element_index: cluster.column_range(column)?.first_element_index,
            }
        };

        // The in-cluster entry offset is cluster-local and passes through
        // unshifted; only the cluster id is translated.
        let local = ClusterIndex::new(
            at.cluster_id - self.cluster_base[source_index],
            at.entry_offset,
        );
        let page = self.sources[source_index].populate_page_in_cluster(column, local)?;
        Ok(self.adopt_page(page, source_index, element_base, attribution))
    }

    /// Route a release to the source that produced the page. The tracker
    /// entry is removed before forwarding: allocators reuse addresses, so a
    /// stale entry would misattribute the next page that lands on the same
    /// one.
    fn release_page(&mut self, page: Page) -> Result<()> {
        if page.is_empty() {
            return Ok(());
        }
        match self.page_owners.remove(&page.buffer_id()) {
            Some(source_index) => self.sources[source_index].release_page(page),
            None => Err(Error::UnknownPage),
        }
    }

    fn clone_source(&self) -> Result<Box<dyn PageSource>> {
        Ok(Box::new(self.try_clone()?))
    }
}

/// Compare every source's schema against the first one's. Returns whether
/// the chain must degrade; the first discrepancy decides, warns once, and
/// ends the scan.
fn compare_metadata(sources: &[Box<dyn PageSource>]) -> Result<bool> {
    let first = sources[0].descriptor()?;
    for (index, source) in sources.iter().enumerate().skip(1) {
        let other = source.descriptor()?;
        if first.n_fields() != other.n_fields() || first.n_columns() != other.n_columns() {
            tracing::warn!(
                source = index,
                "chained datasets disagree on field/column counts; reads may be incoherent"
            );
            return Ok(true);
        }
        for id in 0..first.n_fields() as u32 {
            if first.field(id)? != other.field(id)? {
                tracing::warn!(
                    source = index,
                    field = id,
                    "chained datasets disagree on field metadata; reads may be incoherent"
                );
                return Ok(true);
            }
        }
        for id in 0..first.n_columns() as u32 {
            if first.column(id)? != other.column(id)? {
                tracing::warn!(
                    source = index,
                    column = id,
                    "chained datasets disagree on column metadata; reads may be incoherent"
                );
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Build the three prefix-sum tables from the attached sources. Column
/// arity follows the first source's schema; a degraded source missing a
/// column contributes 0 elements for it.
fn build_bases(sources: &[Box<dyn PageSource>]) -> Result<(Vec<u64>, Vec<u64>, Vec<Vec<u64>>)> {
    let n_sources = sources.len();
    let n_columns = sources[0].descriptor()?.n_columns();

    let mut entry_base = vec![0u64; n_sources + 1];
    let mut cluster_base = vec![0u64; n_sources + 1];
    let mut column_element_base = vec![vec![0u64; n_columns]; n_sources + 1];
    for (i, source) in sources.iter().enumerate() {
        let desc = source.descriptor()?;
        entry_base[i + 1] = entry_base[i] + desc.n_entries();
        cluster_base[i + 1] = cluster_base[i] + desc.n_clusters() as u64;
        for c in 0..n_columns {
            column_element_base[i + 1][c] =
                column_element_base[i][c] + desc.total_elements(c as ColumnId);
        }
    }
    Ok((entry_base, cluster_base, column_element_base))
}
