use super::PageSource;
use crate::descriptor::DatasetDescriptor;
use crate::image::DatasetImage;
use crate::options::ReadOptions;
use crate::page::{ClusterInfo, Page};
use crate::types::{ClusterIndex, ColumnId, EntryIndex};
use arrow::buffer::Buffer;
use pagechain_result::{Error, Result};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Page source over an in-memory [`DatasetImage`].
///
/// The image sits behind an `Arc`: clones share it without copying while
/// keeping independent attach and page-tracking state. Every population
/// materializes a fresh buffer, so each live page has a distinct identity.
pub struct MemSource {
    image: Arc<DatasetImage>,
    options: ReadOptions,
    attached: bool,
    live_pages: FxHashSet<usize>,
}

impl MemSource {
    pub fn new(image: impl Into<Arc<DatasetImage>>, options: ReadOptions) -> Self {
        Self {
            image: image.into(),
            options,
            attached: false,
            live_pages: FxHashSet::default(),
        }
    }

    /// Number of pages handed out and not yet released.
    pub fn live_page_count(&self) -> usize {
        self.live_pages.len()
    }

    fn attached_descriptor(&self) -> Result<&DatasetDescriptor> {
        if self.attached {
            Ok(self.image.descriptor())
        } else {
            Err(Error::NotAttached)
        }
    }

    /// Materialize the page for `column` out of `cluster`, windowed in this
    /// source's local element numbering.
    fn make_page(&mut self, column: ColumnId, cluster_id: u64) -> Result<Page> {
        let desc = self.attached_descriptor()?;
        let element_size = desc.column(column)?.element_size();
        let range = desc.cluster(cluster_id)?.column_range(column)?;
        let payload = self.image.cluster_page(cluster_id, column)?;

        let page = Page::new(
            column,
            Buffer::from_vec(payload.to_vec()),
            element_size,
            range.first_element_index,
            ClusterInfo {
                id: cluster_id,
                first_element_index: range.first_element_index,
            },
        );
        if !page.is_empty() {
            self.live_pages.insert(page.buffer_id());
        }
        Ok(page)
    }
}

impl PageSource for MemSource {
    fn dataset_name(&self) -> &str {
        self.image.name()
    }

    fn attach(&mut self) -> Result<()> {
        if self.attached {
            return Ok(());
        }
        if self.options.validate_on_attach {
            self.image.validate()?;
        }
        self.attached = true;
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.attached
    }

    fn descriptor(&self) -> Result<&DatasetDescriptor> {
        self.attached_descriptor()
    }

    fn populate_page_at(&mut self, column: ColumnId, entry: EntryIndex) -> Result<Page> {
        let cluster_id = self
            .attached_descriptor()?
            .cluster_containing_entry(entry)?
            .id();
        self.make_page(column, cluster_id)
    }

    fn populate_page_in_cluster(&mut self, column: ColumnId, at: ClusterIndex) -> Result<Page> {
        let cluster = self.attached_descriptor()?.cluster(at.cluster_id)?;
        if at.entry_offset >= cluster.entry_count() {
            return Err(Error::IndexOutOfRange {
                what: "entry offset",
                index: at.entry_offset,
                len: cluster.entry_count(),
            });
        }
        self.make_page(column, at.cluster_id)
    }

    fn release_page(&mut self, page: Page) -> Result<()> {
        if page.is_empty() {
            return Ok(());
        }
        if self.live_pages.remove(&page.buffer_id()) {
            Ok(())
        } else {
            Err(Error::UnknownPage)
        }
    }

    fn clone_source(&self) -> Result<Box<dyn PageSource>> {
        Ok(Box::new(MemSource::new(
            Arc::clone(&self.image),
            self.options.clone(),
        )))
    }
}
