//! The read contract over one dataset, and its implementations.

use crate::descriptor::{DatasetDescriptor, DescriptorBuilder};
use crate::page::Page;
use crate::types::{ClusterIndex, ColumnId, EntryIndex};
use pagechain_result::Result;

pub mod file_source;
pub use file_source::*;

pub mod mem_source;
pub use mem_source::*;

/// A read-only provider of one dataset's pages.
///
/// Implementations own their page accounting: every page handed out stays
/// registered with its source until released back, and releasing a page the
/// source does not know is an error. `attach` must run before any metadata
/// or page access; entry and cluster counts come from the descriptor it
/// loads. Sources are single-consumer values; concurrent readers duplicate
/// a source with [`clone_source`](Self::clone_source) and work on
/// independent copies that share backing storage.
pub trait PageSource: Send {
    /// Name of the dataset this source serves.
    fn dataset_name(&self) -> &str;

    /// Load header and footer metadata. Idempotent.
    fn attach(&mut self) -> Result<()>;

    fn is_attached(&self) -> bool;

    /// The dataset's metadata. Fails with `NotAttached` before `attach`.
    fn descriptor(&self) -> Result<&DatasetDescriptor>;

    fn entry_count(&self) -> Result<EntryIndex> {
        Ok(self.descriptor()?.n_entries())
    }

    /// The page covering `entry` for `column`, windowed in this source's
    /// own element numbering.
    fn populate_page_at(&mut self, column: ColumnId, entry: EntryIndex) -> Result<Page>;

    /// The page covering an entry offset within one of this source's
    /// clusters.
    fn populate_page_in_cluster(&mut self, column: ColumnId, at: ClusterIndex) -> Result<Page>;

    /// Return a page to its allocator. Empty pages release as a no-op;
    /// pages this source is not tracking fail with `UnknownPage`.
    fn release_page(&mut self, page: Page) -> Result<()>;

    /// Contribute this source's header and cluster metadata to `builder`.
    /// The default implementation copies the attached descriptor; the
    /// builder renumbers clusters as further sources are appended after it.
    fn header_and_footer(&self, builder: &mut DescriptorBuilder) -> Result<()> {
        let desc = self.descriptor()?;
        builder.header(
            desc.name.clone(),
            desc.fields.clone(),
            desc.columns.clone(),
        );
        builder.add_clusters_from(desc);
        Ok(())
    }

    /// An independent duplicate with fresh read state, sharing this
    /// source's backing storage. Returned unattached.
    fn clone_source(&self) -> Result<Box<dyn PageSource>>;
}
