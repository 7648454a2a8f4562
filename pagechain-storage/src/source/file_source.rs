use super::{MemSource, PageSource};
use crate::descriptor::DatasetDescriptor;
use crate::image::DatasetImage;
use crate::options::ReadOptions;
use crate::page::Page;
use crate::types::{ClusterIndex, ColumnId, EntryIndex};
use pagechain_result::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Page source opened from a dataset image stored on disk.
///
/// Construction is cheap; the file is read and decoded on `attach`, which
/// also verifies that the stored dataset is the one that was asked for.
/// After attach it behaves exactly like a [`MemSource`] over the decoded
/// image. Clones re-open the same path with fresh state.
pub struct FileSource {
    name: String,
    path: PathBuf,
    options: ReadOptions,
    inner: Option<MemSource>,
}

impl FileSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, options: ReadOptions) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            options,
            inner: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn inner(&self) -> Result<&MemSource> {
        self.inner.as_ref().ok_or(Error::NotAttached)
    }

    fn inner_mut(&mut self) -> Result<&mut MemSource> {
        self.inner.as_mut().ok_or(Error::NotAttached)
    }
}

impl PageSource for FileSource {
    fn dataset_name(&self) -> &str {
        &self.name
    }

    fn attach(&mut self) -> Result<()> {
        if self.inner.is_some() {
            return Ok(());
        }
        let image = DatasetImage::read_from(&self.path)?;
        if image.name() != self.name {
            return Err(Error::Corrupt(format!(
                "{} stores dataset '{}', expected '{}'",
                self.path.display(),
                image.name(),
                self.name
            )));
        }
        let mut inner = MemSource::new(Arc::new(image), self.options.clone());
        inner.attach()?;
        tracing::debug!(
            path = %self.path.display(),
            entries = inner.entry_count()?,
            "attached dataset image"
        );
        self.inner = Some(inner);
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.inner.is_some()
    }

    fn descriptor(&self) -> Result<&DatasetDescriptor> {
        self.inner()?.descriptor()
    }

    fn populate_page_at(&mut self, column: ColumnId, entry: EntryIndex) -> Result<Page> {
        self.inner_mut()?.populate_page_at(column, entry)
    }

    fn populate_page_in_cluster(&mut self, column: ColumnId, at: ClusterIndex) -> Result<Page> {
        self.inner_mut()?.populate_page_in_cluster(column, at)
    }

    fn release_page(&mut self, page: Page) -> Result<()> {
        self.inner_mut()?.release_page(page)
    }

    fn clone_source(&self) -> Result<Box<dyn PageSource>> {
        Ok(Box::new(FileSource::new(
            self.name.clone(),
            self.path.clone(),
            self.options.clone(),
        )))
    }
}
