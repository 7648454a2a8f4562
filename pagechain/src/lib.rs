//! Pagechain: one logical page source over many columnar datasets.
//!
//! Each dataset in a chain keeps its own header, footer, schema, and
//! cluster layout; the chain validates that the schemas line up, builds the
//! translation tables from local to global numbering, and dispatches page
//! reads to whichever source owns the requested entry or cluster. Callers
//! see a single contiguous dataset and never learn which file served them.
//!
//! ```
//! use pagechain::{DatasetImage, MemSource, PageSource, ReadOptions, SourceChain, SourceSet};
//!
//! # fn main() -> pagechain::Result<()> {
//! let mut day1 = DatasetImage::builder("events");
//! let pt = day1.column("pt", "u64", 8);
//! day1.cluster(2, vec![vec![0u8; 16]])?;
//! let mut day2 = DatasetImage::builder("events");
//! day2.column("pt", "u64", 8);
//! day2.cluster(1, vec![vec![0u8; 8]])?;
//!
//! let sources: Vec<Box<dyn PageSource>> = vec![
//!     Box::new(MemSource::new(day1.finish(), ReadOptions::default())),
//!     Box::new(MemSource::new(day2.finish(), ReadOptions::default())),
//! ];
//! let mut chain = SourceChain::new("events", SourceSet::Owned(sources), ReadOptions::default())?;
//! chain.attach()?;
//!
//! // Entry 2 lives in the second dataset; the page comes back windowed
//! // into the chain's global element numbering.
//! let page = chain.populate_page_at(pt, 2)?;
//! assert_eq!(page.global_range_first(), 2);
//! chain.release_page(page)?;
//! # Ok(())
//! # }
//! ```
//!
//! Layering:
//!
//! - `pagechain-result`: the unified [`Error`]/[`Result`] pair.
//! - `pagechain-storage`: descriptors, pages, and the single-dataset
//!   sources ([`MemSource`], [`FileSource`]).
//! - this crate: [`SourceChain`], the composition layer.

pub mod chain;

pub use chain::{SourceChain, SourceSet};
pub use pagechain_result::{Error, Result};
pub use pagechain_storage::{
    ClusterId, ClusterIndex, ClusterInfo, ColumnId, DatasetDescriptor, DatasetImage,
    DatasetImageBuilder, DescriptorBuilder, ElementIndex, EntryIndex, FieldId, FileSource,
    MemSource, Page, PageSource, ReadOptions,
};
