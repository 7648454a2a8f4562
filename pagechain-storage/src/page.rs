//! Materialized column pages.
//!
//! A page is one contiguous run of a column's elements, windowed to an
//! element range in the coordinate system of whoever returned it: a single
//! source hands out pages in its own local numbering, and a chain rewrites
//! the window into global numbering before passing the page on. The backing
//! buffer is allocated fresh per population, so its address uniquely
//! identifies the page for as long as the page is live; release routing is
//! keyed on that identity.

use crate::types::{ClusterId, ColumnId, ElementIndex};
use arrow::buffer::Buffer;

/// Which cluster a page's elements belong to, and where that cluster's
/// column run starts, in the same coordinate system as the page window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClusterInfo {
    pub id: ClusterId,
    pub first_element_index: ElementIndex,
}

/// A materialized run of one column's values.
///
/// Pages move by value and are returned to their source through
/// `release_page`, which consumes them; handing the same page back twice is
/// therefore a compile error rather than a runtime hazard.
#[derive(Debug)]
pub struct Page {
    column_id: ColumnId,
    buffer: Buffer,
    element_size: usize,
    global_range_first: ElementIndex,
    cluster: ClusterInfo,
}

impl Page {
    pub fn new(
        column_id: ColumnId,
        buffer: Buffer,
        element_size: usize,
        global_range_first: ElementIndex,
        cluster: ClusterInfo,
    ) -> Self {
        Self {
            column_id,
            buffer,
            element_size,
            global_range_first,
            cluster,
        }
    }

    /// A page with no elements. Releasing one is a no-op everywhere.
    pub fn empty(column_id: ColumnId) -> Self {
        Self {
            column_id,
            buffer: Buffer::from_vec(Vec::<u8>::new()),
            element_size: 1,
            global_range_first: 0,
            cluster: ClusterInfo {
                id: 0,
                first_element_index: 0,
            },
        }
    }

    pub fn column_id(&self) -> ColumnId {
        self.column_id
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    pub fn n_elements(&self) -> u64 {
        (self.buffer.len() / self.element_size) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Address of the backing buffer; the page's identity for release
    /// routing. Only meaningful for non-empty pages: empty buffers share a
    /// dangling address and are never tracked.
    pub fn buffer_id(&self) -> usize {
        self.buffer.as_ptr() as usize
    }

    /// First element index covered by this page.
    pub fn global_range_first(&self) -> ElementIndex {
        self.global_range_first
    }

    /// Last element index covered by this page, or `None` for empty pages.
    pub fn global_range_last(&self) -> Option<ElementIndex> {
        let n = self.n_elements();
        (n > 0).then(|| self.global_range_first + n - 1)
    }

    pub fn cluster(&self) -> ClusterInfo {
        self.cluster
    }

    /// Whether `element` falls inside this page's window.
    pub fn contains(&self, element: ElementIndex) -> bool {
        element >= self.global_range_first
            && element < self.global_range_first + self.n_elements()
    }

    /// Rewrite the window and cluster attribution, leaving the payload
    /// untouched. Used when re-expressing a source-local page in the global
    /// numbering of a chain.
    pub fn set_window(&mut self, global_range_first: ElementIndex, cluster: ClusterInfo) {
        self.global_range_first = global_range_first;
        self.cluster = cluster;
    }
}
