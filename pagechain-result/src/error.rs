use std::io;
use thiserror::Error;

/// Unified error type for all pagechain operations.
///
/// Schema disagreement between chained datasets is intentionally NOT an
/// error: it degrades the chain and is reported through its degraded-mode
/// flag instead, so that close-enough files remain readable. Everything that
/// does surface here is unrecoverable at the layer that raised it.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O failure while reading a dataset from its location.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stored dataset image failed to decode or failed attach-time
    /// validation (inconsistent cluster ranges, truncated page payloads,
    /// or a dataset name that does not match the requested one).
    #[error("corrupt dataset: {0}")]
    Corrupt(String),

    /// A requested coordinate exceeds the valid range of its dimension.
    ///
    /// `what` names the dimension ("entry", "cluster", "column", ...);
    /// `len` is the number of valid indices, so the valid range is
    /// `0..len`. Raised for reads past the end of a chain as well as for
    /// column ids outside the schema of the first chained dataset.
    #[error("{what} index {index} out of range ({len} valid)")]
    IndexOutOfRange {
        what: &'static str,
        index: u64,
        len: u64,
    },

    /// A released page's buffer identity is not tracked by the source or
    /// chain it was handed back to. Either the page was already released
    /// or it belongs to someone else; both are caller bugs, and silently
    /// accepting the page would corrupt another source's accounting.
    #[error("released page is not tracked by this source")]
    UnknownPage,

    /// A chain was constructed over an empty source list.
    #[error("a source chain requires at least one source")]
    EmptyChain,

    /// Metadata was queried or a page requested before `attach()`.
    #[error("source is not attached")]
    NotAttached,

    /// Invalid argument passed to a construction API.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Violated internal invariant; indicates a bug in pagechain itself.
    #[error("internal error: {0}")]
    Internal(String),
}
