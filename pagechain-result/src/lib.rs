//! Error and result definitions shared by all pagechain crates.
//!
//! Every fallible operation across the workspace returns [`Result<T>`] with
//! the single [`Error`] enum as its failure type. A unified enum keeps error
//! handling uniform across crate boundaries and lets callers match on
//! specific variants: an out-of-range read is a caller mistake, a decode
//! failure is a bad file, an untracked page release is chain misuse. The
//! variants are deliberately structured so those cases stay distinguishable
//! at the outermost call site.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
