//! JSON Pointer (RFC 6901) utilities.
//!
//! Implements the subset of RFC 6901 that the deployment-set algebra
//! needs: segment escaping, pointer parsing, and resolution of a
//! pointer to either the referenced value or its parent container.

use thiserror::Error;

mod extract;
mod util;

pub use extract::{extract, extract_parent};
pub use util::{escape_segment, to_path, unescape_segment};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("invalid json-pointer syntax")]
    InvalidPointer,
    #[error("value does not exist")]
    DoesNotExist,
    #[error("pointer has no parent")]
    NoParent,
}
