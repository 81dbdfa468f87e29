//! The typed index trie (`spec.md` §4.2): the universal container for "one
//! variable or expression per scalar leaf of a structured value".

mod tag;
mod trie;

pub use tag::IndexTag;
pub use trie::{Path, Trie};
