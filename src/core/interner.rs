//! The interned-string handle shared by every compilation stage.
//!
//! Identifiers (node names, variable names, type names) are cloned
//! constantly as they flow through `CompilerState`, `IdentifierMap`, and
//! the term store's own name-bearing symbols. `Rc<str>` makes every clone
//! a refcount bump instead of an allocation, and two `IStr`s built from
//! the same text still compare equal by content (`Rc<str>`'s `PartialEq`
//! compares the pointee), which is all identifier comparison in this
//! crate needs — no separate dedup table is threaded through.
use std::rc::Rc;

/// An interned string handle: cheap to clone, compares by content.
pub type IStr = Rc<str>;
