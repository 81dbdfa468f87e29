//! Opaque arena indices used across the term model.
//!
//! Every handle here is a dense `u32` index into a `Vec`-backed arena owned
//! by a [`super::store::HashconsStore`] (for [`TermId`], [`TypeId`],
//! [`SymId`], [`VarId`]) or by a node's compiled state-variable arena (for
//! [`StateVarId`], defined here because [`super::var::Variable`] refers to
//! it). None of these types dereference; callers always go back through the
//! owning arena.

use std::fmt;

macro_rules! arena_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}

arena_id!(TermId, "Handle into the hash-consed term arena. Structural equality of two terms implies `TermId` equality and vice versa.");
arena_id!(TypeId, "Handle into the hash-consed type arena.");
arena_id!(SymId, "Handle into the hash-consed symbol arena.");
arena_id!(VarId, "Handle into the hash-consed variable arena.");
arena_id!(
    StateVarId,
    "Handle into a compilation's state-variable arena (owned by `nodegen::CompilerState`)."
);
