//! The term layer (`spec.md` §3, §4.1): hash-consed symbols, types,
//! variables, and term nodes, plus the [`store::HashconsStore`] that
//! interns them.
//!
//! Dependency order within this module: `ids` → `symbol`/`ty`/`var` → `node`
//! → `store`.

pub mod ids;
pub mod node;
pub mod pretty;
pub mod store;
pub mod symbol;
pub mod ty;
pub mod var;

pub use ids::{StateVarId, SymId, TermId, TypeId, VarId};
pub use node::{TermNode, TermRecord};
pub use store::{HashconsStats, HashconsStore};
pub use symbol::{SymStore, Symbol};
pub use ty::{Type, TypeStore};
pub use var::{VarStore, Variable};
