//! [`TermNode`] and [`TermRecord`]: the lambda-tree shape named by
//! `spec.md` §3. Leaves are symbols or variables; internal nodes carry an
//! applied symbol and an ordered list of child [`TermId`]s, or a binder.

use crate::term::ids::{SymId, TermId, TypeId, VarId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermNode {
    /// A literal/constant symbol leaf (`true`, `false`, `3`, a bitvector
    /// literal, ...).
    Sym(SymId),
    /// A variable leaf.
    Var(VarId),
    /// An applied symbol with its ordered children.
    App(SymId, Vec<TermId>),
    /// `let (v1 = e1, ...) in body`.
    Let(Vec<(VarId, TermId)>, TermId),
    Forall(Vec<(VarId, TypeId)>, TermId),
    Exists(Vec<(VarId, TypeId)>, TermId),
    /// `mk_named` tagging: `(k, t')`, `k` a fresh integer in the "t"
    /// namespace (`spec.md` §4.1).
    Named(u64, TermId),
}

/// One entry in the hash-cons arena. `tag` is this record's own [`TermId`],
/// stored so a `TermRecord` can answer "what is my id" without a reverse
/// lookup; it never changes once assigned.
#[derive(Debug, Clone)]
pub struct TermRecord {
    pub node: TermNode,
    pub ty: TypeId,
    pub tag: TermId,
}
