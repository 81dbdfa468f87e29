//! [`IdentifierMap`]: the per-node compilation state named by `spec.md`
//! §4.7 — created empty at the start of a node's compilation, populated as
//! declarations are walked, discarded at node end.

use std::collections::HashMap;

use crate::index_trie::Trie;
use crate::term::ids::StateVarId;

use super::state_var::StateVarSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub lo: i64,
    pub hi: i64,
}

#[derive(Debug, Default, Clone)]
pub struct IdentifierMap {
    pub svars: HashMap<String, Trie<StateVarId>>,
    /// Transient scope used only during equation LHS compilation, cleared
    /// between equations (`spec.md` §4.7).
    pub array_index: HashMap<String, StateVarId>,
    pub bounds: HashMap<StateVarId, Vec<Bound>>,
    pub sources: HashMap<StateVarId, StateVarSource>,
}

impl IdentifierMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, trie: Trie<StateVarId>, source: StateVarSource) {
        let name = name.into();
        for (_, sv) in trie.bindings() {
            self.sources.insert(*sv, source);
        }
        self.svars.insert(name, trie);
    }

    pub fn clear_array_index(&mut self) {
        self.array_index.clear();
    }
}
