//! [`StateVariable`] and its arena (`spec.md` §3 "State Variable"): a named,
//! typed entity created at most once per `(name, scope)` identity.

use std::collections::HashMap;

use crate::term::ids::{StateVarId, TypeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateVariable {
    pub name: String,
    pub scope: Vec<String>,
    pub ty: TypeId,
    pub is_input: bool,
    pub is_const: bool,
    pub for_inv_gen: bool,
}

/// Where a state variable's value comes from, recorded per-node in the
/// source maps (`spec.md` §3 "Node Record").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateVarSource {
    Input,
    Output,
    Local,
    Oracle,
    Call,
    Ghost,
    Generated,
}

#[derive(Debug, Default, Clone)]
pub struct StateVarArena {
    arena: Vec<StateVariable>,
    by_identity: HashMap<(String, Vec<String>), StateVarId>,
}

impl StateVarArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing state variable for `(name, scope)` if one was
    /// already created this compilation, otherwise allocates a fresh one
    /// (`spec.md` §3 invariant: "Created at most once per identity").
    pub fn get_or_create(
        &mut self,
        name: impl Into<String>,
        scope: Vec<String>,
        ty: TypeId,
        is_input: bool,
        is_const: bool,
        for_inv_gen: bool,
    ) -> StateVarId {
        let name = name.into();
        let key = (name.clone(), scope.clone());
        if let Some(id) = self.by_identity.get(&key) {
            return *id;
        }
        let id = StateVarId::from_index(self.arena.len());
        self.arena.push(StateVariable {
            name,
            scope,
            ty,
            is_input,
            is_const,
            for_inv_gen,
        });
        self.by_identity.insert(key, id);
        id
    }

    pub fn get(&self, id: StateVarId) -> &StateVariable {
        &self.arena[id.index()]
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_identity_returns_the_same_state_variable() {
        let mut arena = StateVarArena::new();
        let ty = TypeId::from_index(0);
        let a = arena.get_or_create("z", vec!["F".into()], ty, false, false, false);
        let b = arena.get_or_create("z", vec!["F".into()], ty, false, false, false);
        let c = arena.get_or_create("z", vec!["G".into()], ty, false, false, false);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
