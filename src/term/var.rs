//! [`Variable`]: the hash-consed variable model named by `spec.md` §3.
//!
//! A variable is one of four things: a free variable identified by name, a
//! de-Bruijn-indexed bound variable (used under `forall`/`exists`/`let`), an
//! instance of a state variable at some integer time offset (`sv@k`), or a
//! reference to a state variable that never varies (a constant).

use crate::core::IStr;
use crate::term::ids::{StateVarId, TypeId, VarId};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Variable {
    Free { name: IStr, ty: TypeId },
    Bound { index: u32, ty: TypeId },
    /// A state variable sampled at a given integer offset relative to the
    /// current instant (`0` = current, negative = `pre`-shifted).
    StateVarInstance { sv: StateVarId, offset: i64 },
    ConstStateVar { sv: StateVarId },
}

impl Variable {
    pub fn ty(&self, types_of_state_var: impl FnOnce(StateVarId) -> TypeId) -> TypeId {
        match *self {
            Variable::Free { ty, .. } => ty,
            Variable::Bound { ty, .. } => ty,
            Variable::StateVarInstance { sv, .. } => types_of_state_var(sv),
            Variable::ConstStateVar { sv } => types_of_state_var(sv),
        }
    }

    pub fn state_var(&self) -> Option<StateVarId> {
        match *self {
            Variable::StateVarInstance { sv, .. } | Variable::ConstStateVar { sv } => Some(sv),
            _ => None,
        }
    }
}

/// Interning table for [`Variable`] values.
#[derive(Debug, Default, Clone)]
pub struct VarStore {
    arena: Vec<Variable>,
    table: rustc_hash::FxHashMap<Variable, VarId>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, var: Variable) -> VarId {
        if let Some(id) = self.table.get(&var) {
            return *id;
        }
        let id = VarId::from_index(self.arena.len());
        self.arena.push(var.clone());
        self.table.insert(var, id);
        id
    }

    pub fn get(&self, id: VarId) -> &Variable {
        &self.arena[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_state_var_offset_interns_once() {
        let mut store = VarStore::new();
        let sv = StateVarId::from_index(0);
        let a = store.intern(Variable::StateVarInstance { sv, offset: -1 });
        let b = store.intern(Variable::StateVarInstance { sv, offset: -1 });
        let c = store.intern(Variable::StateVarInstance { sv, offset: 0 });
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
