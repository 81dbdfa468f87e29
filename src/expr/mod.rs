//! The expression layer (`spec.md` §4.3): a typed view on terms carrying the
//! source language's `(init, step)` time model.

use crate::error::{CoreError, CoreResult};
use crate::term::ids::{TermId, TypeId};
use crate::term::node::TermNode;
use crate::term::store::HashconsStore;
use crate::term::symbol::Symbol;
use crate::term::ty::Type;
use crate::term::var::Variable;

/// A pair of terms — the value at the initial instant and the value at
/// every instant thereafter — sharing one declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expression {
    pub init: TermId,
    pub step: TermId,
    pub ty: TypeId,
}

impl Expression {
    /// Lift a time-invariant term: both components are the same term.
    pub fn constant(store: &HashconsStore, term: TermId) -> Self {
        Expression {
            init: term,
            step: term,
            ty: store.type_of(term),
        }
    }
}

fn array_depth(store: &HashconsStore, ty: TypeId) -> u32 {
    match store.types.get(ty) {
        Type::Array(_, elem) => 1 + array_depth(store, *elem),
        _ => 0,
    }
}

fn elem_type(store: &HashconsStore, ty: TypeId) -> CoreResult<TypeId> {
    match store.types.get(ty) {
        Type::Array(_, elem) => Ok(*elem),
        _ => Err(CoreError::type_mismatch("expected an array type")),
    }
}

/// Insert `select(term, 0)` enough times to bring `term`'s array depth down
/// to `target_depth` — the *array coalescing* rule (`spec.md` §4.3). The
/// zero index is a simplification: a fully general implementation would
/// reuse the surrounding equation's array-index variable, which this layer
/// does not have visibility into.
fn coalesce_to_depth(
    store: &mut HashconsStore,
    mut term: TermId,
    mut ty: TypeId,
    target_depth: u32,
) -> CoreResult<(TermId, TypeId)> {
    while array_depth(store, ty) > target_depth {
        let zero = store.mk_int(0);
        term = store.mk_app(Symbol::Select, vec![term, zero])?;
        ty = elem_type(store, ty)?;
    }
    Ok((term, ty))
}

fn coalesce_pair(
    store: &mut HashconsStore,
    a: TermId,
    a_ty: TypeId,
    b: TermId,
    b_ty: TypeId,
) -> CoreResult<(TermId, TermId, TypeId)> {
    let da = array_depth(store, a_ty);
    let db = array_depth(store, b_ty);
    if da == db {
        return Ok((a, b, a_ty));
    }
    if da > db {
        let (a2, ty2) = coalesce_to_depth(store, a, a_ty, db)?;
        Ok((a2, b, ty2))
    } else {
        let (b2, ty2) = coalesce_to_depth(store, b, b_ty, da)?;
        Ok((a, b2, ty2))
    }
}

/// `mk_arrow(e1, e2) = (e1.init, e2.step)` (`spec.md` §4.3), array-coalesced.
pub fn mk_arrow(store: &mut HashconsStore, e1: Expression, e2: Expression) -> CoreResult<Expression> {
    let (init, _, ty) = coalesce_pair(store, e1.init, e1.ty, e2.step, e2.ty)?;
    let step = if ty == e2.ty {
        e2.step
    } else {
        coalesce_to_depth(store, e2.step, e2.ty, array_depth(store, ty))?.0
    };
    Ok(Expression { init, step, ty })
}

/// Shift every state-variable instance in `t` by `delta` instants. Used by
/// [`mk_pre`] to freeze the step component at the previous instant.
fn shift_term(store: &mut HashconsStore, t: TermId, delta: i64) -> TermId {
    store.map(t, 0, &mut |store, id, _depth| {
        if let TermNode::Var(vid) = *store.node_of(id) {
            if let Variable::StateVarInstance { sv, offset } = *store.vars.get(vid) {
                let ty = store.type_of(id);
                return store.mk_var(Variable::StateVarInstance { sv, offset: offset + delta }, ty);
            }
        }
        id
    })
}

/// `mk_pre(e) = (shift(e.step, -1), shift(e.step, -1))`: freezes the step
/// component one instant back (`spec.md` §4.3). The init component is left
/// for the normalizer's oracle-guarded arrow to make well-defined.
pub fn mk_pre(store: &mut HashconsStore, e: Expression) -> Expression {
    let shifted = shift_term(store, e.step, -1);
    Expression {
        init: shifted,
        step: shifted,
        ty: e.ty,
    }
}

/// `mk_ite(c, a, b)`, array-coalesced between `a` and `b`.
pub fn mk_ite(
    store: &mut HashconsStore,
    cond: Expression,
    a: Expression,
    b: Expression,
) -> CoreResult<Expression> {
    let (a_init, b_init, ty) = coalesce_pair(store, a.init, a.ty, b.init, b.ty)?;
    let (a_step, b_step, _) = coalesce_pair(store, a.step, a.ty, b.step, b.ty)?;
    let init = store.mk_app(Symbol::Ite, vec![cond.init, a_init, b_init])?;
    let step = store.mk_app(Symbol::Ite, vec![cond.step, a_step, b_step])?;
    Ok(Expression { init, step, ty })
}

pub fn mk_select(store: &mut HashconsStore, arr: Expression, index: Expression) -> CoreResult<Expression> {
    let ty = elem_type(store, arr.ty)?;
    let init = store.mk_app(Symbol::Select, vec![arr.init, index.init])?;
    let step = store.mk_app(Symbol::Select, vec![arr.step, index.step])?;
    Ok(Expression { init, step, ty })
}

pub fn mk_store(
    store: &mut HashconsStore,
    arr: Expression,
    index: Expression,
    value: Expression,
) -> CoreResult<Expression> {
    let init = store.mk_app(Symbol::Store, vec![arr.init, index.init, value.init])?;
    let step = store.mk_app(Symbol::Store, vec![arr.step, index.step, value.step])?;
    Ok(Expression { init, step, ty: arr.ty })
}

fn push_select_term(store: &mut HashconsStore, term: TermId, index: TermId) -> CoreResult<TermId> {
    if let TermNode::App(sid, args) = store.node_of(term).clone() {
        match store.syms.get(sid).clone() {
            Symbol::Ite => {
                let a = push_select_term(store, args[1], index)?;
                let b = push_select_term(store, args[2], index)?;
                return store.mk_app(Symbol::Ite, vec![args[0], a, b]);
            }
            Symbol::Store => {
                // select(store(arr, i, v), j): not simplified to an
                // if-then-else on `i = j` here, just re-wrapped — the
                // downstream encoder is equipped to reason about store
                // chains directly.
                return store.mk_app(Symbol::Select, vec![term, index]);
            }
            _ => {}
        }
    }
    store.mk_app(Symbol::Select, vec![term, index])
}

/// `select(e, i)`, pushed to the leaves when `e` is an `ite` chain so
/// downstream encoding sees one array per branch rather than a select over
/// a conditional (`spec.md` §4.3).
pub fn mk_select_and_push(
    store: &mut HashconsStore,
    e: Expression,
    index: Expression,
) -> CoreResult<Expression> {
    let ty = elem_type(store, e.ty)?;
    let init = push_select_term(store, e.init, index.init)?;
    let step = push_select_term(store, e.step, index.step)?;
    Ok(Expression { init, step, ty })
}

macro_rules! binary_numeric_op {
    ($name:ident, $sym:expr) => {
        pub fn $name(store: &mut HashconsStore, a: Expression, b: Expression) -> CoreResult<Expression> {
            let init = store.mk_app($sym, vec![a.init, b.init])?;
            let step = store.mk_app($sym, vec![a.step, b.step])?;
            let ty = store.type_of(init);
            Ok(Expression { init, step, ty })
        }
    };
}

binary_numeric_op!(mk_add, Symbol::Add);
binary_numeric_op!(mk_sub, Symbol::Sub);
binary_numeric_op!(mk_mul, Symbol::Mul);
binary_numeric_op!(mk_div, Symbol::Div);
binary_numeric_op!(mk_and, Symbol::And);
binary_numeric_op!(mk_or, Symbol::Or);
binary_numeric_op!(mk_lt, Symbol::Lt);
binary_numeric_op!(mk_le, Symbol::Le);
binary_numeric_op!(mk_gt, Symbol::Gt);
binary_numeric_op!(mk_ge, Symbol::Ge);
binary_numeric_op!(mk_eq, Symbol::Eq);

pub fn mk_not(store: &mut HashconsStore, a: Expression) -> CoreResult<Expression> {
    let init = store.mk_app(Symbol::Not, vec![a.init])?;
    let step = store.mk_app(Symbol::Not, vec![a.step])?;
    Ok(Expression { init, step, ty: a.ty })
}

pub fn mk_forall(store: &mut HashconsStore, bindings: Vec<(crate::term::ids::VarId, TypeId)>, body: Expression) -> Expression {
    let init = store.mk_forall(bindings.clone(), body.init);
    let step = store.mk_forall(bindings, body.step);
    Expression { init, step, ty: body.ty }
}

pub fn mk_exists(store: &mut HashconsStore, bindings: Vec<(crate::term::ids::VarId, TypeId)>, body: Expression) -> Expression {
    let init = store.mk_exists(bindings.clone(), body.init);
    let step = store.mk_exists(bindings, body.step);
    Expression { init, step, ty: body.ty }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::ids::StateVarId;

    fn int_expr(store: &mut HashconsStore, v: i64) -> Expression {
        let t = store.mk_int(v);
        Expression::constant(store, t)
    }

    #[test]
    fn arrow_takes_init_from_left_and_step_from_right() {
        let mut store = HashconsStore::new();
        let e1 = int_expr(&mut store, 1);
        let e2 = int_expr(&mut store, 2);
        let arrow = mk_arrow(&mut store, e1, e2).unwrap();
        assert_eq!(arrow.init, e1.init);
        assert_eq!(arrow.step, e2.step);
    }

    #[test]
    fn pre_shifts_state_var_instance_offset() {
        let mut store = HashconsStore::new();
        let int_ty = store.types.intern(Type::Int);
        let sv = StateVarId::from_index(0);
        let var = store.mk_var(Variable::StateVarInstance { sv, offset: 0 }, int_ty);
        let e = Expression::constant(&store, var);
        let pre = mk_pre(&mut store, e);
        match store.node_of(pre.step) {
            TermNode::Var(vid) => match store.vars.get(*vid) {
                Variable::StateVarInstance { offset, .. } => assert_eq!(*offset, -1),
                _ => panic!("expected state var instance"),
            },
            _ => panic!("expected var node"),
        }
    }

    #[test]
    fn select_distributes_through_ite() {
        let mut store = HashconsStore::new();
        let int_ty = store.types.intern(Type::Int);
        let arr_ty = store.types.intern(Type::Array(int_ty, int_ty));
        let cond = {
            let b = store.mk_bool(true);
            Expression::constant(&store, b)
        };
        let a_var = store.mk_var(Variable::Free { name: "a".into(), ty: arr_ty }, arr_ty);
        let a_arr = Expression::constant(&store, a_var);
        let b_var = store.mk_var(Variable::Free { name: "b".into(), ty: arr_ty }, arr_ty);
        let b_arr = Expression::constant(&store, b_var);
        let ite = mk_ite(&mut store, cond, a_arr, b_arr).unwrap();
        let idx = int_expr(&mut store, 0);
        let selected = mk_select_and_push(&mut store, ite, idx).unwrap();
        // result should itself be an ite over two selects, not select(ite(..))
        match store.node_of(selected.init) {
            TermNode::App(sid, args) => {
                assert!(matches!(store.syms.get(*sid), Symbol::Ite));
                assert_eq!(args.len(), 3);
            }
            _ => panic!("expected ite at top level"),
        }
    }
}
