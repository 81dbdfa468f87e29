//! The hash-cons term store (`spec.md` §4.1): a process-wide interning
//! table for symbols, types, variables, and term nodes. Every constructor
//! goes through [`HashconsStore`] — direct allocation of a [`TermRecord`]
//! outside it would violate the physical-sharing invariant the rest of the
//! crate relies on (`spec.md` §5, "Shared resources").

use rustc_hash::FxHashMap;

use crate::core::IStr;
use crate::error::{CoreError, CoreResult};
use crate::term::ids::{TermId, TypeId, VarId};
use crate::term::node::{TermNode, TermRecord};
use crate::term::symbol::{Symbol, SymStore};
use crate::term::ty::{Type, TypeStore};
use crate::term::var::{Variable, VarStore};

/// Observability counters for the hash-cons table (`spec.md` §4.1
/// "Statistics").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashconsStats {
    pub table_size: usize,
    pub collisions: u64,
    pub peak: usize,
}

/// The term store. Owns interning tables for every hash-consed kind named
/// by `spec.md` §3: symbols, types, variables, and terms themselves.
#[derive(Debug, Default, Clone)]
pub struct HashconsStore {
    pub types: TypeStore,
    pub syms: SymStore,
    pub vars: VarStore,
    terms: Vec<TermRecord>,
    table: FxHashMap<TermNode, TermId>,
    named_counter: u64,
    stats: HashconsStats,
}

impl HashconsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> HashconsStats {
        HashconsStats {
            table_size: self.table.len(),
            ..self.stats
        }
    }

    // ------------------------------------------------------------------
    // Core interning
    // ------------------------------------------------------------------

    /// Intern a term node with a known result type. Returns the existing
    /// [`TermId`] if an equal node is already present (`spec.md` §4.1
    /// contract: "returns an existing record... or a freshly allocated
    /// one").
    fn intern(&mut self, node: TermNode, ty: TypeId) -> TermId {
        if let Some(id) = self.table.get(&node) {
            self.stats.collisions += 1;
            return *id;
        }
        let id = TermId::from_index(self.terms.len());
        self.terms.push(TermRecord {
            node: node.clone(),
            ty,
            tag: id,
        });
        self.table.insert(node, id);
        self.stats.peak = self.stats.peak.max(self.terms.len());
        id
    }

    pub fn record(&self, id: TermId) -> &TermRecord {
        &self.terms[id.index()]
    }

    pub fn type_of(&self, id: TermId) -> TypeId {
        self.record(id).ty
    }

    pub fn node_of(&self, id: TermId) -> &TermNode {
        &self.record(id).node
    }

    /// Children of an `App` node; empty for every other node shape.
    pub fn node_args_of(&self, id: TermId) -> &[TermId] {
        match self.node_of(id) {
            TermNode::App(_, args) => args,
            _ => &[],
        }
    }

    pub fn is_numeral(&self, id: TermId) -> bool {
        match self.node_of(id) {
            TermNode::Sym(sid) => self.syms.get(*sid).is_literal(),
            _ => false,
        }
    }

    /// Flatten top-level binders: returns `(binder_count, body)`. Non-binder
    /// terms return `(0, id)`.
    pub fn destruct(&self, id: TermId) -> (usize, TermId) {
        match self.node_of(id) {
            TermNode::Let(bindings, body) => (bindings.len(), *body),
            TermNode::Forall(bindings, body) | TermNode::Exists(bindings, body) => {
                (bindings.len(), *body)
            }
            _ => (0, id),
        }
    }

    // ------------------------------------------------------------------
    // Leaf constructors
    // ------------------------------------------------------------------

    pub fn mk_bool(&mut self, b: bool) -> TermId {
        let sym = self.syms.intern(if b { Symbol::True } else { Symbol::False });
        let ty = self.types.intern(Type::Bool);
        self.intern(TermNode::Sym(sym), ty)
    }

    pub fn mk_int(&mut self, v: i64) -> TermId {
        let sym = self.syms.intern(Symbol::IntLit(v));
        let ty = self.types.intern(Type::Int);
        self.intern(TermNode::Sym(sym), ty)
    }

    pub fn mk_real(&mut self, num: i64, den: i64) -> TermId {
        let sym = self.syms.intern(Symbol::RealLit(num, den));
        let ty = self.types.intern(Type::Real);
        self.intern(TermNode::Sym(sym), ty)
    }

    pub fn mk_bv(&mut self, width: u32, value: u64) -> TermId {
        let sym = self.syms.intern(Symbol::BvLit { width, value });
        let ty = self.types.intern(Type::Bv(width));
        self.intern(TermNode::Sym(sym), ty)
    }

    pub fn mk_var(&mut self, var: Variable, ty: TypeId) -> TermId {
        let vid = self.vars.intern(var);
        self.intern(TermNode::Var(vid), ty)
    }

    pub fn mk_uf(&mut self, name: impl Into<IStr>, args: Vec<TermId>, ret: TypeId) -> TermId {
        let sym = self.syms.intern(Symbol::UfRef(name.into()));
        self.intern(TermNode::App(sym, args), ret)
    }

    // ------------------------------------------------------------------
    // Typed applied-symbol construction
    // ------------------------------------------------------------------

    /// Build `sym(args)`, type-checking the operands against the symbol's
    /// signature. This is the one path every operator constructor below
    /// funnels through, satisfying `spec.md` §4.1: "Type-checking of
    /// operands is performed at construction; malformed applications fail
    /// with `TypeError`."
    pub fn mk_app(&mut self, sym: Symbol, args: Vec<TermId>) -> CoreResult<TermId> {
        if let Some(arity) = sym.fixed_arity() {
            if arity != args.len() {
                return Err(CoreError::type_mismatch(format!(
                    "{sym:?} expects {arity} argument(s), got {}",
                    args.len()
                )));
            }
        }
        let arg_types: Vec<TypeId> = args.iter().map(|a| self.type_of(*a)).collect();
        let result_ty = self.check_app(&sym, &arg_types)?;
        let sid = self.syms.intern(sym);
        Ok(self.intern(TermNode::App(sid, args), result_ty))
    }

    fn check_app(&mut self, sym: &Symbol, arg_types: &[TypeId]) -> CoreResult<TypeId> {
        let bool_ty = self.types.intern(Type::Bool);
        let int_ty = self.types.intern(Type::Int);
        let real_ty = self.types.intern(Type::Real);

        let expect = |expected: TypeId, actual: TypeId, what: &str| -> CoreResult<()> {
            if expected == actual {
                Ok(())
            } else {
                Err(CoreError::type_mismatch(format!(
                    "expected {what} to have type {expected:?}, got {actual:?}"
                )))
            }
        };

        use Symbol::*;
        match sym {
            And | Or => {
                for t in arg_types {
                    expect(bool_ty, *t, "operand")?;
                }
                Ok(bool_ty)
            }
            Not | Implies | Xor => {
                for t in arg_types {
                    expect(bool_ty, *t, "operand")?;
                }
                Ok(bool_ty)
            }
            Eq | Distinct => {
                if let [first, rest @ ..] = arg_types {
                    for t in rest {
                        expect(*first, *t, "operand")?;
                    }
                }
                Ok(bool_ty)
            }
            Lt | Le | Gt | Ge => {
                let [a, b] = [arg_types[0], arg_types[1]];
                if !self.types.get(a).is_numeric() || a != b {
                    return Err(CoreError::type_mismatch(
                        "comparison requires two operands of the same numeric type",
                    ));
                }
                Ok(bool_ty)
            }
            Add | Sub | Mul | Div | IntDiv | Mod => {
                let [a, b] = [arg_types[0], arg_types[1]];
                if !self.types.get(a).is_numeric() || a != b {
                    return Err(CoreError::type_mismatch(
                        "arithmetic requires two operands of the same numeric type",
                    ));
                }
                Ok(a)
            }
            Neg => {
                if !self.types.get(arg_types[0]).is_numeric() {
                    return Err(CoreError::type_mismatch("negation requires a numeric operand"));
                }
                Ok(arg_types[0])
            }
            BvAdd | BvSub | BvMul | BvAnd | BvOr | BvXor | BvShl | BvLshr | BvAshr => {
                let [a, b] = [arg_types[0], arg_types[1]];
                if a != b || !matches!(self.types.get(a), Type::Bv(_) | Type::Ubv(_)) {
                    return Err(CoreError::type_mismatch("bit-vector op requires matching widths"));
                }
                Ok(a)
            }
            BvNeg | BvNot => {
                if !matches!(self.types.get(arg_types[0]), Type::Bv(_) | Type::Ubv(_)) {
                    return Err(CoreError::type_mismatch("bit-vector op requires a bit-vector operand"));
                }
                Ok(arg_types[0])
            }
            BvUlt | BvUle | BvUgt | BvUge | BvSlt | BvSle | BvSgt | BvSge => {
                let [a, b] = [arg_types[0], arg_types[1]];
                if a != b {
                    return Err(CoreError::type_mismatch("bit-vector comparison requires matching widths"));
                }
                Ok(bool_ty)
            }
            BvConcat => {
                let (wa, wb) = match (self.types.get(arg_types[0]), self.types.get(arg_types[1])) {
                    (Type::Bv(a), Type::Bv(b)) => (*a, *b),
                    _ => return Err(CoreError::type_mismatch("concat requires bit-vector operands")),
                };
                Ok(self.types.intern(Type::Bv(wa + wb)))
            }
            BvExtract { hi, lo } => {
                let w = match self.types.get(arg_types[0]) {
                    Type::Bv(w) => *w,
                    _ => return Err(CoreError::type_mismatch("extract requires a bit-vector operand")),
                };
                if lo > hi || *hi >= w {
                    return Err(CoreError::type_mismatch("extract range out of bounds"));
                }
                Ok(self.types.intern(Type::Bv(hi - lo + 1)))
            }
            BvSignExtend(n) | BvZeroExtend(n) => {
                let w = match self.types.get(arg_types[0]) {
                    Type::Bv(w) => *w,
                    _ => return Err(CoreError::type_mismatch("extend requires a bit-vector operand")),
                };
                Ok(self.types.intern(Type::Bv(w + n)))
            }
            Select => {
                let (index_ty, elem_ty) = match self.types.get(arg_types[0]) {
                    Type::Array(i, e) => (*i, *e),
                    _ => return Err(CoreError::type_mismatch("select requires an array operand")),
                };
                expect(index_ty, arg_types[1], "select index")?;
                Ok(elem_ty)
            }
            Store => {
                let (index_ty, elem_ty) = match self.types.get(arg_types[0]) {
                    Type::Array(i, e) => (*i, *e),
                    _ => return Err(CoreError::type_mismatch("store requires an array operand")),
                };
                expect(index_ty, arg_types[1], "store index")?;
                expect(elem_ty, arg_types[2], "store value")?;
                Ok(arg_types[0])
            }
            Ite => {
                expect(bool_ty, arg_types[0], "ite condition")?;
                expect(arg_types[1], arg_types[2], "ite branches")?;
                Ok(arg_types[1])
            }
            UfRef(_) => Ok(int_ty), // return type is supplied by the caller via `mk_uf`
            True | False | IntLit(_) | RealLit(..) | BvLit { .. } | Named(_) | InterpGroup(_) => {
                let _ = real_ty;
                Err(CoreError::type_mismatch("literal symbols are not applied"))
            }
        }
    }

    // ------------------------------------------------------------------
    // Negation (`spec.md` §4.1)
    // ------------------------------------------------------------------

    /// `negate(negate(t)) = t` when the inner is a negation: cancels a
    /// double `not` without introducing one, otherwise wraps in `not`.
    pub fn negate(&mut self, t: TermId) -> CoreResult<TermId> {
        if let TermNode::App(sid, args) = self.node_of(t).clone() {
            if matches!(self.syms.get(sid), Symbol::Not) {
                return Ok(args[0]);
            }
        }
        self.mk_app(Symbol::Not, vec![t])
    }

    /// Like [`negate`](Self::negate), but also cancels through boolean
    /// constants and flips arithmetic/bit-vector comparisons instead of
    /// wrapping them in `not` (`spec.md` §4.1).
    pub fn negate_simplify(&mut self, t: TermId) -> CoreResult<TermId> {
        match self.node_of(t).clone() {
            TermNode::Sym(sid) => match self.syms.get(sid) {
                Symbol::True => Ok(self.mk_bool(false)),
                Symbol::False => Ok(self.mk_bool(true)),
                _ => self.mk_app(Symbol::Not, vec![t]),
            },
            TermNode::App(sid, args) => {
                let sym = self.syms.get(sid).clone();
                if let Symbol::Not = sym {
                    return Ok(args[0]);
                }
                if let Some(flipped) = sym.flip_comparison() {
                    return self.mk_app(flipped, args);
                }
                self.mk_app(Symbol::Not, vec![t])
            }
            _ => self.mk_app(Symbol::Not, vec![t]),
        }
    }

    // ------------------------------------------------------------------
    // Named tagging (`spec.md` §4.1)
    // ------------------------------------------------------------------

    /// Tags `t` with a fresh integer in the reserved "t" namespace and
    /// returns `(k, t')`.
    pub fn mk_named(&mut self, t: TermId) -> (u64, TermId) {
        let k = self.named_counter;
        self.named_counter += 1;
        let ty = self.type_of(t);
        let id = self.intern(TermNode::Named(k, t), ty);
        (k, id)
    }

    /// Like [`mk_named`](Self::mk_named), but with a caller-supplied key.
    /// Rejects keys inside the namespace `mk_named` itself mints from.
    pub fn mk_named_unsafe(&mut self, t: TermId, k: u64) -> CoreResult<TermId> {
        if k < self.named_counter {
            return Err(CoreError::type_mismatch(
                "mk_named_unsafe: key falls in the reserved 't' namespace",
            ));
        }
        let ty = self.type_of(t);
        Ok(self.intern(TermNode::Named(k, t), ty))
    }

    // ------------------------------------------------------------------
    // Binders
    // ------------------------------------------------------------------

    pub fn mk_forall(&mut self, bindings: Vec<(VarId, TypeId)>, body: TermId) -> TermId {
        let ty = self.type_of(body);
        self.intern(TermNode::Forall(bindings, body), ty)
    }

    pub fn mk_exists(&mut self, bindings: Vec<(VarId, TypeId)>, body: TermId) -> TermId {
        let ty = self.type_of(body);
        self.intern(TermNode::Exists(bindings, body), ty)
    }

    pub fn mk_let(&mut self, bindings: Vec<(VarId, TermId)>, body: TermId) -> TermId {
        let ty = self.type_of(body);
        self.intern(TermNode::Let(bindings, body), ty)
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Bottom-up, right-to-left fold. Bindings introduced by a `Let` are
    /// folded alongside the body rather than substituted first (lazy
    /// let-unfolding, `spec.md` §4.1): the caller's `f` sees the `Let` node
    /// itself and decides what to do with the bound values.
    pub fn eval_t<R: Clone>(&self, t: TermId, f: &mut impl FnMut(&TermNode, &[R]) -> R) -> R {
        let node = self.node_of(t).clone();
        let child_results: Vec<R> = match &node {
            TermNode::App(_, args) => args.iter().rev().map(|a| self.eval_t(*a, f)).collect(),
            TermNode::Let(bindings, body) => {
                let mut results: Vec<R> = bindings
                    .iter()
                    .rev()
                    .map(|(_, e)| self.eval_t(*e, f))
                    .collect();
                results.push(self.eval_t(*body, f));
                results
            }
            TermNode::Forall(_, body) | TermNode::Exists(_, body) => vec![self.eval_t(*body, f)],
            TermNode::Named(_, inner) => vec![self.eval_t(*inner, f)],
            TermNode::Sym(_) | TermNode::Var(_) => Vec::new(),
        };
        f(&node, &child_results)
    }

    /// Rebuild a term bottom-up, letting `f` replace each node. `f` receives
    /// the current binder depth so de-Bruijn-indexed substitutions can be
    /// shifted correctly when crossing a binder (`spec.md` §4.1 `map`).
    pub fn map(
        &mut self,
        t: TermId,
        depth: u32,
        f: &mut impl FnMut(&mut Self, TermId, u32) -> TermId,
    ) -> TermId {
        let node = self.node_of(t).clone();
        let ty = self.type_of(t);
        let rebuilt = match node {
            TermNode::Sym(_) | TermNode::Var(_) => t,
            TermNode::App(sid, args) => {
                let sym = self.syms.get(sid).clone();
                let new_args: Vec<TermId> =
                    args.into_iter().map(|a| self.map(a, depth, f)).collect();
                let sid2 = self.syms.intern(sym);
                self.intern(TermNode::App(sid2, new_args), ty)
            }
            TermNode::Let(bindings, body) => {
                let n = bindings.len() as u32;
                let new_bindings: Vec<(VarId, TermId)> = bindings
                    .into_iter()
                    .map(|(v, e)| (v, self.map(e, depth, f)))
                    .collect();
                let new_body = self.map(body, depth + n, f);
                self.intern(TermNode::Let(new_bindings, new_body), ty)
            }
            TermNode::Forall(bindings, body) => {
                let n = bindings.len() as u32;
                let new_body = self.map(body, depth + n, f);
                self.intern(TermNode::Forall(bindings, new_body), ty)
            }
            TermNode::Exists(bindings, body) => {
                let n = bindings.len() as u32;
                let new_body = self.map(body, depth + n, f);
                self.intern(TermNode::Exists(bindings, new_body), ty)
            }
            TermNode::Named(k, inner) => {
                let new_inner = self.map(inner, depth, f);
                self.intern(TermNode::Named(k, new_inner), ty)
            }
        };
        f(self, rebuilt, depth)
    }

    /// Copy a term from a disjoint store into `self`, preserving structure
    /// (`spec.md` §4.1 `import`).
    pub fn import(&mut self, other: &HashconsStore, t: TermId) -> TermId {
        let ty = self.import_type(other, other.type_of(t));
        match other.node_of(t).clone() {
            TermNode::Sym(sid) => {
                let sym = other.syms.get(sid).clone();
                let local = self.syms.intern(sym);
                self.intern(TermNode::Sym(local), ty)
            }
            TermNode::Var(vid) => {
                let var = self.import_var(other, other.vars.get(vid).clone());
                let local = self.vars.intern(var);
                self.intern(TermNode::Var(local), ty)
            }
            TermNode::App(sid, args) => {
                let sym = other.syms.get(sid).clone();
                let local_sym = self.syms.intern(sym);
                let local_args: Vec<TermId> =
                    args.into_iter().map(|a| self.import(other, a)).collect();
                self.intern(TermNode::App(local_sym, local_args), ty)
            }
            TermNode::Let(bindings, body) => {
                let new_bindings: Vec<(VarId, TermId)> = bindings
                    .into_iter()
                    .map(|(v, e)| {
                        let var = self.import_var(other, other.vars.get(v).clone());
                        (self.vars.intern(var), self.import(other, e))
                    })
                    .collect();
                let new_body = self.import(other, body);
                self.intern(TermNode::Let(new_bindings, new_body), ty)
            }
            TermNode::Forall(bindings, body) => {
                let new_bindings = self.import_typed_bindings(other, bindings);
                let new_body = self.import(other, body);
                self.intern(TermNode::Forall(new_bindings, new_body), ty)
            }
            TermNode::Exists(bindings, body) => {
                let new_bindings = self.import_typed_bindings(other, bindings);
                let new_body = self.import(other, body);
                self.intern(TermNode::Exists(new_bindings, new_body), ty)
            }
            TermNode::Named(k, inner) => {
                let new_inner = self.import(other, inner);
                self.intern(TermNode::Named(k, new_inner), ty)
            }
        }
    }

    fn import_type(&mut self, other: &HashconsStore, id: TypeId) -> TypeId {
        match other.types.get(id).clone() {
            Type::Array(i, e) => {
                let i2 = self.import_type(other, i);
                let e2 = self.import_type(other, e);
                self.types.intern(Type::Array(i2, e2))
            }
            owned => self.types.intern(owned),
        }
    }

    fn import_var(&mut self, other: &HashconsStore, var: Variable) -> Variable {
        match var {
            Variable::Free { name, ty } => Variable::Free {
                name,
                ty: self.import_type(other, ty),
            },
            Variable::Bound { index, ty } => Variable::Bound {
                index,
                ty: self.import_type(other, ty),
            },
            same @ (Variable::StateVarInstance { .. } | Variable::ConstStateVar { .. }) => same,
        }
    }

    fn import_typed_bindings(
        &mut self,
        other: &HashconsStore,
        bindings: Vec<(VarId, TypeId)>,
    ) -> Vec<(VarId, TypeId)> {
        bindings
            .into_iter()
            .map(|(v, ty)| {
                let var = self.import_var(other, other.vars.get(v).clone());
                (self.vars.intern(var), self.import_type(other, ty))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashcons_soundness_equal_terms_are_pointer_equal() {
        let mut store = HashconsStore::new();
        let a1 = store.mk_int(1);
        let a2 = store.mk_int(2);
        let sum1 = store.mk_app(Symbol::Add, vec![a1, a2]).unwrap();

        let mut store2 = HashconsStore::new();
        // independent sequence of constructors building the same term
        let b2 = store2.mk_int(2);
        let b1 = store2.mk_int(1);
        let sum2 = store2.mk_app(Symbol::Add, vec![b1, b2]).unwrap();

        // Import into a common store and check the tags coincide.
        let mut common = HashconsStore::new();
        let imported1 = common.import(&store, sum1);
        let imported2 = common.import(&store2, sum2);
        assert_eq!(imported1, imported2);
    }

    #[test]
    fn hashcons_dedupes_within_one_store() {
        let mut store = HashconsStore::new();
        let a = store.mk_int(1);
        let b = store.mk_int(2);
        let t1 = store.mk_app(Symbol::Add, vec![a, b]).unwrap();
        let t2 = store.mk_app(Symbol::Add, vec![a, b]).unwrap();
        assert_eq!(t1, t2);
    }

    #[test]
    fn negation_idempotence() {
        let mut store = HashconsStore::new();
        let b = store.mk_bool(true);
        let not_b = store.negate(b).unwrap();
        let not_not_b = store.negate(not_b).unwrap();
        assert_eq!(not_not_b, b);
    }

    #[test]
    fn negate_simplify_cancels_boolean_constants() {
        let mut store = HashconsStore::new();
        let t = store.mk_bool(true);
        let not_t = store.negate_simplify(t).unwrap();
        let f = store.mk_bool(false);
        assert_eq!(not_t, f);
    }

    #[test]
    fn negate_simplify_flips_comparisons() {
        let mut store = HashconsStore::new();
        let a = store.mk_int(1);
        let b = store.mk_int(2);
        let lt = store.mk_app(Symbol::Lt, vec![a, b]).unwrap();
        let flipped = store.negate_simplify(lt).unwrap();
        let expected = store.mk_app(Symbol::Ge, vec![a, b]).unwrap();
        assert_eq!(flipped, expected);
    }

    #[test]
    fn mismatched_operand_types_are_rejected() {
        let mut store = HashconsStore::new();
        let n = store.mk_int(1);
        let b = store.mk_bool(true);
        let err = store.mk_app(Symbol::Add, vec![n, b]);
        assert!(err.is_err());
    }

    #[test]
    fn mk_named_then_unsafe_with_reserved_key_fails() {
        let mut store = HashconsStore::new();
        let t = store.mk_bool(true);
        let (k, _named) = store.mk_named(t);
        assert!(store.mk_named_unsafe(t, k).is_err());
        assert!(store.mk_named_unsafe(t, k + 1).is_ok());
    }

    #[test]
    fn select_after_store_type_checks() {
        let mut store = HashconsStore::new();
        let int_ty = store.types.intern(Type::Int);
        let arr_ty = store.types.intern(Type::Array(int_ty, int_ty));
        let arr = store.mk_var(
            Variable::Free {
                name: IStr::from("a"),
                ty: arr_ty,
            },
            arr_ty,
        );
        let idx = store.mk_int(0);
        let val = store.mk_int(42);
        let stored = store.mk_app(Symbol::Store, vec![arr, idx, val]).unwrap();
        let selected = store.mk_app(Symbol::Select, vec![stored, idx]).unwrap();
        assert_eq!(store.type_of(selected), int_ty);
    }
}
