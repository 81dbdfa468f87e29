//! The AST normalizer (`spec.md` §4.4): rewrites an input node so that every
//! `pre` argument and every call argument is atomic, guards every
//! previously-unguarded `pre` with a fresh oracle, and lifts node calls out
//! of expression position.

use std::collections::HashMap;

use tracing::trace;

use crate::ast::{BinOp, Expr, LhsItem, Literal, NodeDecl, TypeExpr, TypingContext, UnOp};
use crate::base::Span;
use crate::core::{fresh::FreshKind, IStr, NameCounter};

mod generated;
mod rules;

pub use generated::{CallEntry, ConstraintOrigin, ContractCallInstantiation, GeneratedIdentifiers, OracleSeed};

/// Rewrites one node's equations, asserts, and properties. Holds the
/// process-wide fresh-name counter and a borrow of the typing context; does
/// not own AST or generated-identifier state between nodes (`spec.md` §4.7:
/// normalizer state does not outlive a single node's processing beyond what
/// it returns). `var_types` is rebuilt at the start of every `normalize_node`
/// call from that node's own declared variables, so oracle seeds can recover
/// the type of the expression they stand in for.
pub struct Normalizer<'a> {
    counter: NameCounter,
    ctx: &'a dyn TypingContext,
    var_types: HashMap<IStr, TypeExpr>,
}

impl<'a> Normalizer<'a> {
    pub fn new(counter: NameCounter, ctx: &'a dyn TypingContext) -> Self {
        Self { counter, ctx, var_types: HashMap::new() }
    }

    /// Normalize one node, returning the rewritten declaration plus the
    /// `GeneratedIdentifiers` record accumulated while walking it.
    pub fn normalize_node(&mut self, node: &NodeDecl) -> (NodeDecl, GeneratedIdentifiers) {
        let mut r#gen = GeneratedIdentifiers::default();
        let mut out = node.clone();

        self.var_types = out
            .inputs
            .iter()
            .chain(out.outputs.iter())
            .chain(out.locals.iter())
            .map(|v| (v.name.clone(), v.ty.clone()))
            .collect();

        for eq in out.equations.iter_mut() {
            trace!(node = %node.name, "normalizing equation");
            eq.rhs = self.normalize_expr(&eq.rhs, None, &mut r#gen);
        }

        for (span, expr) in out.asserts.iter_mut() {
            let normalized = self.normalize_expr(expr, None, &mut r#gen);
            let name = self.ensure_ident(normalized, &mut r#gen);
            r#gen.assertions.push((*span, name.clone()));
            *expr = Expr::Ident(name, *span);
        }

        for (prop_name, expr, span) in out.properties.iter_mut() {
            let normalized = self.normalize_expr(expr, None, &mut r#gen);
            let name = self.ensure_ident(normalized, &mut r#gen);
            trace!(node = %node.name, property = %prop_name, target = %name, "property resolved to identifier");
            *expr = Expr::Ident(name, *span);
        }

        self.record_constraints(&out, &mut r#gen);
        self.record_history_and_array_literals(&out, &mut r#gen);

        if let Some(contract) = &out.contract {
            for (i, call) in contract.imports.iter().enumerate() {
                r#gen.contract_call_instantiations.push(ContractCallInstantiation {
                    callee: call.callee.clone(),
                    scope: vec![out.name.to_string(), "import".into(), i.to_string()],
                });
            }
        }

        (out, r#gen)
    }

    /// `spec.md` §4.5 step 9: subrange and refinement-type constraints
    /// declared on a node's own inputs/outputs/locals, tagged with where
    /// they came from so the generator can place the compiled check.
    fn record_constraints(&mut self, out: &NodeDecl, r#gen: &mut GeneratedIdentifiers) {
        let groups = [
            (ConstraintOrigin::Input, &out.inputs),
            (ConstraintOrigin::Output, &out.outputs),
            (ConstraintOrigin::Local, &out.locals),
        ];
        for (origin, vars) in groups {
            for var in vars {
                if let Some((lo, hi)) = self.ctx.is_subrange(&var.ty) {
                    if let Some(expr) = range_check_expr(&var.name, lo, hi) {
                        let name: IStr = self.counter.fresh(FreshKind::Glocal).into();
                        r#gen.subrange_constraints.push((name, expr, origin));
                    }
                }
                if let Some(pred) = self.ctx.is_refinement(&var.ty) {
                    let name: IStr = self.counter.fresh(FreshKind::Glocal).into();
                    r#gen.refinement_constraints.push((name, pred.clone(), origin));
                }
            }
        }
    }

    /// History variables and array-literal locals have no dedicated surface
    /// syntax in this crate's minimal AST (`spec.md` §1.E note), so they're
    /// recognized structurally: a local whose whole defining equation is a
    /// bare or arrow-guarded `pre` is a history variable; a local declared
    /// with an array type whose equation is a `GroupExpr` is an array
    /// literal.
    fn record_history_and_array_literals(&mut self, out: &NodeDecl, r#gen: &mut GeneratedIdentifiers) {
        for eq in &out.equations {
            if eq.lhs.len() != 1 {
                continue;
            }
            let name = match &eq.lhs[0] {
                LhsItem::Ident(n) | LhsItem::ArrayDef(n, _) => n,
            };
            let Some(decl) = out.locals.iter().find(|v| v.name == *name) else {
                continue;
            };
            match &eq.rhs {
                Expr::Pre(_, _) => r#gen.history_vars.push(decl.name.clone()),
                Expr::Arrow(_, rhs, _) if matches!(rhs.as_ref(), Expr::Pre(_, _)) => {
                    r#gen.history_vars.push(decl.name.clone())
                }
                Expr::GroupExpr(_, _) if matches!(decl.ty, TypeExpr::Array(_, _)) => {
                    r#gen.array_literal_vars.push(decl.name.clone())
                }
                _ => {}
            }
        }
    }

    /// `spec.md` §4.4 rule 1: an oracle guarding an unguarded `pre` is "a
    /// fresh unconstrained constant of the same type" as the `pre`'d
    /// expression; infers that type from this node's own declarations.
    pub(crate) fn infer_scalar_type(&self, e: &Expr) -> TypeExpr {
        match e {
            Expr::Ident(name, _) => self.var_types.get(name).cloned().unwrap_or(TypeExpr::Int),
            Expr::Const(Literal::Bool(_), _) => TypeExpr::Bool,
            Expr::Const(Literal::Int(_), _) => TypeExpr::Int,
            Expr::Const(Literal::Real(_, _), _) => TypeExpr::Real,
            Expr::Pre(inner, _) => self.infer_scalar_type(inner),
            Expr::UnOp(UnOp::Not, _, _) => TypeExpr::Bool,
            Expr::UnOp(UnOp::Neg, inner, _) => self.infer_scalar_type(inner),
            Expr::BinOp(op, a, _, _) => match op {
                BinOp::And | BinOp::Or | BinOp::Xor | BinOp::Implies | BinOp::Eq | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                    TypeExpr::Bool
                }
                _ => self.infer_scalar_type(a),
            },
            Expr::Ite(_, a, _, _) => self.infer_scalar_type(a),
            Expr::Arrow(_, b, _) => self.infer_scalar_type(b),
            _ => TypeExpr::Int,
        }
    }

    /// If `e` is already an identifier, returns its name; otherwise lifts it
    /// to a fresh local and returns that local's name (`spec.md` §4.4 rules
    /// 1–2 generalized to every "must be atomic" site).
    fn ensure_ident(&mut self, e: Expr, r#gen: &mut GeneratedIdentifiers) -> IStr {
        if let Expr::Ident(name, _) = &e {
            return name.clone();
        }
        let name: IStr = self.counter.fresh(FreshKind::Glocal).into();
        trace!(local = %name, "lifted non-atomic expression to fresh local");
        r#gen.locals.push((name.clone(), e));
        name
    }

    fn fresh_oracle(&mut self) -> IStr {
        self.counter.fresh(FreshKind::Oracle).into()
    }

    fn fresh_call_outputs(&mut self, n: usize) -> Vec<IStr> {
        (0..n).map(|_| self.counter.fresh(FreshKind::Call).into()).collect()
    }

    fn normalize_expr(&mut self, e: &Expr, guard: Option<&Expr>, r#gen: &mut GeneratedIdentifiers) -> Expr {
        rules::normalize_expr(self, e, guard, r#gen)
    }

    pub(crate) fn ctx(&self) -> &dyn TypingContext {
        self.ctx
    }
}

/// `spec.md` §8 "Normalizer guarantees": every `Pre` occurs either inside an
/// `Arrow`'s right child or inside a top-level `Arrow(oracle, Pre _)`, and
/// every `Call` argument is an `Ident` or `Const`. Used by tests and by
/// callers who want to assert the postcondition independently of trusting
/// the implementation.
pub fn check_normalizer_guarantees(e: &Expr) -> bool {
    check_pre_guarded(e, false) && check_calls_atomic(e)
}

fn check_pre_guarded(e: &Expr, under_arrow_rhs: bool) -> bool {
    match e {
        Expr::Pre(_, _) => under_arrow_rhs,
        Expr::Arrow(a, b, _) => {
            let b_ok = match b.as_ref() {
                Expr::Pre(_, _) => true,
                other => check_pre_guarded(other, true),
            };
            check_pre_guarded(a, false) && b_ok
        }
        Expr::Ite(c, a, b, _) => check_pre_guarded(c, under_arrow_rhs) && check_pre_guarded(a, under_arrow_rhs) && check_pre_guarded(b, under_arrow_rhs),
        Expr::UnOp(_, a, _) => check_pre_guarded(a, under_arrow_rhs),
        Expr::BinOp(_, a, b, _) => check_pre_guarded(a, under_arrow_rhs) && check_pre_guarded(b, under_arrow_rhs),
        Expr::Call(_, args, _) => args.iter().all(|a| check_pre_guarded(a, under_arrow_rhs)),
        Expr::Condact(act, _, args, defaults, _) => {
            check_pre_guarded(act, under_arrow_rhs)
                && args.iter().all(|a| check_pre_guarded(a, under_arrow_rhs))
                && defaults.iter().flatten().all(|a| check_pre_guarded(a, under_arrow_rhs))
        }
        Expr::RestartEvery(_, args, cond, _) => {
            args.iter().all(|a| check_pre_guarded(a, under_arrow_rhs)) && check_pre_guarded(cond, under_arrow_rhs)
        }
        Expr::GroupExpr(es, _) => es.iter().all(|x| check_pre_guarded(x, under_arrow_rhs)),
        Expr::RecordExpr(_, fields, _) => fields.iter().all(|(_, x)| check_pre_guarded(x, under_arrow_rhs)),
        Expr::Select(a, b, _) => check_pre_guarded(a, under_arrow_rhs) && check_pre_guarded(b, under_arrow_rhs),
        Expr::Field(a, _, _) => check_pre_guarded(a, under_arrow_rhs),
        Expr::Ident(..) | Expr::Const(..) => true,
    }
}

fn check_calls_atomic(e: &Expr) -> bool {
    match e {
        Expr::Call(_, args, _) => args.iter().all(|a| a.is_atomic() && check_calls_atomic(a)),
        Expr::Condact(act, _, args, defaults, _) => {
            args.iter().all(|a| a.is_atomic())
                && defaults.iter().flatten().all(|a| a.is_atomic())
                && check_calls_atomic(act)
        }
        Expr::RestartEvery(_, args, cond, _) => args.iter().all(|a| a.is_atomic()) && check_calls_atomic(cond),
        Expr::Arrow(a, b, _) => check_calls_atomic(a) && check_calls_atomic(b),
        Expr::Ite(c, a, b, _) => check_calls_atomic(c) && check_calls_atomic(a) && check_calls_atomic(b),
        Expr::Pre(a, _) => check_calls_atomic(a),
        Expr::UnOp(_, a, _) => check_calls_atomic(a),
        Expr::BinOp(_, a, b, _) => check_calls_atomic(a) && check_calls_atomic(b),
        Expr::GroupExpr(es, _) => es.iter().all(check_calls_atomic),
        Expr::RecordExpr(_, fields, _) => fields.iter().all(|(_, x)| check_calls_atomic(x)),
        Expr::Select(a, b, _) => check_calls_atomic(a) && check_calls_atomic(b),
        Expr::Field(a, _, _) => check_calls_atomic(a),
        Expr::Ident(..) | Expr::Const(..) => true,
    }
}

pub(crate) fn dummy_span() -> Span {
    use crate::base::Position;
    Span::new(Position::new(0, 0), Position::new(0, 0))
}

/// Builds `lo <= name && name <= hi`, dropping whichever bound is absent;
/// `None` if neither bound is present (nothing to check).
fn range_check_expr(name: &IStr, lo: Option<i64>, hi: Option<i64>) -> Option<Expr> {
    let span = dummy_span();
    let ident = Expr::Ident(name.clone(), span);
    let lo_expr = lo.map(|l| Expr::BinOp(BinOp::Ge, Box::new(ident.clone()), Box::new(Expr::Const(Literal::Int(l), span)), span));
    let hi_expr = hi.map(|h| Expr::BinOp(BinOp::Le, Box::new(ident.clone()), Box::new(Expr::Const(Literal::Int(h), span)), span));
    match (lo_expr, hi_expr) {
        (Some(a), Some(b)) => Some(Expr::BinOp(BinOp::And, Box::new(a), Box::new(b), span)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::typing::StaticTypingContext;
    use crate::ast::{BinOp, LhsItem, NodeDecl, TypeExpr, VarDecl};

    fn ident(name: &str) -> Expr {
        Expr::Ident(name.into(), dummy_span())
    }

    fn node_with_rhs(rhs: Expr) -> NodeDecl {
        NodeDecl {
            name: "F".into(),
            is_function: false,
            is_extern: false,
            is_main: false,
            type_params: vec![],
            inputs: vec![VarDecl { name: "y".into(), ty: TypeExpr::Int, span: dummy_span() }],
            outputs: vec![VarDecl { name: "z".into(), ty: TypeExpr::Int, span: dummy_span() }],
            locals: vec![],
            equations: vec![crate::ast::Equation {
                lhs: vec![LhsItem::Ident("z".into())],
                rhs,
                span: dummy_span(),
            }],
            asserts: vec![],
            properties: vec![],
            contract: None,
        }
    }

    #[test]
    fn unguarded_pre_is_wrapped_in_an_oracle_arrow() {
        let ctx = StaticTypingContext::default();
        let node = node_with_rhs(Expr::Pre(Box::new(ident("y")), dummy_span()));
        let mut normalizer = Normalizer::new(NameCounter::new(), &ctx);
        let (out, r#gen) = normalizer.normalize_node(&node);

        match &out.equations[0].rhs {
            Expr::Arrow(guard, pre, _) => {
                assert!(matches!(guard.as_ref(), Expr::Ident(..)));
                assert!(matches!(pre.as_ref(), Expr::Pre(..)));
            }
            other => panic!("expected Arrow(oracle, Pre _), got {other:?}"),
        }
        assert_eq!(r#gen.oracles.len(), 1);
        assert!(check_normalizer_guarantees(&out.equations[0].rhs));
    }

    #[test]
    fn guarded_pre_is_left_bare() {
        let ctx = StaticTypingContext::default();
        let rhs = Expr::Arrow(
            Box::new(Expr::Const(crate::ast::Literal::Int(0), dummy_span())),
            Box::new(Expr::Pre(Box::new(ident("y")), dummy_span())),
            dummy_span(),
        );
        let node = node_with_rhs(rhs);
        let mut normalizer = Normalizer::new(NameCounter::new(), &ctx);
        let (out, r#gen) = normalizer.normalize_node(&node);
        assert!(r#gen.oracles.is_empty());
        assert!(check_normalizer_guarantees(&out.equations[0].rhs));
    }

    #[test]
    fn non_atomic_call_argument_is_lifted() {
        let ctx = StaticTypingContext::default();
        let arg = Expr::BinOp(BinOp::Add, Box::new(ident("y")), Box::new(Expr::Const(crate::ast::Literal::Int(1), dummy_span())), dummy_span());
        let node = node_with_rhs(Expr::Call("Q".into(), vec![arg], dummy_span()));
        let mut normalizer = Normalizer::new(NameCounter::new(), &ctx);
        let (out, r#gen) = normalizer.normalize_node(&node);

        assert!(check_normalizer_guarantees(&out.equations[0].rhs));
        assert_eq!(r#gen.calls.len(), 1);
        assert_eq!(r#gen.calls[0].callee.as_ref(), "Q");
        assert_eq!(r#gen.locals.len(), 1, "the +1 argument should be lifted to a local");
    }

    #[test]
    fn unary_call_becomes_an_identifier() {
        let ctx = StaticTypingContext::default();
        let node = node_with_rhs(Expr::Call("Q".into(), vec![ident("y")], dummy_span()));
        let mut normalizer = Normalizer::new(NameCounter::new(), &ctx);
        let (out, r#gen) = normalizer.normalize_node(&node);
        assert!(matches!(out.equations[0].rhs, Expr::Ident(..)));
        assert_eq!(r#gen.calls[0].outputs.len(), 1);
    }
}
