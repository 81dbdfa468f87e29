//! The structural rewrite rules themselves (`spec.md` §4.4 rules 1–3),
//! separated from [`super::Normalizer`]'s bookkeeping for readability.

use tracing::trace;

use crate::ast::expr::Expr;
use crate::normalize::{CallEntry, GeneratedIdentifiers, Normalizer, OracleSeed};

pub(super) fn normalize_expr(
    normalizer: &mut Normalizer<'_>,
    e: &Expr,
    guard: Option<&Expr>,
    r#gen: &mut GeneratedIdentifiers,
) -> Expr {
    match e {
        Expr::Arrow(a, b, span) => {
            let a2 = normalize_expr(normalizer, a, guard, r#gen);
            let b2 = normalize_expr(normalizer, b, Some(&a2), r#gen);
            Expr::Arrow(Box::new(a2), Box::new(b2), *span)
        }

        Expr::Pre(inner, span) => {
            let normalized_inner = normalize_expr(normalizer, inner, guard, r#gen);
            let atomized = if normalized_inner.is_atomic() {
                normalized_inner
            } else {
                let name = normalizer.ensure_ident(normalized_inner, r#gen);
                Expr::Ident(name, *span)
            };
            let pre = Expr::Pre(Box::new(atomized.clone()), *span);
            if guard.is_some() {
                trace!("pre already inside an arrow guard, left bare");
                pre
            } else {
                let oracle_name = normalizer.fresh_oracle();
                let oracle_ty = normalizer.infer_scalar_type(&atomized);
                trace!(oracle = %oracle_name, ty = ?oracle_ty, "unguarded pre wrapped in fresh-oracle arrow");
                r#gen.oracles.push((oracle_name.clone(), OracleSeed::Fresh(oracle_ty)));
                Expr::Arrow(Box::new(Expr::Ident(oracle_name, *span)), Box::new(pre), *span)
            }
        }

        Expr::Ite(c, a, b, span) => {
            let c2 = normalize_expr(normalizer, c, guard, r#gen);
            let a2 = normalize_expr(normalizer, a, guard, r#gen);
            let b2 = normalize_expr(normalizer, b, guard, r#gen);
            Expr::Ite(Box::new(c2), Box::new(a2), Box::new(b2), *span)
        }

        Expr::UnOp(op, a, span) => {
            let a2 = normalize_expr(normalizer, a, guard, r#gen);
            Expr::UnOp(*op, Box::new(a2), *span)
        }

        Expr::BinOp(op, a, b, span) => {
            let a2 = normalize_expr(normalizer, a, guard, r#gen);
            let b2 = normalize_expr(normalizer, b, guard, r#gen);
            Expr::BinOp(*op, Box::new(a2), Box::new(b2), *span)
        }

        Expr::GroupExpr(es, span) => {
            let es2 = es.iter().map(|x| normalize_expr(normalizer, x, guard, r#gen)).collect();
            Expr::GroupExpr(es2, *span)
        }

        Expr::RecordExpr(ty, fields, span) => {
            let fields2 = fields
                .iter()
                .map(|(name, x)| (name.clone(), normalize_expr(normalizer, x, guard, r#gen)))
                .collect();
            Expr::RecordExpr(ty.clone(), fields2, *span)
        }

        Expr::Select(a, b, span) => {
            let a2 = normalize_expr(normalizer, a, guard, r#gen);
            let b2 = normalize_expr(normalizer, b, guard, r#gen);
            Expr::Select(Box::new(a2), Box::new(b2), *span)
        }

        Expr::Field(a, name, span) => {
            let a2 = normalize_expr(normalizer, a, guard, r#gen);
            Expr::Field(Box::new(a2), name.clone(), *span)
        }

        Expr::Call(callee, args, span) => {
            let lifted_args = lift_call_args(normalizer, args, guard, r#gen);
            let num_outputs = normalizer
                .ctx()
                .node_signature(callee)
                .map(|(_, outs)| outs.len())
                .unwrap_or(1);
            let outputs = normalizer.fresh_call_outputs(num_outputs);
            r#gen.calls.push(CallEntry {
                outputs: outputs.clone(),
                activation: None,
                restart: None,
                callee: callee.clone(),
                args: lifted_args,
                defaults: None,
            });
            as_call_result(&outputs, *span)
        }

        Expr::Condact(activate, callee, args, defaults, span) => {
            let act2 = normalize_expr(normalizer, activate, guard, r#gen);
            let act_name = normalizer.ensure_ident(act2, r#gen);
            let lifted_args = lift_call_args(normalizer, args, guard, r#gen);
            let lifted_defaults = defaults
                .as_ref()
                .map(|ds| lift_call_args(normalizer, ds, guard, r#gen));
            let num_outputs = normalizer
                .ctx()
                .node_signature(callee)
                .map(|(_, outs)| outs.len())
                .unwrap_or(1);
            let outputs = normalizer.fresh_call_outputs(num_outputs);
            r#gen.calls.push(CallEntry {
                outputs: outputs.clone(),
                activation: Some(act_name),
                restart: None,
                callee: callee.clone(),
                args: lifted_args,
                defaults: lifted_defaults,
            });
            as_call_result(&outputs, *span)
        }

        Expr::RestartEvery(callee, args, restart, span) => {
            let restart2 = normalize_expr(normalizer, restart, guard, r#gen);
            let restart_name = normalizer.ensure_ident(restart2, r#gen);
            let lifted_args = lift_call_args(normalizer, args, guard, r#gen);
            let num_outputs = normalizer
                .ctx()
                .node_signature(callee)
                .map(|(_, outs)| outs.len())
                .unwrap_or(1);
            let outputs = normalizer.fresh_call_outputs(num_outputs);
            r#gen.calls.push(CallEntry {
                outputs: outputs.clone(),
                activation: None,
                restart: Some(restart_name),
                callee: callee.clone(),
                args: lifted_args,
                defaults: None,
            });
            as_call_result(&outputs, *span)
        }

        Expr::Ident(..) | Expr::Const(..) => e.clone(),
    }
}

fn as_call_result(outputs: &[crate::core::IStr], span: crate::base::Span) -> Expr {
    if outputs.len() == 1 {
        Expr::Ident(outputs[0].clone(), span)
    } else {
        Expr::GroupExpr(outputs.iter().map(|o| Expr::Ident(o.clone(), span)).collect(), span)
    }
}

/// `spec.md` §4.4 rule 2: every non-atomic call argument becomes a fresh
/// local.
fn lift_call_args(
    normalizer: &mut Normalizer<'_>,
    args: &[Expr],
    guard: Option<&Expr>,
    r#gen: &mut GeneratedIdentifiers,
) -> Vec<Expr> {
    args.iter()
        .map(|a| {
            let normalized = normalize_expr(normalizer, a, guard, r#gen);
            if normalized.is_atomic() {
                normalized
            } else {
                let span = normalized.span();
                let name = normalizer.ensure_ident(normalized, r#gen);
                Expr::Ident(name, span)
            }
        })
        .collect()
}
