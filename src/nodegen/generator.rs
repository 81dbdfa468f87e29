//! [`NodeGenerator`]: lowers one normalized [`NodeDecl`] plus its
//! [`GeneratedIdentifiers`] into a [`NodeRecord`] (`spec.md` §4.5, the ten
//! numbered compilation steps).

use std::collections::HashMap;

use crate::ast::expr::{BinOp, Expr, Literal, UnOp};
use crate::ast::{ContractDecl, NodeDecl, TypeExpr, TypingContext, VarDecl};
use crate::base::Span;
use crate::core::IStr;
use crate::error::{CoreError, CoreResult};
use crate::expr::{self, Expression};
use crate::index_trie::{IndexTag, Trie};
use crate::normalize::{CallEntry, ConstraintOrigin, ContractCallInstantiation, GeneratedIdentifiers, OracleSeed};
use crate::term::ids::{StateVarId, TypeId};
use crate::term::store::HashconsStore;
use crate::term::symbol::Symbol;
use crate::term::ty::Type;
use crate::term::var::Variable;

use super::compiler_state::CompilerState;
use super::identifier_map::IdentifierMap;
use super::node_record::{
    CallRecord, Contract, ContractSvar, ContractSvarKind, EquationRecord, Mode, NodeRecord,
    NodeRecordFlags, Opacity, PropertyKind,
};
use super::state_var::{StateVarArena, StateVarSource};
use super::types::compile_type;

fn dummy_span() -> Span {
    use crate::base::Position;
    Span::new(Position::new(0, 0), Position::new(0, 0))
}

/// Drives the compilation of one node at a time. Owns the state-variable
/// arena so identity holds across every node compiled in the same run
/// (`spec.md` §3, `StateVariable` "created at most once per identity").
pub struct NodeGenerator<'a> {
    store: &'a mut HashconsStore,
    ctx: &'a dyn TypingContext,
    pub svars: StateVarArena,
    next_call_id: u64,
}

impl<'a> NodeGenerator<'a> {
    pub fn new(store: &'a mut HashconsStore, ctx: &'a dyn TypingContext) -> Self {
        Self {
            store,
            ctx,
            svars: StateVarArena::new(),
            next_call_id: 1,
        }
    }

    /// `spec.md` §4.5: the node generator's ten-step pipeline.
    pub fn compile_node(
        &mut self,
        state: &mut CompilerState,
        node: &NodeDecl,
        r#gen: &GeneratedIdentifiers,
    ) -> CoreResult<NodeRecord> {
        let node_scope = vec![node.name.to_string()];
        let reserved_scope = {
            let mut s = node_scope.clone();
            s.push("reserved".into());
            s
        };
        let bool_ty = self.store.types.intern(Type::Bool);

        let mut idmap = IdentifierMap::new();
        let mut equations: Vec<EquationRecord> = Vec::new();

        let instance = self.svars.get_or_create("instance", node_scope.clone(), bool_ty, false, true, false);
        let init_flag = self.svars.get_or_create("init_flag", node_scope.clone(), bool_ty, false, false, false);

        // Step 1: bind this node's own polymorphic type parameters (from an
        // already-known instantiation at its call site, falling back to an
        // abstract type when none is known yet) plus any parameters a
        // contract import needs instantiated in the importer's type-alias
        // map, before anything below resolves a single `TypeExpr`.
        let mut type_aliases = state.type_aliases.clone();
        let instantiated_args = self.ctx.node_type_args(node.name.as_ref());
        for (i, param) in node.type_params.iter().enumerate() {
            if let Some(arg) = instantiated_args.get(i) {
                type_aliases.insert(param.clone(), arg.clone());
            }
        }
        if let Some(contract) = &node.contract {
            for call in &contract.imports {
                let params = self.ctx.contract_type_params(call.callee.as_ref());
                for (i, param) in params.iter().enumerate() {
                    if let Some(arg) = call.type_args.get(i) {
                        type_aliases.insert(param.clone(), arg.clone());
                    }
                }
            }
        }
        let mut type_args = Vec::new();
        for param in &node.type_params {
            let trie = compile_type(self.store, &type_aliases, &TypeExpr::Named(param.clone()))?;
            if let Some(&ty_id) = trie.find(&[]) {
                type_args.push(ty_id);
            }
        }

        // Step 2-3: inputs/outputs/locals, each compiled into a scalar trie.
        let inputs_trie = self.compile_vars(&mut idmap, &type_aliases, &node_scope, &node.inputs, StateVarSource::Input, true)?;
        let outputs_trie = self.compile_vars(&mut idmap, &type_aliases, &node_scope, &node.outputs, StateVarSource::Output, false)?;
        let locals_trie = self.compile_vars(&mut idmap, &type_aliases, &node_scope, &node.locals, StateVarSource::Local, false)?;

        // Step 3 continued: node-argument locals and history variables the
        // normalizer recorded, grouped by compiled type for `NodeRecord`.
        let mut history_svars_by_type: HashMap<TypeId, Vec<StateVarId>> = HashMap::new();
        for name in &r#gen.history_vars {
            if let Some(&sv) = idmap.svars.get(name.as_ref()).and_then(|t| t.find(&[])) {
                let ty = self.svars.get(sv).ty;
                history_svars_by_type.entry(ty).or_default().push(sv);
            }
        }

        // Step 4: generated locals (lifted non-atomic subexpressions).
        // Locals whose compiled type turns out to be a subrange are a
        // *derived* constraint (`spec.md` §4.5 step 9 last clause): the
        // source never declared this bound, so it becomes a candidate
        // invariant rather than an assumption/guarantee.
        let mut candidate_properties = Vec::new();
        for (name, local_expr) in &r#gen.locals {
            let compiled = self.compile_scalar_expr(local_expr, &idmap, state, &node.name)?;
            let sv = self.svars.get_or_create(name.to_string(), reserved_scope.clone(), compiled.ty, false, false, false);
            idmap.bind(name.to_string(), Trie::singleton(vec![], sv), StateVarSource::Generated);
            equations.push(EquationRecord { sv, bounds: vec![], rhs: compiled });

            if let Type::IntRange(lo, hi) = self.store.types.get(compiled.ty).clone() {
                if let Some(check_sv) = self.build_range_check(sv, lo, hi, &reserved_scope, name.as_ref(), &mut equations)? {
                    candidate_properties.push((check_sv, format!("{name}_range"), dummy_span(), PropertyKind::Candidate));
                }
            }
        }

        // Step 4 continued: subrange and refinement constraint locals
        // (`spec.md` §4.5 step 9): inputs become assumptions, outputs become
        // guarantees, locals become plain invariant properties.
        let mut input_constraint_svars = Vec::new();
        let mut output_constraint_svars = Vec::new();
        let mut local_constraint_svars = Vec::new();
        for (name, constraint_expr, origin) in r#gen.subrange_constraints.iter().chain(r#gen.refinement_constraints.iter()) {
            let compiled = self.compile_scalar_expr(constraint_expr, &idmap, state, &node.name)?;
            let sv = self.svars.get_or_create(name.to_string(), reserved_scope.clone(), compiled.ty, false, false, false);
            idmap.bind(name.to_string(), Trie::singleton(vec![], sv), StateVarSource::Generated);
            equations.push(EquationRecord { sv, bounds: vec![], rhs: compiled });
            match origin {
                ConstraintOrigin::Input => input_constraint_svars.push(name.clone()),
                ConstraintOrigin::Output => output_constraint_svars.push(name.clone()),
                ConstraintOrigin::Local => local_constraint_svars.push((name.clone(), sv)),
            }
        }

        // Step 5: oracles.
        let mut oracles = Vec::new();
        let mut oracle_closes_over = HashMap::new();
        for (name, seed) in &r#gen.oracles {
            let ty = match seed {
                OracleSeed::Fresh(type_expr) => {
                    let trie = compile_type(self.store, &type_aliases, type_expr)?;
                    *trie.find(&[]).unwrap_or(&bool_ty)
                }
                OracleSeed::ClosesOver(closed) => idmap
                    .svars
                    .get(closed.as_ref())
                    .and_then(|t| t.find(&[]))
                    .map(|sv| self.svars.get(*sv).ty)
                    .unwrap_or(bool_ty),
            };
            let sv = self.svars.get_or_create(name.to_string(), reserved_scope.clone(), ty, false, true, false);
            idmap.bind(name.to_string(), Trie::singleton(vec![], sv), StateVarSource::Oracle);
            if let OracleSeed::ClosesOver(closed) = seed {
                if let Some(&closed_sv) = idmap.svars.get(closed.as_ref()).and_then(|t| t.find(&[])) {
                    oracle_closes_over.insert(sv, closed_sv);
                }
            }
            oracles.push(sv);
        }

        // Step 6: calls.
        let calls = self.compile_calls(&r#gen.calls, &mut idmap, state, &reserved_scope, &node.name, &mut equations)?;

        // Step 7: equations, expanded shape-checked (`expand_tuple`).
        for eq in &node.equations {
            self.compile_equation(&mut idmap, state, eq, &node.name, &mut equations)?;
            idmap.clear_array_index();
        }

        // Step 8: contract (assumes/guarantees/modes/sofar), plus any
        // subrange/refinement constraints on inputs/outputs folded in as
        // extra assumes/guarantees, and any parametric contract imports
        // spliced in from their own already-compiled `Contract`.
        let mut assumption_svars = Vec::new();
        let needs_contract = node.contract.is_some() || !input_constraint_svars.is_empty() || !output_constraint_svars.is_empty();
        let contract = if needs_contract {
            let default_decl = ContractDecl::default();
            let decl = node.contract.as_ref().unwrap_or(&default_decl);
            let extra_assumes: Vec<(Option<IStr>, Expr)> =
                input_constraint_svars.iter().map(|name| (None, Expr::Ident(name.clone(), dummy_span()))).collect();
            let extra_guarantees: Vec<(Option<IStr>, Expr, bool)> = output_constraint_svars
                .iter()
                .map(|name| (None, Expr::Ident(name.clone(), dummy_span()), false))
                .collect();
            let c = self.compile_contract(
                &mut idmap,
                state,
                &node_scope,
                decl,
                &r#gen.contract_call_instantiations,
                &extra_assumes,
                &extra_guarantees,
                &node.name,
                &mut equations,
            )?;
            assumption_svars = c.assumes.iter().map(|a| a.sv).collect();
            Some(c)
        } else {
            None
        };

        // Asserts and properties resolve to the already-atomized identifier
        // the normalizer left behind.
        let mut asserts = Vec::new();
        for (span, assert_expr) in &node.asserts {
            let sv = self.resolve_to_sv(assert_expr, &idmap, state, &node.name)?;
            asserts.push((*span, sv));
        }

        let mut properties = Vec::new();
        for (prop_name, prop_expr, span) in &node.properties {
            let sv = self.resolve_to_sv(prop_expr, &idmap, state, &node.name)?;
            properties.push((sv, prop_name.to_string(), *span, PropertyKind::Plain));
        }
        // A property that is also a nonvacuity check takes the Nonvacuity
        // kind instead of appearing twice.
        for (name, nonvacuity_expr) in &r#gen.nonvacuity_properties {
            let sv = self.resolve_to_sv(nonvacuity_expr, &idmap, state, &node.name)?;
            match properties.iter().position(|(_, n, _, _)| n.as_str() == name.as_ref()) {
                Some(i) => {
                    properties[i].0 = sv;
                    properties[i].3 = PropertyKind::Nonvacuity;
                }
                None => properties.push((sv, name.to_string(), dummy_span(), PropertyKind::Nonvacuity)),
            }
        }
        for (name, sv) in local_constraint_svars {
            properties.push((sv, name.to_string(), dummy_span(), PropertyKind::Plain));
        }
        properties.extend(candidate_properties);

        let definitions: HashMap<StateVarId, Expression> = equations.iter().map(|eq| (eq.sv, eq.rhs)).collect();

        Ok(NodeRecord {
            name: node.name.clone(),
            is_extern: node.is_extern,
            opacity: if node.is_extern { Opacity::Opaque } else { Opacity::Transparent },
            type_args,
            instance,
            init_flag,
            inputs: inputs_trie,
            outputs: outputs_trie,
            locals: locals_trie,
            oracles,
            equations,
            calls,
            asserts,
            properties,
            contract,
            flags: NodeRecordFlags { is_main: node.is_main, is_function: node.is_function },
            sources: idmap.sources.clone(),
            oracle_closes_over,
            definitions,
            assumption_svars,
            history_svars_by_type,
        })
    }

    /// A boolean ghost check `lo <= v && v <= hi` for a subrange detected on
    /// an already-compiled generated local (`spec.md` §4.5 step 9, "derived"
    /// case); `None` if the range has no finite bound to check.
    fn build_range_check(
        &mut self,
        sv: StateVarId,
        lo: Option<i64>,
        hi: Option<i64>,
        scope: &[String],
        base_name: &str,
        equations: &mut Vec<EquationRecord>,
    ) -> CoreResult<Option<StateVarId>> {
        if lo.is_none() && hi.is_none() {
            return Ok(None);
        }
        let var = self.var_expr(sv);
        let mut acc: Option<Expression> = None;
        if let Some(lo) = lo {
            let lo_term = self.store.mk_int(lo);
            let lo_expr = Expression::constant(self.store, lo_term);
            let ge = expr::mk_ge(self.store, var, lo_expr)?;
            acc = Some(ge);
        }
        if let Some(hi) = hi {
            let hi_term = self.store.mk_int(hi);
            let hi_expr = Expression::constant(self.store, hi_term);
            let le = expr::mk_le(self.store, var, hi_expr)?;
            acc = Some(match acc {
                Some(a) => expr::mk_and(self.store, a, le)?,
                None => le,
            });
        }
        let check = acc.expect("checked above that lo or hi is Some");
        let mut check_scope = scope.to_vec();
        check_scope.push(format!("{base_name}_range"));
        let check_sv = self.svars.get_or_create(format!("{base_name}_range"), check_scope, check.ty, false, false, false);
        equations.push(EquationRecord { sv: check_sv, bounds: vec![], rhs: check });
        Ok(Some(check_sv))
    }

    fn compile_vars(
        &mut self,
        idmap: &mut IdentifierMap,
        type_aliases: &HashMap<IStr, TypeExpr>,
        node_scope: &[String],
        vars: &[VarDecl],
        source: StateVarSource,
        is_input: bool,
    ) -> CoreResult<Trie<StateVarId>> {
        let mut positional = Trie::empty();
        for (i, decl) in vars.iter().enumerate() {
            let type_trie = compile_type(self.store, type_aliases, &decl.ty)?;
            let mut sv_trie = Trie::empty();
            for (path, &ty) in type_trie.bindings() {
                let mut scope = node_scope.to_vec();
                scope.extend(path.iter().map(IndexTag::scope_segment));
                let sv = self.svars.get_or_create(decl.name.to_string(), scope, ty, is_input, false, false);
                sv_trie = sv_trie.add(path.clone(), sv);
            }
            idmap.bind(decl.name.to_string(), sv_trie.clone(), source);
            for (path, &sv) in sv_trie.bindings() {
                let mut full = vec![IndexTag::TupleIndex(i as u32)];
                full.extend(path.iter().cloned());
                positional = positional.add(full, sv);
            }
        }
        Ok(positional)
    }

    fn compile_calls(
        &mut self,
        calls: &[CallEntry],
        idmap: &mut IdentifierMap,
        state: &CompilerState,
        reserved_scope: &[String],
        node_name: &IStr,
        equations: &mut Vec<EquationRecord>,
    ) -> CoreResult<Vec<CallRecord>> {
        let mut out = Vec::new();
        for call in calls {
            let callee_outputs = state
                .find_node(&call.callee)
                .map(|n| n.outputs.values().into_iter().copied().collect::<Vec<_>>());

            let mut outputs_trie = Trie::empty();
            for (i, out_name) in call.outputs.iter().enumerate() {
                let ty = callee_outputs
                    .as_ref()
                    .and_then(|outs| outs.get(i))
                    .map(|sv| self.svars.get(*sv).ty)
                    .unwrap_or_else(|| self.store.types.intern(Type::Int));
                let sv = self.svars.get_or_create(out_name.to_string(), reserved_scope.to_vec(), ty, false, false, false);
                idmap.bind(out_name.to_string(), Trie::singleton(vec![], sv), StateVarSource::Call);
                outputs_trie = outputs_trie.add(vec![IndexTag::TupleIndex(i as u32)], sv);
            }

            let mut inputs_trie = Trie::empty();
            for (i, arg) in call.args.iter().enumerate() {
                let arg_expr = self.compile_scalar_expr(arg, idmap, state, node_name)?;
                let arg_sv = self.svars.get_or_create(
                    format!("{}_arg{i}", call.callee),
                    reserved_scope.to_vec(),
                    arg_expr.ty,
                    false,
                    false,
                    false,
                );
                equations.push(EquationRecord { sv: arg_sv, bounds: vec![], rhs: arg_expr });
                inputs_trie = inputs_trie.add(vec![IndexTag::TupleIndex(i as u32)], arg_sv);
            }

            let mut conditions = Vec::new();
            if let Some(act) = &call.activation {
                conditions.push(self.resolve_ident_sv(act, idmap, node_name)?);
            }
            if let Some(res) = &call.restart {
                conditions.push(self.resolve_ident_sv(res, idmap, node_name)?);
            }

            let defaults = match &call.defaults {
                Some(exprs) => Some(
                    exprs
                        .iter()
                        .map(|e| self.compile_scalar_expr(e, idmap, state, node_name))
                        .collect::<CoreResult<Vec<_>>>()?,
                ),
                None => None,
            };

            out.push(CallRecord {
                call_id: self.next_call_id,
                position: dummy_span(),
                callee: call.callee.clone(),
                conditions,
                inputs: inputs_trie,
                oracles: vec![],
                outputs: outputs_trie,
                defaults,
                inlined: false,
            });
            self.next_call_id += 1;
        }
        Ok(out)
    }

    fn compile_equation(
        &mut self,
        idmap: &mut IdentifierMap,
        state: &CompilerState,
        eq: &crate::ast::Equation,
        node_name: &IStr,
        equations: &mut Vec<EquationRecord>,
    ) -> CoreResult<()> {
        use crate::ast::LhsItem;

        let lhs_trie: Trie<StateVarId> = if eq.lhs.len() == 1 {
            match &eq.lhs[0] {
                LhsItem::Ident(name) => idmap
                    .svars
                    .get(name.as_ref())
                    .cloned()
                    .ok_or_else(|| CoreError::unbound(name.to_string(), node_name.to_string()))?,
                LhsItem::ArrayDef(name, _loop_var) => idmap
                    .svars
                    .get(name.as_ref())
                    .cloned()
                    .ok_or_else(|| CoreError::unbound(name.to_string(), node_name.to_string()))?,
            }
        } else {
            let mut trie = Trie::empty();
            for (i, item) in eq.lhs.iter().enumerate() {
                let name = match item {
                    LhsItem::Ident(n) | LhsItem::ArrayDef(n, _) => n,
                };
                let sv = *idmap
                    .svars
                    .get(name.as_ref())
                    .and_then(|t| t.find(&[]))
                    .ok_or_else(|| CoreError::unbound(name.to_string(), node_name.to_string()))?;
                trie = trie.add(vec![IndexTag::TupleIndex(i as u32)], sv);
            }
            trie
        };

        let rhs_trie = self.compile_rhs_trie(&eq.rhs, idmap, state, node_name)?;

        let new_equations = lhs_trie.fold2(&rhs_trie, Vec::new(), |mut acc, _path, &sv, &rhs| {
            acc.push(EquationRecord { sv, bounds: vec![], rhs });
            acc
        })?;
        equations.extend(new_equations);
        Ok(())
    }

    fn compile_rhs_trie(
        &mut self,
        e: &Expr,
        idmap: &IdentifierMap,
        state: &CompilerState,
        node_name: &IStr,
    ) -> CoreResult<Trie<Expression>> {
        match e {
            Expr::RecordExpr(_, fields, _) => {
                let mut trie = Trie::empty();
                for (field_name, field_expr) in fields {
                    let sub = self.compile_rhs_trie(field_expr, idmap, state, node_name)?;
                    for (path, &leaf) in sub.bindings() {
                        let mut full = vec![IndexTag::RecordIndex(field_name.clone())];
                        full.extend(path.iter().cloned());
                        trie = trie.add(full, leaf);
                    }
                }
                Ok(trie)
            }
            Expr::GroupExpr(items, _) => {
                let mut trie = Trie::empty();
                for (i, item) in items.iter().enumerate() {
                    let sub = self.compile_rhs_trie(item, idmap, state, node_name)?;
                    for (path, &leaf) in sub.bindings() {
                        let mut full = vec![IndexTag::TupleIndex(i as u32)];
                        full.extend(path.iter().cloned());
                        trie = trie.add(full, leaf);
                    }
                }
                Ok(trie)
            }
            Expr::Ident(name, _) if idmap.svars.get(name.as_ref()).map(|t| t.len() > 1).unwrap_or(false) => {
                let sv_trie = idmap.svars[name.as_ref()].clone();
                let mut trie = Trie::empty();
                for (path, &sv) in sv_trie.bindings() {
                    trie = trie.add(path.clone(), self.var_expr(sv));
                }
                Ok(trie)
            }
            _ => Ok(Trie::singleton(vec![], self.compile_scalar_expr(e, idmap, state, node_name)?)),
        }
    }

    /// `spec.md` §4.3/§4.8: everything that isn't a record/group/compound
    /// identifier must already be scalar by the time it reaches here — a
    /// normalizer bug if it isn't.
    fn compile_scalar_expr(
        &mut self,
        e: &Expr,
        idmap: &IdentifierMap,
        state: &CompilerState,
        node_name: &IStr,
    ) -> CoreResult<Expression> {
        match e {
            Expr::Ident(name, _) => self.lookup_scalar(name, idmap, state, node_name),
            Expr::Const(lit, _) => {
                let term = match *lit {
                    Literal::Bool(b) => self.store.mk_bool(b),
                    Literal::Int(v) => self.store.mk_int(v),
                    Literal::Real(n, d) => self.store.mk_real(n, d),
                };
                Ok(Expression::constant(self.store, term))
            }
            Expr::Pre(inner, _) => {
                let e2 = self.compile_scalar_expr(inner, idmap, state, node_name)?;
                Ok(expr::mk_pre(self.store, e2))
            }
            Expr::Arrow(a, b, _) => {
                let ea = self.compile_scalar_expr(a, idmap, state, node_name)?;
                let eb = self.compile_scalar_expr(b, idmap, state, node_name)?;
                expr::mk_arrow(self.store, ea, eb)
            }
            Expr::Ite(c, a, b, _) => {
                let ec = self.compile_scalar_expr(c, idmap, state, node_name)?;
                let ea = self.compile_scalar_expr(a, idmap, state, node_name)?;
                let eb = self.compile_scalar_expr(b, idmap, state, node_name)?;
                expr::mk_ite(self.store, ec, ea, eb)
            }
            Expr::UnOp(op, a, _) => {
                let ea = self.compile_scalar_expr(a, idmap, state, node_name)?;
                match op {
                    UnOp::Not => expr::mk_not(self.store, ea),
                    UnOp::Neg => {
                        let init = self.store.mk_app(Symbol::Neg, vec![ea.init])?;
                        let step = self.store.mk_app(Symbol::Neg, vec![ea.step])?;
                        Ok(Expression { init, step, ty: ea.ty })
                    }
                }
            }
            Expr::BinOp(op, a, b, _) => {
                let ea = self.compile_scalar_expr(a, idmap, state, node_name)?;
                let eb = self.compile_scalar_expr(b, idmap, state, node_name)?;
                self.compile_binop(*op, ea, eb)
            }
            Expr::Select(arr, idx, _) => {
                let earr = self.compile_scalar_expr(arr, idmap, state, node_name)?;
                let eidx = self.compile_scalar_expr(idx, idmap, state, node_name)?;
                expr::mk_select_and_push(self.store, earr, eidx)
            }
            Expr::GroupExpr(..) | Expr::RecordExpr(..) | Expr::Field(..) | Expr::Call(..) | Expr::Condact(..) | Expr::RestartEvery(..) => {
                Err(CoreError::invariant(
                    node_name.to_string(),
                    "non-scalar expression reached scalar compilation; the normalizer should have lifted it",
                ))
            }
        }
    }

    fn compile_binop(&mut self, op: BinOp, a: Expression, b: Expression) -> CoreResult<Expression> {
        match op {
            BinOp::And => expr::mk_and(self.store, a, b),
            BinOp::Or => expr::mk_or(self.store, a, b),
            BinOp::Eq => expr::mk_eq(self.store, a, b),
            BinOp::Lt => expr::mk_lt(self.store, a, b),
            BinOp::Le => expr::mk_le(self.store, a, b),
            BinOp::Gt => expr::mk_gt(self.store, a, b),
            BinOp::Ge => expr::mk_ge(self.store, a, b),
            BinOp::Add => expr::mk_add(self.store, a, b),
            BinOp::Sub => expr::mk_sub(self.store, a, b),
            BinOp::Mul => expr::mk_mul(self.store, a, b),
            BinOp::Div => expr::mk_div(self.store, a, b),
            BinOp::Xor => self.binop_via_symbol(Symbol::Xor, a, b),
            BinOp::Implies => self.binop_via_symbol(Symbol::Implies, a, b),
            BinOp::IntDiv => self.binop_via_symbol(Symbol::IntDiv, a, b),
            BinOp::Mod => self.binop_via_symbol(Symbol::Mod, a, b),
        }
    }

    fn binop_via_symbol(&mut self, sym: Symbol, a: Expression, b: Expression) -> CoreResult<Expression> {
        let init = self.store.mk_app(sym.clone(), vec![a.init, b.init])?;
        let step = self.store.mk_app(sym, vec![a.step, b.step])?;
        let ty = self.store.type_of(init);
        Ok(Expression { init, step, ty })
    }

    fn lookup_scalar(&mut self, name: &IStr, idmap: &IdentifierMap, state: &CompilerState, node_name: &IStr) -> CoreResult<Expression> {
        if let Some(trie) = idmap.svars.get(name.as_ref()) {
            if let Some(&sv) = trie.find(&[]) {
                return Ok(self.var_expr(sv));
            }
            return Err(CoreError::invariant(node_name.to_string(), format!("identifier '{name}' is not scalar")));
        }
        if let Some(&term) = state.other_constants.get(name) {
            return Ok(Expression::constant(self.store, term));
        }
        if let Some((_, term)) = state.free_constants.iter().find(|(n, _)| n == name) {
            return Ok(Expression::constant(self.store, *term));
        }
        Err(CoreError::unbound(name.to_string(), node_name.to_string()))
    }

    fn resolve_ident_sv(&mut self, name: &IStr, idmap: &IdentifierMap, node_name: &IStr) -> CoreResult<StateVarId> {
        idmap
            .svars
            .get(name.as_ref())
            .and_then(|t| t.find(&[]))
            .copied()
            .ok_or_else(|| CoreError::unbound(name.to_string(), node_name.to_string()))
    }

    /// Asserts/properties are normalized down to a bare `Ident` (`spec.md`
    /// §4.4 rule 3); resolve it to the state variable carrying its value.
    fn resolve_to_sv(&mut self, e: &Expr, idmap: &IdentifierMap, state: &CompilerState, node_name: &IStr) -> CoreResult<StateVarId> {
        match e {
            Expr::Ident(name, _) => self.resolve_ident_sv(name, idmap, node_name),
            other => {
                let compiled = self.compile_scalar_expr(other, idmap, state, node_name)?;
                let sv = self.svars.get_or_create(
                    format!("assert_{}", self.next_call_id),
                    vec![node_name.to_string(), "reserved".into()],
                    compiled.ty,
                    false,
                    false,
                    false,
                );
                self.next_call_id += 1;
                Ok(sv)
            }
        }
    }

    fn var_expr(&mut self, sv: StateVarId) -> Expression {
        let ty = self.svars.get(sv).ty;
        let term = self.store.mk_var(Variable::StateVarInstance { sv, offset: 0 }, ty);
        Expression::constant(self.store, term)
    }

    /// `spec.md` §4.5 step 8: compile the contract's assumes/guarantees into
    /// ghost state variables and fold them into the `sofar` accumulator
    /// `sofar = A -> (A && pre(sofar))`, `A` being the conjunction of every
    /// assumption held so far.
    #[allow(clippy::too_many_arguments)]
    fn compile_contract(
        &mut self,
        idmap: &mut IdentifierMap,
        state: &CompilerState,
        node_scope: &[String],
        decl: &crate::ast::ContractDecl,
        contract_calls: &[ContractCallInstantiation],
        extra_assumes: &[(Option<IStr>, Expr)],
        extra_guarantees: &[(Option<IStr>, Expr, bool)],
        node_name: &IStr,
        equations: &mut Vec<EquationRecord>,
    ) -> CoreResult<Contract> {
        let bool_ty = self.store.types.intern(Type::Bool);
        let mut assumes = Vec::new();
        for (i, (name, assume_expr)) in decl.assumes.iter().chain(extra_assumes.iter()).enumerate() {
            let compiled = self.compile_scalar_expr(assume_expr, idmap, state, node_name)?;
            let mut scope = node_scope.to_vec();
            scope.push("assume".into());
            scope.push(i.to_string());
            let sv = self.svars.get_or_create("assume", scope.clone(), compiled.ty, false, false, false);
            equations.push(EquationRecord { sv, bounds: vec![], rhs: compiled });
            assumes.push(ContractSvar {
                kind: ContractSvarKind::Assumption,
                position: dummy_span(),
                index: i as u32,
                name: name.clone(),
                sv,
                scope,
            });
        }

        let mut guarantees = Vec::new();
        for (i, (name, guarantee_expr, is_weak)) in decl.guarantees.iter().chain(extra_guarantees.iter()).enumerate() {
            let compiled = self.compile_scalar_expr(guarantee_expr, idmap, state, node_name)?;
            let mut scope = node_scope.to_vec();
            scope.push("guarantee".into());
            scope.push(i.to_string());
            let sv = self.svars.get_or_create("guarantee", scope.clone(), compiled.ty, false, false, false);
            equations.push(EquationRecord { sv, bounds: vec![], rhs: compiled });
            let kind = if *is_weak { ContractSvarKind::WeakGuarantee } else { ContractSvarKind::Guarantee };
            guarantees.push((
                ContractSvar { kind, position: dummy_span(), index: i as u32, name: name.clone(), sv, scope },
                *is_weak,
            ));
        }

        // Parametric contract import: splice the callee's already-compiled
        // ghost state variables in under this instantiation's scope path,
        // reusing their `sv` rather than recompiling the callee's contract.
        for inst in contract_calls {
            if let Some(callee_contract) = state.find_node(inst.callee.as_ref()).and_then(|n| n.contract.as_ref()) {
                for a in &callee_contract.assumes {
                    let mut imported = a.clone();
                    imported.scope = inst.scope.iter().cloned().chain(a.scope.iter().cloned()).collect();
                    assumes.push(imported);
                }
                for (g, is_weak) in &callee_contract.guarantees {
                    let mut imported = g.clone();
                    imported.scope = inst.scope.iter().cloned().chain(g.scope.iter().cloned()).collect();
                    guarantees.push((imported, *is_weak));
                }
            }
        }

        let mut modes = Vec::new();
        for mode_decl in &decl.modes {
            let mut path = node_scope.to_vec();
            path.push("mode".into());
            path.push(mode_decl.name.to_string());
            let requires = self.compile_mode_clauses(&mode_decl.requires, idmap, state, node_name, &path, "requires", ContractSvarKind::Require, equations)?;
            let ensures = self.compile_mode_clauses(&mode_decl.ensures, idmap, state, node_name, &path, "ensures", ContractSvarKind::Ensure, equations)?;
            modes.push(Mode { name: mode_decl.name.clone(), position: mode_decl.span, path, requires, ensures });
        }

        let sofar_scope = {
            let mut s = node_scope.to_vec();
            s.push("sofar".into());
            s
        };
        let sofar_sv = self.svars.get_or_create("sofar", sofar_scope, bool_ty, false, false, false);

        let true_term = self.store.mk_bool(true);
        let true_expr = Expression::constant(self.store, true_term);
        let assumes_conj = assumes.iter().try_fold(true_expr, |acc, a| {
            let a_ref = self.var_expr(a.sv);
            expr::mk_and(self.store, acc, a_ref)
        })?;
        let sofar_ref = self.var_expr(sofar_sv);
        let pre_sofar = expr::mk_pre(self.store, sofar_ref);
        let held_so_far = expr::mk_and(self.store, assumes_conj, pre_sofar)?;
        let sofar_rhs = expr::mk_arrow(self.store, assumes_conj, held_so_far)?;
        equations.push(EquationRecord { sv: sofar_sv, bounds: vec![], rhs: sofar_rhs });

        Ok(Contract { assumes, sofar: sofar_sv, guarantees, modes })
    }

    #[allow(clippy::too_many_arguments)]
    fn compile_mode_clauses(
        &mut self,
        clauses: &[(Option<IStr>, Expr)],
        idmap: &IdentifierMap,
        state: &CompilerState,
        node_name: &IStr,
        path: &[String],
        clause_kind: &str,
        kind: ContractSvarKind,
        equations: &mut Vec<EquationRecord>,
    ) -> CoreResult<Vec<ContractSvar>> {
        let mut out = Vec::new();
        for (i, (name, clause_expr)) in clauses.iter().enumerate() {
            let compiled = self.compile_scalar_expr(clause_expr, idmap, state, node_name)?;
            let mut scope = path.to_vec();
            scope.push(clause_kind.into());
            scope.push(i.to_string());
            let sv = self.svars.get_or_create(clause_kind, scope.clone(), compiled.ty, false, false, false);
            equations.push(EquationRecord { sv, bounds: vec![], rhs: compiled });
            out.push(ContractSvar { kind, position: dummy_span(), index: i as u32, name: name.clone(), sv, scope });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::typing::StaticTypingContext;
    use crate::ast::{ContractDecl, Equation, LhsItem, NodeDecl, TypeExpr};
    use crate::normalize::Normalizer;
    use crate::core::NameCounter;

    fn span() -> Span {
        dummy_span()
    }

    fn var(name: &str, ty: TypeExpr) -> VarDecl {
        VarDecl { name: name.into(), ty, span: span() }
    }

    /// `spec.md` §8 scenario 1: a unary identity node `y = x`.
    #[test]
    fn identity_node_compiles_one_equation() {
        let ctx = StaticTypingContext::default();
        let node = NodeDecl {
            name: "Id".into(),
            is_function: false,
            is_extern: false,
            is_main: true,
            type_params: vec![],
            inputs: vec![var("x", TypeExpr::Int)],
            outputs: vec![var("y", TypeExpr::Int)],
            locals: vec![],
            equations: vec![Equation { lhs: vec![LhsItem::Ident("y".into())], rhs: Expr::Ident("x".into(), span()), span: span() }],
            asserts: vec![],
            properties: vec![],
            contract: None,
        };
        let mut normalizer = Normalizer::new(NameCounter::new(), &ctx);
        let (normalized, r#gen) = normalizer.normalize_node(&node);

        let mut store = HashconsStore::new();
        let mut state = CompilerState::new();
        let mut generator = NodeGenerator::new(&mut store, &ctx);
        let record = generator.compile_node(&mut state, &normalized, &r#gen).unwrap();

        assert_eq!(record.equations.len(), 1);
        assert_eq!(record.inputs.len(), 1);
        assert_eq!(record.outputs.len(), 1);
    }

    /// `spec.md` §8 scenario 3: a record-typed output compiles to one
    /// equation per scalar field via `expand_tuple`.
    #[test]
    fn record_output_expands_into_per_field_equations() {
        let ctx = StaticTypingContext::default();
        let rec_ty = TypeExpr::Record(vec![("a".into(), TypeExpr::Int), ("b".into(), TypeExpr::Bool)]);
        let node = NodeDecl {
            name: "MkPair".into(),
            is_function: false,
            is_extern: false,
            is_main: false,
            type_params: vec![],
            inputs: vec![var("a_in", TypeExpr::Int), var("b_in", TypeExpr::Bool)],
            outputs: vec![var("p", rec_ty)],
            locals: vec![],
            equations: vec![Equation {
                lhs: vec![LhsItem::Ident("p".into())],
                rhs: Expr::RecordExpr(
                    "Pair".into(),
                    vec![("a".into(), Expr::Ident("a_in".into(), span())), ("b".into(), Expr::Ident("b_in".into(), span()))],
                    span(),
                ),
                span: span(),
            }],
            asserts: vec![],
            properties: vec![],
            contract: None,
        };
        let mut normalizer = Normalizer::new(NameCounter::new(), &ctx);
        let (normalized, r#gen) = normalizer.normalize_node(&node);

        let mut store = HashconsStore::new();
        let mut state = CompilerState::new();
        let mut generator = NodeGenerator::new(&mut store, &ctx);
        let record = generator.compile_node(&mut state, &normalized, &r#gen).unwrap();

        assert_eq!(record.equations.len(), 2);
        assert_eq!(record.outputs.len(), 2);
    }

    /// `spec.md` §8 scenario 2: an unguarded `pre` gets an oracle-guarded
    /// defining equation once it reaches node generation.
    #[test]
    fn unguarded_pre_node_compiles_with_an_oracle() {
        let ctx = StaticTypingContext::default();
        let node = NodeDecl {
            name: "Latch".into(),
            is_function: false,
            is_extern: false,
            is_main: false,
            type_params: vec![],
            inputs: vec![var("x", TypeExpr::Int)],
            outputs: vec![var("y", TypeExpr::Int)],
            locals: vec![],
            equations: vec![Equation {
                lhs: vec![LhsItem::Ident("y".into())],
                rhs: Expr::Pre(Box::new(Expr::Ident("x".into(), span())), span()),
                span: span(),
            }],
            asserts: vec![],
            properties: vec![],
            contract: None,
        };
        let mut normalizer = Normalizer::new(NameCounter::new(), &ctx);
        let (normalized, r#gen) = normalizer.normalize_node(&node);
        assert_eq!(r#gen.oracles.len(), 1);

        let mut store = HashconsStore::new();
        let mut state = CompilerState::new();
        let mut generator = NodeGenerator::new(&mut store, &ctx);
        let record = generator.compile_node(&mut state, &normalized, &r#gen).unwrap();

        assert_eq!(record.oracles.len(), 1);
        assert_eq!(record.equations.len(), 1);
    }

    /// `spec.md` §8 scenario 4: a node call's outputs compile into fresh
    /// state variables referenced by a `CallRecord`.
    #[test]
    fn node_call_compiles_a_call_record() {
        let mut ctx = StaticTypingContext::default();
        ctx.signatures.insert("Sq".into(), (vec![var("x", TypeExpr::Int)], vec![var("r", TypeExpr::Int)]));
        let node = NodeDecl {
            name: "Caller".into(),
            is_function: false,
            is_extern: false,
            is_main: false,
            type_params: vec![],
            inputs: vec![var("x", TypeExpr::Int)],
            outputs: vec![var("y", TypeExpr::Int)],
            locals: vec![],
            equations: vec![Equation {
                lhs: vec![LhsItem::Ident("y".into())],
                rhs: Expr::Call("Sq".into(), vec![Expr::Ident("x".into(), span())], span()),
                span: span(),
            }],
            asserts: vec![],
            properties: vec![],
            contract: None,
        };
        let mut normalizer = Normalizer::new(NameCounter::new(), &ctx);
        let (normalized, r#gen) = normalizer.normalize_node(&node);
        assert_eq!(r#gen.calls.len(), 1);

        let mut store = HashconsStore::new();
        let mut state = CompilerState::new();
        let mut generator = NodeGenerator::new(&mut store, &ctx);
        let record = generator.compile_node(&mut state, &normalized, &r#gen).unwrap();

        assert_eq!(record.calls.len(), 1);
        assert_eq!(record.calls[0].callee.as_ref(), "Sq");
        assert_eq!(record.calls[0].outputs.len(), 1);
    }

    /// `spec.md` §8 scenario 5: a one-assumption contract's `sofar`
    /// variable is defined by `A -> (A && pre(sofar))`.
    #[test]
    fn contract_sofar_equation_matches_the_accumulator_formula() {
        let ctx = StaticTypingContext::default();
        let node = NodeDecl {
            name: "Guarded".into(),
            is_function: false,
            is_extern: false,
            is_main: false,
            type_params: vec![],
            inputs: vec![var("x", TypeExpr::Int)],
            outputs: vec![var("y", TypeExpr::Int)],
            locals: vec![],
            equations: vec![Equation { lhs: vec![LhsItem::Ident("y".into())], rhs: Expr::Ident("x".into(), span()), span: span() }],
            asserts: vec![],
            properties: vec![],
            contract: Some(ContractDecl {
                assumes: vec![(None, Expr::BinOp(BinOp::Ge, Box::new(Expr::Ident("x".into(), span())), Box::new(Expr::Const(Literal::Int(0), span())), span()))],
                guarantees: vec![],
                modes: vec![],
                imports: vec![],
            }),
        };
        let mut normalizer = Normalizer::new(NameCounter::new(), &ctx);
        let (normalized, r#gen) = normalizer.normalize_node(&node);

        let mut store = HashconsStore::new();
        let mut state = CompilerState::new();
        let mut generator = NodeGenerator::new(&mut store, &ctx);
        let record = generator.compile_node(&mut state, &normalized, &r#gen).unwrap();

        let contract = record.contract.unwrap();
        assert_eq!(contract.assumes.len(), 1);
        let sofar_eq = record.equations.iter().find(|e| e.sv == contract.sofar).unwrap();
        // sofar's step is `A && pre(sofar)`, an `And` application.
        match store.node_of(sofar_eq.rhs.step) {
            crate::term::node::TermNode::App(sid, _) => assert!(matches!(store.syms.get(*sid), Symbol::And)),
            other => panic!("expected And application, got {other:?}"),
        }
    }
}
