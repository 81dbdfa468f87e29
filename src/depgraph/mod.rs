//! The dependency graph (`spec.md` §4.6): a directed graph over state
//! variables built from a transition system, supporting cone-of-influence
//! queries and DOT rendering.

mod dot;

pub use dot::{render_dot, DotStyle};

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::term::ids::{StateVarId, TermId};
use crate::term::node::TermNode;
use crate::term::store::HashconsStore;
use crate::term::symbol::Symbol;

fn state_vars_of(store: &HashconsStore, term: TermId) -> HashSet<StateVarId> {
    let mut out = HashSet::new();
    collect_state_vars(store, term, &mut out);
    out
}

fn collect_state_vars(store: &HashconsStore, term: TermId, out: &mut HashSet<StateVarId>) {
    match store.node_of(term) {
        TermNode::Var(vid) => {
            if let Some(sv) = store.vars.get(*vid).state_var() {
                out.insert(sv);
            }
        }
        TermNode::App(_, args) => {
            for a in args.clone() {
                collect_state_vars(store, a, out);
            }
        }
        TermNode::Let(bindings, body) => {
            for (_, e) in bindings {
                collect_state_vars(store, *e, out);
            }
            collect_state_vars(store, *body, out);
        }
        TermNode::Forall(_, body) | TermNode::Exists(_, body) => collect_state_vars(store, *body, out),
        TermNode::Named(_, inner) => collect_state_vars(store, *inner, out),
        TermNode::Sym(_) => {}
    }
}

/// Recognizes `= lhs rhs` definition terms (`spec.md` §4.6).
fn as_definition(store: &HashconsStore, term: TermId) -> Option<(TermId, TermId)> {
    match store.node_of(term) {
        TermNode::App(sid, args) if args.len() == 2 && matches!(store.syms.get(*sid), Symbol::Eq) => {
            Some((args[0], args[1]))
        }
        _ => None,
    }
}

/// A directed graph over state variables.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    edges: HashMap<StateVarId, HashSet<StateVarId>>,
}

impl DependencyGraph {
    /// Build the graph from a transition system: `terms` is the conjunction
    /// of initial/transition constraints, `definitions` marks which of those
    /// terms are `= lhs rhs` variable bindings rather than general
    /// constraints, `guarantee_atoms` are the atoms of guarantee terms (used
    /// to prune the definition set, `spec.md` §4.6 "Pruning"), and
    /// `subsystem_instances` are parent/child state-variable pairs
    /// contributed by node-call instantiation.
    pub fn build(
        store: &HashconsStore,
        terms: &[TermId],
        definitions: &HashSet<TermId>,
        guarantee_atoms: &[TermId],
        subsystem_instances: &[(StateVarId, StateVarId)],
    ) -> Self {
        let pruned = prune_definitions(store, terms, definitions, guarantee_atoms);

        let mut graph = DependencyGraph::default();
        for &t in terms {
            if pruned.contains(&t) {
                if let Some((lhs, rhs)) = as_definition(store, t) {
                    let lhs_vars = state_vars_of(store, lhs);
                    let rhs_vars = state_vars_of(store, rhs);
                    for &l in &lhs_vars {
                        for &r in &rhs_vars {
                            graph.add_edge(l, r);
                        }
                    }
                    continue;
                }
            }
            let vars: Vec<StateVarId> = state_vars_of(store, t).into_iter().collect();
            for (i, &a) in vars.iter().enumerate() {
                for &b in vars.iter().skip(i + 1) {
                    graph.add_edge(a, b);
                    graph.add_edge(b, a);
                }
            }
        }

        for &(parent, child) in subsystem_instances {
            graph.add_edge(parent, child);
            graph.add_edge(child, parent);
        }

        trace!(vertices = graph.edges.len(), "dependency graph built");
        graph
    }

    fn add_edge(&mut self, from: StateVarId, to: StateVarId) {
        if from == to {
            return;
        }
        self.edges.entry(from).or_default().insert(to);
    }

    pub fn successors(&self, sv: StateVarId) -> impl Iterator<Item = StateVarId> + '_ {
        self.edges.get(&sv).into_iter().flatten().copied()
    }

    pub fn vertices(&self) -> impl Iterator<Item = StateVarId> + '_ {
        let mut all: HashSet<StateVarId> = HashSet::new();
        for (&from, tos) in self.edges.iter() {
            all.insert(from);
            all.extend(tos.iter().copied());
        }
        all.into_iter()
    }

    /// Forward-reachable set from a single state variable, with memoization
    /// across calls sharing `cache`.
    fn reachable_from(&self, sv: StateVarId, cache: &mut HashMap<StateVarId, HashSet<StateVarId>>) -> HashSet<StateVarId> {
        if let Some(cached) = cache.get(&sv) {
            return cached.clone();
        }
        let mut visited = HashSet::new();
        let mut stack = vec![sv];
        while let Some(cur) = stack.pop() {
            if !visited.insert(cur) {
                continue;
            }
            for next in self.successors(cur) {
                if !visited.contains(&next) {
                    stack.push(next);
                }
            }
        }
        cache.insert(sv, visited.clone());
        visited
    }

    /// Cone of influence of a set of properties: the union of each
    /// property's state variables' forward-reachable set, including the
    /// property variables themselves (`spec.md` §4.6, §8).
    pub fn cone_of_influence(&self, properties: &[StateVarId]) -> HashSet<StateVarId> {
        let mut cache = HashMap::new();
        let mut cone = HashSet::new();
        for &p in properties {
            cone.insert(p);
            cone.extend(self.reachable_from(p, &mut cache));
        }
        cone
    }
}

/// Removes from `definitions` any definition transitively reachable from a
/// guarantee atom's state variables — those bindings are properties, not
/// variable-defining equations (`spec.md` §4.6 "Pruning").
fn prune_definitions(
    store: &HashconsStore,
    terms: &[TermId],
    definitions: &HashSet<TermId>,
    guarantee_atoms: &[TermId],
) -> HashSet<TermId> {
    let mut excluded_vars: HashSet<StateVarId> = HashSet::new();
    for &atom in guarantee_atoms {
        excluded_vars.extend(state_vars_of(store, atom));
    }

    let mut remaining: HashSet<TermId> = definitions.clone();
    loop {
        let mut newly_excluded = Vec::new();
        for &t in remaining.iter() {
            if let Some((lhs, _)) = as_definition(store, t) {
                if state_vars_of(store, lhs).iter().any(|v| excluded_vars.contains(v)) {
                    newly_excluded.push(t);
                }
            }
        }
        if newly_excluded.is_empty() {
            break;
        }
        for t in newly_excluded {
            remaining.remove(&t);
            if let Some((_, rhs)) = as_definition(store, t) {
                excluded_vars.extend(state_vars_of(store, rhs));
            }
        }
    }
    let _ = terms;
    remaining
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::ids::TypeId;
    use crate::term::var::Variable;

    fn sv_term(store: &mut HashconsStore, sv: StateVarId, ty: TypeId) -> TermId {
        store.mk_var(Variable::ConstStateVar { sv }, ty)
    }

    #[test]
    fn scenario_transition_relation_builds_expected_edges() {
        // a = b + 1, b = c, prop: a > 0
        let mut store = HashconsStore::new();
        let int_ty = store.types.intern(crate::term::ty::Type::Int);
        let a = StateVarId::from_index(0);
        let b = StateVarId::from_index(1);
        let c = StateVarId::from_index(2);

        let a_t = sv_term(&mut store, a, int_ty);
        let b_t = sv_term(&mut store, b, int_ty);
        let c_t = sv_term(&mut store, c, int_ty);
        let one = store.mk_int(1);
        let zero = store.mk_int(0);

        let b_plus_1 = store.mk_app(Symbol::Add, vec![b_t, one]).unwrap();
        let def_a = store.mk_app(Symbol::Eq, vec![a_t, b_plus_1]).unwrap();
        let def_b = store.mk_app(Symbol::Eq, vec![b_t, c_t]).unwrap();
        let prop = store.mk_app(Symbol::Gt, vec![a_t, zero]).unwrap();

        let mut definitions = HashSet::new();
        definitions.insert(def_a);
        definitions.insert(def_b);

        let terms = vec![def_a, def_b, prop];
        let graph = DependencyGraph::build(&store, &terms, &definitions, &[], &[]);

        assert!(graph.successors(a).collect::<HashSet<_>>().contains(&b));
        assert!(graph.successors(b).collect::<HashSet<_>>().contains(&c));

        let cone = graph.cone_of_influence(&[a]);
        assert_eq!(cone, HashSet::from([a, b, c]));
    }

    #[test]
    fn guarantee_reachable_definitions_are_pruned() {
        let mut store = HashconsStore::new();
        let int_ty = store.types.intern(crate::term::ty::Type::Int);
        let a = StateVarId::from_index(0);
        let b = StateVarId::from_index(1);
        let a_t = sv_term(&mut store, a, int_ty);
        let b_t = sv_term(&mut store, b, int_ty);
        let def_a = store.mk_app(Symbol::Eq, vec![a_t, b_t]).unwrap();

        let mut definitions = HashSet::new();
        definitions.insert(def_a);

        // guarantee atom mentions `a`: def_a should be pruned (treated as a
        // property, not a binding), so it falls back to clique treatment.
        let guarantee_atoms = vec![a_t];
        let terms = vec![def_a];
        let graph = DependencyGraph::build(&store, &terms, &definitions, &guarantee_atoms, &[]);
        // clique treatment still connects a and b, just not via the
        // definition-specific lhs->rhs direction exclusively.
        assert!(graph.successors(a).collect::<HashSet<_>>().contains(&b));
        assert!(graph.successors(b).collect::<HashSet<_>>().contains(&a));
    }
}
