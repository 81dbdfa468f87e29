//! [`NodeRecord`] and the structures it owns (`spec.md` §3 "Node Record",
//! "Call Record", "Contract").

use std::collections::HashMap;

use crate::base::Span;
use crate::core::IStr;
use crate::expr::Expression;
use crate::index_trie::Trie;
use crate::term::ids::{StateVarId, TypeId};

use super::identifier_map::Bound;
use super::state_var::StateVarSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opacity {
    Opaque,
    Transparent,
    Translucent,
}

#[derive(Debug, Clone)]
pub struct EquationRecord {
    pub sv: StateVarId,
    pub bounds: Vec<Bound>,
    pub rhs: Expression,
}

#[derive(Debug, Clone)]
pub struct CallRecord {
    pub call_id: u64,
    pub position: Span,
    pub callee: IStr,
    pub conditions: Vec<StateVarId>,
    pub inputs: Trie<StateVarId>,
    pub oracles: Vec<StateVarId>,
    pub outputs: Trie<StateVarId>,
    pub defaults: Option<Vec<Expression>>,
    pub inlined: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractSvarKind {
    Assumption,
    WeakAssumption,
    Guarantee,
    WeakGuarantee,
    Require,
    Ensure,
    GuaranteeOneModeActive,
    GuaranteeModeImplication,
}

#[derive(Debug, Clone)]
pub struct ContractSvar {
    pub kind: ContractSvarKind,
    pub position: Span,
    pub index: u32,
    pub name: Option<IStr>,
    pub sv: StateVarId,
    pub scope: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Mode {
    pub name: IStr,
    pub position: Span,
    pub path: Vec<String>,
    pub requires: Vec<ContractSvar>,
    pub ensures: Vec<ContractSvar>,
}

#[derive(Debug, Clone)]
pub struct Contract {
    pub assumes: Vec<ContractSvar>,
    pub sofar: StateVarId,
    pub guarantees: Vec<(ContractSvar, bool)>,
    pub modes: Vec<Mode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Plain,
    Nonvacuity,
    Candidate,
}

#[derive(Debug, Default, Clone)]
pub struct NodeRecordFlags {
    pub is_main: bool,
    pub is_function: bool,
}

#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub name: IStr,
    pub is_extern: bool,
    pub opacity: Opacity,
    pub type_args: Vec<TypeId>,
    pub instance: StateVarId,
    pub init_flag: StateVarId,
    pub inputs: Trie<StateVarId>,
    pub outputs: Trie<StateVarId>,
    pub locals: Trie<StateVarId>,
    pub oracles: Vec<StateVarId>,
    pub equations: Vec<EquationRecord>,
    pub calls: Vec<CallRecord>,
    pub asserts: Vec<(Span, StateVarId)>,
    pub properties: Vec<(StateVarId, String, Span, PropertyKind)>,
    pub contract: Option<Contract>,
    pub flags: NodeRecordFlags,
    pub sources: HashMap<StateVarId, StateVarSource>,
    pub oracle_closes_over: HashMap<StateVarId, StateVarId>,
    pub definitions: HashMap<StateVarId, Expression>,
    pub assumption_svars: Vec<StateVarId>,
    pub history_svars_by_type: HashMap<TypeId, Vec<StateVarId>>,
}
