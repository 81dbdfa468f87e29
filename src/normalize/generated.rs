//! [`GeneratedIdentifiers`]: the per-node side table the normalizer hands
//! the node generator (`spec.md` §3 "Generated Identifiers").

use crate::ast::{Expr, TypeExpr};
use crate::base::Span;
use crate::core::IStr;

/// What an oracle stands in for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleSeed {
    /// A fresh unconstrained constant; `Expr` is only used to recover its
    /// type during node generation (the oracle itself has no definition).
    Fresh(TypeExpr),
    /// Closes over a pre-existing identifier's current value.
    ClosesOver(IStr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEntry {
    pub outputs: Vec<IStr>,
    pub activation: Option<IStr>,
    pub restart: Option<IStr>,
    pub callee: IStr,
    pub args: Vec<Expr>,
    pub defaults: Option<Vec<Expr>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCallInstantiation {
    pub callee: IStr,
    pub scope: Vec<String>,
}

/// Where a subrange/refinement constraint came from, which decides where
/// the node generator places the compiled check (`spec.md` §4.5 step 9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOrigin {
    Input,
    Output,
    Local,
}

#[derive(Debug, Clone, Default)]
pub struct GeneratedIdentifiers {
    pub locals: Vec<(IStr, Expr)>,
    pub oracles: Vec<(IStr, OracleSeed)>,
    pub calls: Vec<CallEntry>,
    pub subrange_constraints: Vec<(IStr, Expr, ConstraintOrigin)>,
    pub refinement_constraints: Vec<(IStr, Expr, ConstraintOrigin)>,
    pub assertions: Vec<(Span, IStr)>,
    pub history_vars: Vec<IStr>,
    pub array_literal_vars: Vec<IStr>,
    pub nonvacuity_properties: Vec<(IStr, Expr)>,
    pub contract_call_instantiations: Vec<ContractCallInstantiation>,
}
