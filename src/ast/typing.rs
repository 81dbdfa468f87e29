//! [`TypingContext`]: stand-in for the upstream type checker (`spec.md` §6,
//! "Input from the parser/type-checker").

use crate::ast::expr::Expr;
use crate::ast::{TypeExpr, VarDecl};
use crate::core::IStr;

/// Everything the normalizer and node generator need from a type checker
/// they do not themselves implement.
pub trait TypingContext {
    /// `(inputs, outputs)` for a declared node/function, by name.
    fn node_signature(&self, name: &str) -> Option<(&[VarDecl], &[VarDecl])>;

    /// Polymorphic type parameters of a contract node, by name.
    fn contract_type_params(&self, name: &str) -> &[IStr];

    /// If `ty` is a subrange type, its `(lo, hi)` bounds.
    fn is_subrange(&self, ty: &TypeExpr) -> Option<(Option<i64>, Option<i64>)>;

    /// If `ty` carries a refinement predicate, the predicate expression.
    fn is_refinement(&self, ty: &TypeExpr) -> Option<&Expr>;

    /// Instantiated type arguments at a node's call site, by callee name.
    fn node_type_args(&self, name: &str) -> &[TypeExpr];
}

/// An in-memory [`TypingContext`] built from a [`crate::ast::Program`] plus
/// explicit constraint annotations — sufficient for tests and for small
/// embeddings that do not need a full external type checker.
#[derive(Debug, Default, Clone)]
pub struct StaticTypingContext {
    pub signatures: std::collections::HashMap<String, (Vec<VarDecl>, Vec<VarDecl>)>,
    pub contract_params: std::collections::HashMap<String, Vec<IStr>>,
    pub subranges: Vec<(TypeExpr, Option<i64>, Option<i64>)>,
    pub refinements: Vec<(TypeExpr, Expr)>,
    pub type_args: std::collections::HashMap<String, Vec<TypeExpr>>,
}

impl TypingContext for StaticTypingContext {
    fn node_signature(&self, name: &str) -> Option<(&[VarDecl], &[VarDecl])> {
        self.signatures.get(name).map(|(i, o)| (i.as_slice(), o.as_slice()))
    }

    fn contract_type_params(&self, name: &str) -> &[IStr] {
        self.contract_params.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    fn is_subrange(&self, ty: &TypeExpr) -> Option<(Option<i64>, Option<i64>)> {
        self.subranges
            .iter()
            .find(|(t, _, _)| t == ty)
            .map(|(_, lo, hi)| (*lo, *hi))
    }

    fn is_refinement(&self, ty: &TypeExpr) -> Option<&Expr> {
        self.refinements.iter().find(|(t, _)| t == ty).map(|(_, e)| e)
    }

    fn node_type_args(&self, name: &str) -> &[TypeExpr] {
        self.type_args.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}
