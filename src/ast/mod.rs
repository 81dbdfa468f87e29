//! A minimal stand-in AST for the upstream parser's output (`SPEC_FULL.md`
//! §1.E). Just enough surface — declarations, expressions, types — to drive
//! [`crate::normalize`] and [`crate::nodegen`]. Not a parser: there is no
//! lexer here and no syntax-error recovery, by design.

pub mod expr;
pub mod typing;

use crate::base::Span;
use crate::core::IStr;

pub use expr::{BinOp, Expr, Literal, UnOp};
pub use typing::TypingContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Bool,
    Int,
    IntRange(Option<i64>, Option<i64>),
    Real,
    Bv(u32),
    Array(Box<TypeExpr>, Box<TypeExpr>),
    Record(Vec<(IStr, TypeExpr)>),
    Tuple(Vec<TypeExpr>),
    /// A reference to a type alias, enum, or abstract type by name.
    Named(IStr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    pub name: IStr,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LhsItem {
    Ident(IStr),
    /// `a[i] = ...` equation-defined array, `i` bound as a fresh loop index
    /// over the LHS's array bound.
    ArrayDef(IStr, IStr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equation {
    pub lhs: Vec<LhsItem>,
    pub rhs: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeDecl {
    pub name: IStr,
    pub requires: Vec<(Option<IStr>, Expr)>,
    pub ensures: Vec<(Option<IStr>, Expr)>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCallDecl {
    pub callee: IStr,
    pub type_args: Vec<TypeExpr>,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContractDecl {
    pub assumes: Vec<(Option<IStr>, Expr)>,
    pub guarantees: Vec<(Option<IStr>, Expr, bool)>,
    pub modes: Vec<ModeDecl>,
    pub imports: Vec<ContractCallDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDecl {
    pub name: IStr,
    pub is_function: bool,
    pub is_extern: bool,
    pub is_main: bool,
    pub type_params: Vec<IStr>,
    pub inputs: Vec<VarDecl>,
    pub outputs: Vec<VarDecl>,
    pub locals: Vec<VarDecl>,
    pub equations: Vec<Equation>,
    pub asserts: Vec<(Span, Expr)>,
    pub properties: Vec<(IStr, Expr, Span)>,
    pub contract: Option<ContractDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAliasDecl {
    pub name: IStr,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub type_aliases: Vec<TypeAliasDecl>,
    pub consts: Vec<(IStr, Option<TypeExpr>, Expr)>,
    pub nodes: Vec<NodeDecl>,
}
