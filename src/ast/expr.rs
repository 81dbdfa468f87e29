//! Input expression tree. Deliberately untyped — `TypingContext` supplies
//! the typing information the normalizer and node generator need.

use crate::base::Span;
use crate::core::IStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Real(i64, i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    And,
    Or,
    Xor,
    Implies,
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Ident(IStr, Span),
    Const(Literal, Span),
    Pre(Box<Expr>, Span),
    Arrow(Box<Expr>, Box<Expr>, Span),
    Ite(Box<Expr>, Box<Expr>, Box<Expr>, Span),
    UnOp(UnOp, Box<Expr>, Span),
    BinOp(BinOp, Box<Expr>, Box<Expr>, Span),
    /// A call to a node/function by name with positional arguments.
    Call(IStr, Vec<Expr>, Span),
    /// `condact(activate, callee(args), defaults?)`.
    Condact(Box<Expr>, IStr, Vec<Expr>, Option<Vec<Expr>>, Span),
    /// `restart callee(args) every cond`.
    RestartEvery(IStr, Vec<Expr>, Box<Expr>, Span),
    /// A tuple/list group: `(e1, e2, ...)`.
    GroupExpr(Vec<Expr>, Span),
    /// `Type { field = expr, ... }`.
    RecordExpr(IStr, Vec<(IStr, Expr)>, Span),
    /// `arr[index]`.
    Select(Box<Expr>, Box<Expr>, Span),
    /// `rec.field`.
    Field(Box<Expr>, IStr, Span),
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(_, s)
            | Expr::Const(_, s)
            | Expr::Pre(_, s)
            | Expr::Arrow(_, _, s)
            | Expr::Ite(_, _, _, s)
            | Expr::UnOp(_, _, s)
            | Expr::BinOp(_, _, _, s)
            | Expr::Call(_, _, s)
            | Expr::Condact(_, _, _, _, s)
            | Expr::RestartEvery(_, _, _, s)
            | Expr::GroupExpr(_, s)
            | Expr::RecordExpr(_, _, s)
            | Expr::Select(_, _, s)
            | Expr::Field(_, _, s) => *s,
        }
    }

    /// `spec.md` §4.4 rule 1/2: atomic arguments never need lifting.
    pub fn is_atomic(&self) -> bool {
        matches!(self, Expr::Ident(..) | Expr::Const(..))
    }
}
