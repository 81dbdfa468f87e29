//! A minimal s-expression-style pretty printer for terms, used by tests and
//! by `depgraph`'s DOT rendering to label nodes (`spec.md` §4.8).

use std::fmt::Write;

use crate::term::ids::TermId;
use crate::term::node::TermNode;
use crate::term::store::HashconsStore;
use crate::term::symbol::Symbol;

pub fn print_term(store: &HashconsStore, t: TermId) -> String {
    let mut out = String::new();
    write_term(store, t, &mut out);
    out
}

fn write_term(store: &HashconsStore, t: TermId, out: &mut String) {
    match store.node_of(t) {
        TermNode::Sym(sid) => write_symbol(store.syms.get(*sid), out),
        TermNode::Var(vid) => {
            let _ = write!(out, "{}", store.vars.get(*vid).clone().debug_name());
        }
        TermNode::App(sid, args) => {
            let sym = store.syms.get(*sid).clone();
            let _ = write!(out, "({}", symbol_head(&sym));
            for a in args {
                out.push(' ');
                write_term(store, *a, out);
            }
            out.push(')');
        }
        TermNode::Let(bindings, body) => {
            out.push_str("(let (");
            for (i, (_v, e)) in bindings.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_term(store, *e, out);
            }
            out.push_str(") ");
            write_term(store, *body, out);
            out.push(')');
        }
        TermNode::Forall(_, body) => {
            out.push_str("(forall ");
            write_term(store, *body, out);
            out.push(')');
        }
        TermNode::Exists(_, body) => {
            out.push_str("(exists ");
            write_term(store, *body, out);
            out.push(')');
        }
        TermNode::Named(k, inner) => {
            let _ = write!(out, "(! t{} ", k);
            write_term(store, *inner, out);
            out.push(')');
        }
    }
}

fn write_symbol(sym: &Symbol, out: &mut String) {
    match sym {
        Symbol::True => out.push_str("true"),
        Symbol::False => out.push_str("false"),
        Symbol::IntLit(v) => {
            let _ = write!(out, "{v}");
        }
        Symbol::RealLit(n, d) => {
            let _ = write!(out, "{n}/{d}");
        }
        Symbol::BvLit { width, value } => {
            let _ = write!(out, "(_ bv{value} {width})");
        }
        other => out.push_str(symbol_head(other)),
    }
}

fn symbol_head(sym: &Symbol) -> &'static str {
    use Symbol::*;
    match sym {
        And => "and",
        Or => "or",
        Not => "not",
        Implies => "=>",
        Xor => "xor",
        Eq => "=",
        Distinct => "distinct",
        Lt => "<",
        Le => "<=",
        Gt => ">",
        Ge => ">=",
        Add => "+",
        Sub => "-",
        Neg => "-",
        Mul => "*",
        Div => "/",
        IntDiv => "div",
        Mod => "mod",
        BvAdd => "bvadd",
        BvSub => "bvsub",
        BvNeg => "bvneg",
        BvMul => "bvmul",
        BvAnd => "bvand",
        BvOr => "bvor",
        BvXor => "bvxor",
        BvNot => "bvnot",
        BvShl => "bvshl",
        BvLshr => "bvlshr",
        BvAshr => "bvashr",
        BvConcat => "concat",
        BvExtract { .. } => "extract",
        BvSignExtend(_) => "sign_extend",
        BvZeroExtend(_) => "zero_extend",
        BvUlt => "bvult",
        BvUle => "bvule",
        BvUgt => "bvugt",
        BvUge => "bvuge",
        BvSlt => "bvslt",
        BvSle => "bvsle",
        BvSgt => "bvsgt",
        BvSge => "bvsge",
        Select => "select",
        Store => "store",
        Ite => "ite",
        UfRef(_) => "uf",
        _ => "?",
    }
}

trait DebugName {
    fn debug_name(self) -> String;
}

impl DebugName for crate::term::var::Variable {
    fn debug_name(self) -> String {
        use crate::term::var::Variable::*;
        match self {
            Free { name, .. } => name.to_string(),
            Bound { index, .. } => format!("#{index}"),
            StateVarInstance { sv, offset } => format!("{sv}@{offset}"),
            ConstStateVar { sv } => format!("{sv}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::store::HashconsStore;

    #[test]
    fn prints_arithmetic_as_sexpr() {
        let mut store = HashconsStore::new();
        let a = store.mk_int(1);
        let b = store.mk_int(2);
        let sum = store.mk_app(Symbol::Add, vec![a, b]).unwrap();
        assert_eq!(print_term(&store, sum), "(+ 1 2)");
    }
}
