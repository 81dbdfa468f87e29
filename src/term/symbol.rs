//! [`Symbol`]: the tagged enumeration of operator and literal kinds named by
//! `spec.md` §3. Symbols are themselves hash-consed — interning gives every
//! distinct symbol value a single canonical [`SymId`], so two `App`
//! term nodes built from "the same" operator always share one child slot.

use crate::core::IStr;
use crate::term::ids::SymId;

/// Boolean connectives, arithmetic, bit-vector, comparison, literal,
/// structural (select/store/ite/distinct), and uninterpreted-function
/// symbols, plus the two tagging symbols used by `mk_named` and
/// interpolation-group annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    // -- boolean connectives --
    True,
    False,
    And,
    Or,
    Not,
    Implies,
    Xor,

    // -- comparison --
    Eq,
    Distinct,
    Lt,
    Le,
    Gt,
    Ge,

    // -- arithmetic --
    Add,
    Sub,
    Neg,
    Mul,
    Div,
    IntDiv,
    Mod,

    // -- literals --
    IntLit(i64),
    /// Exact rational: `numerator / denominator`, `denominator > 0`.
    RealLit(i64, i64),
    BvLit { width: u32, value: u64 },

    // -- bit-vector ops --
    BvAdd,
    BvSub,
    BvNeg,
    BvMul,
    BvAnd,
    BvOr,
    BvXor,
    BvNot,
    BvShl,
    BvLshr,
    BvAshr,
    BvConcat,
    BvExtract { hi: u32, lo: u32 },
    BvSignExtend(u32),
    BvZeroExtend(u32),
    BvUlt,
    BvUle,
    BvUgt,
    BvUge,
    BvSlt,
    BvSle,
    BvSgt,
    BvSge,

    // -- array / ite / functions --
    Select,
    Store,
    Ite,
    /// Reference to an uninterpreted function by name.
    UfRef(IStr),

    // -- tagging --
    /// `mk_named` tag: a fresh integer in the reserved "t" namespace.
    Named(u64),
    InterpGroup(u64),
}

impl Symbol {
    /// Number of term-children an application of this symbol expects, when
    /// fixed. Variadic symbols (`And`, `Or`, `Distinct`) return `None`.
    pub fn fixed_arity(&self) -> Option<usize> {
        use Symbol::*;
        match self {
            True | False | IntLit(_) | RealLit(..) | BvLit { .. } | Named(_) | InterpGroup(_) => {
                Some(0)
            }
            Not | Neg | BvNeg | BvNot | BvExtract { .. } | BvSignExtend(_) | BvZeroExtend(_) => {
                Some(1)
            }
            And | Or | Distinct => None,
            Select => Some(2),
            Store => Some(3),
            Ite => Some(3),
            UfRef(_) => None,
            _ => Some(2),
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Symbol::True | Symbol::False | Symbol::IntLit(_) | Symbol::RealLit(..) | Symbol::BvLit { .. }
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Symbol::Eq | Symbol::Lt | Symbol::Le | Symbol::Gt | Symbol::Ge
        )
    }

    /// The comparison obtained by swapping the two operands, used by
    /// `negate_simplify` to cancel a negation through a flip rather than
    /// wrapping in `Not` (`spec.md` §4.1).
    pub fn flip_comparison(&self) -> Option<Symbol> {
        match self {
            Symbol::Lt => Some(Symbol::Ge),
            Symbol::Le => Some(Symbol::Gt),
            Symbol::Gt => Some(Symbol::Le),
            Symbol::Ge => Some(Symbol::Lt),
            _ => None,
        }
    }
}

/// Interning table mapping [`Symbol`] values to a canonical [`SymId`].
#[derive(Debug, Default, Clone)]
pub struct SymStore {
    arena: Vec<Symbol>,
    table: rustc_hash::FxHashMap<Symbol, SymId>,
}

impl SymStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, sym: Symbol) -> SymId {
        if let Some(id) = self.table.get(&sym) {
            return *id;
        }
        let id = SymId::from_index(self.arena.len());
        self.arena.push(sym.clone());
        self.table.insert(sym, id);
        id
    }

    pub fn get(&self, id: SymId) -> &Symbol {
        &self.arena[id.index()]
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_dedupes_equal_symbols() {
        let mut store = SymStore::new();
        let a = store.intern(Symbol::IntLit(3));
        let b = store.intern(Symbol::IntLit(3));
        let c = store.intern(Symbol::IntLit(4));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn flip_comparison_is_an_involution() {
        for sym in [Symbol::Lt, Symbol::Le, Symbol::Gt, Symbol::Ge] {
            let flipped = sym.flip_comparison().unwrap();
            assert_eq!(flipped.flip_comparison().unwrap(), sym);
        }
    }
}
