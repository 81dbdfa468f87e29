//! Monotone counter for fresh-name generation.
//!
//! The normalizer mints a fresh, globally-unique name every time it lifts a
//! non-atomic `pre` argument, introduces an oracle, or records a call's
//! outputs (`spec.md` §4.4 rule 4). Names carry the counter's current value
//! as an integer prefix, which is enough to guarantee they never collide
//! with a source identifier (source identifiers cannot begin with a digit).
//!
//! The counter is shared (via `Rc<Cell<_>>`) rather than threaded as `&mut`
//! through the normalizer's recursion, mirroring the guidance in `spec.md`
//! §9: a concrete counter value, not ambient global state, but also not a
//! parameter every call site has to carry.

use std::cell::Cell;
use std::rc::Rc;

/// The kind of identifier a fresh name was minted for. Embedded in the name
/// itself so that downstream tooling can classify generated identifiers at a
/// glance (`spec.md` §4.4 rule 4: `"<n>_<kind>"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FreshKind {
    /// A local introduced to atomize a non-identifier `pre`/call argument.
    Glocal,
    /// An unconstrained oracle constant guarding an initially-unguarded `pre`.
    Oracle,
    /// The output(s) of a node call lifted out of expression position.
    Call,
    /// An oracle propagated through a contract-call instantiation.
    Poracle,
}

impl FreshKind {
    fn as_str(self) -> &'static str {
        match self {
            FreshKind::Glocal => "glocal",
            FreshKind::Oracle => "oracle",
            FreshKind::Call => "call",
            FreshKind::Poracle => "poracle",
        }
    }
}

/// A process-wide (per-compilation-run) monotone counter.
///
/// Cloning a `NameCounter` shares the same underlying cell: every clone
/// mints from the same sequence. This is deliberate — the normalizer and
/// node generator both need to mint names during the same run and must
/// never collide.
#[derive(Debug, Clone, Default)]
pub struct NameCounter {
    next: Rc<Cell<u64>>,
}

impl NameCounter {
    /// Create a counter starting at zero. Call once per compilation run;
    /// never reset a counter mid-run (`spec.md` §5, §9).
    pub fn new() -> Self {
        Self {
            next: Rc::new(Cell::new(0)),
        }
    }

    /// Mint a fresh name of the given kind, e.g. `"3_oracle"`.
    pub fn fresh(&self, kind: FreshKind) -> String {
        let n = self.next.get();
        self.next.set(n + 1);
        format!("{n}_{}", kind.as_str())
    }

    /// The next value that will be handed out, for diagnostics/tests.
    pub fn peek(&self) -> u64 {
        self.next.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mints_increasing_prefixes() {
        let counter = NameCounter::new();
        assert_eq!(counter.fresh(FreshKind::Oracle), "0_oracle");
        assert_eq!(counter.fresh(FreshKind::Glocal), "1_glocal");
        assert_eq!(counter.fresh(FreshKind::Call), "2_call");
    }

    #[test]
    fn clones_share_the_sequence() {
        let a = NameCounter::new();
        let b = a.clone();
        assert_eq!(a.fresh(FreshKind::Oracle), "0_oracle");
        assert_eq!(b.fresh(FreshKind::Oracle), "1_oracle");
    }

    #[test]
    fn independent_counters_do_not_share() {
        let a = NameCounter::new();
        let b = NameCounter::new();
        assert_eq!(a.fresh(FreshKind::Oracle), "0_oracle");
        assert_eq!(b.fresh(FreshKind::Oracle), "0_oracle");
    }
}
