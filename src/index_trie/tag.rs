//! [`IndexTag`]: one segment of a structured index path (`spec.md` §4.2).
//!
//! Variant declaration order doubles as the "tag kind first" ordering the
//! derived [`Ord`] needs; natural order inside a kind falls out of each
//! payload's own `Ord`.

use crate::core::IStr;
use crate::term::ids::TermId;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexTag {
    RecordIndex(IStr),
    TupleIndex(u32),
    ListIndex(u32),
    ArrayIntIndex(i64),
    /// A variable array index: the indexing expression itself, identified by
    /// its hash-consed tag so equal index expressions compare equal.
    ArrayVarIndex(TermId),
    AbstractTypeIndex(IStr),
}

impl IndexTag {
    /// The naming segment this tag contributes to a state variable's scope
    /// (`spec.md` §4.2 `mk_scope_for_index`).
    pub fn scope_segment(&self) -> String {
        match self {
            IndexTag::RecordIndex(name) => name.to_string(),
            IndexTag::TupleIndex(i) => i.to_string(),
            IndexTag::ListIndex(i) => i.to_string(),
            IndexTag::ArrayIntIndex(i) => i.to_string(),
            IndexTag::ArrayVarIndex(t) => format!("{t}"),
            IndexTag::AbstractTypeIndex(name) => name.to_string(),
        }
    }

    pub fn is_array_index(&self) -> bool {
        matches!(self, IndexTag::ArrayIntIndex(_) | IndexTag::ArrayVarIndex(_))
    }

    pub fn as_list_index(&self) -> Option<u32> {
        match self {
            IndexTag::ListIndex(i) => Some(*i),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_kind_first_then_natural() {
        let mut tags = vec![
            IndexTag::TupleIndex(1),
            IndexTag::RecordIndex(IStr::from("b")),
            IndexTag::RecordIndex(IStr::from("a")),
            IndexTag::TupleIndex(0),
        ];
        tags.sort();
        assert_eq!(
            tags,
            vec![
                IndexTag::RecordIndex(IStr::from("a")),
                IndexTag::RecordIndex(IStr::from("b")),
                IndexTag::TupleIndex(0),
                IndexTag::TupleIndex(1),
            ]
        );
    }
}
