//! Compiles a declared [`TypeExpr`] into an [`crate::index_trie::Trie`] of
//! scalar [`TypeId`]s (`spec.md` §4.5 step 2: "compile its type into an
//! index trie of scalar types").

use std::collections::HashMap;

use crate::ast::TypeExpr;
use crate::core::IStr;
use crate::error::{CoreError, CoreResult};
use crate::index_trie::{IndexTag, Trie};
use crate::term::ids::TypeId;
use crate::term::store::HashconsStore;
use crate::term::ty::Type;

/// Array types are kept as one opaque leaf (a genuine SMT array, indexed via
/// `select`/`store`) rather than flattened element-by-element: a flattening
/// would require a statically known length, which array-variable-indexed
/// types don't have.
pub fn compile_type(
    store: &mut HashconsStore,
    aliases: &HashMap<IStr, TypeExpr>,
    ty: &TypeExpr,
) -> CoreResult<Trie<TypeId>> {
    match ty {
        TypeExpr::Bool => Ok(Trie::singleton(vec![], store.types.intern(Type::Bool))),
        TypeExpr::Int => Ok(Trie::singleton(vec![], store.types.intern(Type::Int))),
        TypeExpr::Real => Ok(Trie::singleton(vec![], store.types.intern(Type::Real))),
        TypeExpr::Bv(w) => Ok(Trie::singleton(vec![], store.types.intern(Type::Bv(*w)))),
        TypeExpr::IntRange(lo, hi) => Ok(Trie::singleton(vec![], store.types.intern(Type::IntRange(*lo, *hi)))),
        TypeExpr::Array(idx, elem) => {
            let idx_trie = compile_type(store, aliases, idx)?;
            let elem_trie = compile_type(store, aliases, elem)?;
            let idx_ty = *idx_trie.find(&[]).ok_or_else(|| CoreError::type_mismatch("array index type must be scalar"))?;
            let elem_ty = *elem_trie.find(&[]).ok_or_else(|| CoreError::type_mismatch("array element type must be scalar"))?;
            Ok(Trie::singleton(vec![], store.types.intern(Type::Array(idx_ty, elem_ty))))
        }
        TypeExpr::Record(fields) => {
            let mut result = Trie::empty();
            for (name, field_ty) in fields {
                let sub = compile_type(store, aliases, field_ty)?;
                for (path, leaf) in sub.bindings() {
                    let mut full_path = vec![IndexTag::RecordIndex(name.clone())];
                    full_path.extend(path.iter().cloned());
                    result = result.add(full_path, *leaf);
                }
            }
            Ok(result)
        }
        TypeExpr::Tuple(elems) => {
            let mut result = Trie::empty();
            for (i, elem_ty) in elems.iter().enumerate() {
                let sub = compile_type(store, aliases, elem_ty)?;
                for (path, leaf) in sub.bindings() {
                    let mut full_path = vec![IndexTag::TupleIndex(i as u32)];
                    full_path.extend(path.iter().cloned());
                    result = result.add(full_path, *leaf);
                }
            }
            Ok(result)
        }
        TypeExpr::Named(name) => match aliases.get(name) {
            Some(resolved) => compile_type(store, aliases, &resolved.clone()),
            None => Ok(Trie::singleton(vec![], store.types.intern(Type::Abstract(name.clone())))),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_compiles_to_two_leaves() {
        let mut store = HashconsStore::new();
        let ty = TypeExpr::Record(vec![
            ("a".into(), TypeExpr::Int),
            ("b".into(), TypeExpr::Bool),
        ]);
        let trie = compile_type(&mut store, &HashMap::new(), &ty).unwrap();
        assert_eq!(trie.len(), 2);
        let a_ty = *trie.find(&[IndexTag::RecordIndex("a".into())]).unwrap();
        assert_eq!(store.types.get(a_ty), &Type::Int);
    }
}
