//! [`Trie`]: a persistent map from index paths to values (`spec.md` §4.2).
//!
//! Backed by a `BTreeMap<Vec<IndexTag>, V>`: `Vec<T: Ord>` is lexicographic
//! by derived `Ord`, which is exactly "key paths ordered lexicographically
//! by the total order on tags" — no bespoke tree-walking needed.

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};
use crate::index_trie::tag::IndexTag;

pub type Path = Vec<IndexTag>;

#[derive(Debug, Clone)]
pub struct Trie<V> {
    entries: BTreeMap<Path, V>,
}

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<V: Clone> Trie<V> {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn singleton(path: Path, v: V) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(path, v);
        Self { entries }
    }

    pub fn add(&self, path: Path, v: V) -> Self {
        let mut entries = self.entries.clone();
        entries.insert(path, v);
        Self { entries }
    }

    pub fn remove(&self, path: &[IndexTag]) -> Self {
        let mut entries = self.entries.clone();
        entries.remove(path);
        Self { entries }
    }

    pub fn find(&self, path: &[IndexTag]) -> Option<&V> {
        self.entries.get(path)
    }

    pub fn find_prefix(&self, prefix: &[IndexTag]) -> Vec<(&Path, &V)> {
        self.entries
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .collect()
    }

    pub fn mem_prefix(&self, prefix: &[IndexTag]) -> bool {
        self.entries.keys().any(|path| path.starts_with(prefix))
    }

    /// Bindings in key order (`BTreeMap` iteration is already sorted).
    pub fn bindings(&self) -> Vec<(&Path, &V)> {
        self.entries.iter().collect()
    }

    pub fn values(&self) -> Vec<&V> {
        self.entries.values().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn fold<R>(&self, init: R, mut f: impl FnMut(R, &Path, &V) -> R) -> R {
        let mut acc = init;
        for (path, v) in self.entries.iter() {
            acc = f(acc, path, v);
        }
        acc
    }

    pub fn map<V2: Clone>(&self, mut f: impl FnMut(&Path, &V) -> V2) -> Trie<V2> {
        let entries = self
            .entries
            .iter()
            .map(|(path, v)| (path.clone(), f(path, v)))
            .collect();
        Trie { entries }
    }

    fn shape_mismatch_against(&self, other: &Trie<impl Clone>) -> Option<CoreError> {
        let left_keys: std::collections::BTreeSet<&Path> = self.entries.keys().collect();
        let right_keys: std::collections::BTreeSet<&Path> = other.entries.keys().collect();
        if left_keys == right_keys {
            return None;
        }
        let left_only = left_keys
            .difference(&right_keys)
            .map(|p| format!("{p:?}"))
            .collect();
        let right_only = right_keys
            .difference(&left_keys)
            .map(|p| format!("{p:?}"))
            .collect();
        Some(CoreError::shape_mismatch(left_only, right_only))
    }

    /// `spec.md` §4.2/§4.5: requires identical key sets, fails with
    /// [`CoreError::ShapeMismatch`] otherwise.
    pub fn map2<W: Clone, R: Clone>(
        &self,
        other: &Trie<W>,
        mut f: impl FnMut(&Path, &V, &W) -> R,
    ) -> CoreResult<Trie<R>> {
        if let Some(err) = self.shape_mismatch_against(other) {
            return Err(err);
        }
        let entries = self
            .entries
            .iter()
            .map(|(path, v)| {
                let w = other.entries.get(path).expect("key sets checked equal above");
                (path.clone(), f(path, v, w))
            })
            .collect();
        Ok(Trie { entries })
    }

    pub fn fold2<W: Clone, R>(
        &self,
        other: &Trie<W>,
        init: R,
        mut f: impl FnMut(R, &Path, &V, &W) -> R,
    ) -> CoreResult<R> {
        if let Some(err) = self.shape_mismatch_against(other) {
            return Err(err);
        }
        let mut acc = init;
        for (path, v) in self.entries.iter() {
            let w = other.entries.get(path).expect("key sets checked equal above");
            acc = f(acc, path, v, w);
        }
        Ok(acc)
    }

    /// Greatest [`IndexTag::ListIndex`] occupying the first path segment at
    /// the root, if any (`spec.md` §4.2 `top_max_index`).
    pub fn top_max_index(&self) -> Option<u32> {
        self.entries
            .keys()
            .filter_map(|path| path.first().and_then(IndexTag::as_list_index))
            .max()
    }

    /// The scope segment list a leaf's path contributes to its state
    /// variable's name (`spec.md` §4.2 `mk_scope_for_index`).
    pub fn mk_scope_for_index(path: &[IndexTag]) -> Vec<String> {
        path.iter().map(IndexTag::scope_segment).collect()
    }

    /// Entries whose leading path segment is an array index
    /// (`spec.md` §4.2 `filter_array_indices`).
    pub fn filter_array_indices(&self) -> Self {
        let entries = self
            .entries
            .iter()
            .filter(|(path, _)| path.first().is_some_and(IndexTag::is_array_index))
            .map(|(path, v)| (path.clone(), v.clone()))
            .collect();
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IStr;

    fn path(i: u32) -> Path {
        vec![IndexTag::TupleIndex(i)]
    }

    #[test]
    fn singleton_and_find() {
        let t = Trie::singleton(path(0), 42);
        assert_eq!(t.find(&path(0)), Some(&42));
        assert_eq!(t.find(&path(1)), None);
    }

    #[test]
    fn bindings_are_key_ordered() {
        let t = Trie::empty().add(path(2), "b").add(path(0), "a").add(path(1), "z");
        let keys: Vec<u32> = t
            .bindings()
            .into_iter()
            .map(|(p, _)| p[0].as_list_index().unwrap_or(999))
            .collect();
        // TupleIndex isn't a ListIndex, but ordering on the path itself is
        // still lexicographic; check via raw path comparison instead.
        let paths: Vec<&Path> = t.bindings().into_iter().map(|(p, _)| p).collect();
        assert!(paths.windows(2).all(|w| w[0] <= w[1]));
        let _ = keys;
    }

    #[test]
    fn fold2_shape_law() {
        let a = Trie::singleton(path(0), 1).add(path(1), 2);
        let b = Trie::singleton(path(0), 10).add(path(1), 20);
        let sum = a.fold2(&b, 0, |acc, _, x, y| acc + x + y).unwrap();
        assert_eq!(sum, 33);

        let c = Trie::singleton(path(0), 1);
        assert!(a.fold2(&c, 0, |acc, _, _, _| acc).is_err());
    }

    #[test]
    fn map2_shape_mismatch_reports_offending_tags() {
        let a = Trie::singleton(vec![IndexTag::RecordIndex(IStr::from("x"))], 1);
        let b = Trie::singleton(vec![IndexTag::RecordIndex(IStr::from("y"))], 1);
        let err = a.map2(&b, |_, l, r| l + r).unwrap_err();
        match err {
            CoreError::ShapeMismatch { mismatch, .. } => {
                assert!(!mismatch.left_only.is_empty());
                assert!(!mismatch.right_only.is_empty());
            }
            _ => panic!("expected ShapeMismatch"),
        }
    }

    #[test]
    fn filter_array_indices_keeps_only_array_leading_paths() {
        let t = Trie::empty()
            .add(vec![IndexTag::ArrayIntIndex(0)], "arr")
            .add(vec![IndexTag::TupleIndex(0)], "tup");
        let filtered = t.filter_array_indices();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.values(), vec![&"arr"]);
    }

    #[test]
    fn top_max_index_finds_greatest_root_list_index() {
        let t = Trie::empty()
            .add(vec![IndexTag::ListIndex(3)], "a")
            .add(vec![IndexTag::ListIndex(1)], "b");
        assert_eq!(t.top_max_index(), Some(3));
    }
}
