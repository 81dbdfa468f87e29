//! [`CompilerState`]: the persistent accumulator threaded across a whole
//! compilation run (`spec.md` §3 "Compiler State").

use std::collections::HashMap;

use crate::ast::TypeExpr;
use crate::core::IStr;
use crate::nodegen::identifier_map::Bound;
use crate::term::ids::{StateVarId, TermId};

use super::node_record::NodeRecord;

#[derive(Debug, Default, Clone)]
pub struct CompilerState {
    /// Newest first, per `spec.md` §3.
    pub nodes: Vec<NodeRecord>,
    pub type_aliases: HashMap<IStr, TypeExpr>,
    pub free_constants: Vec<(IStr, TermId)>,
    pub other_constants: HashMap<IStr, TermId>,
    pub bounds: HashMap<StateVarId, Vec<Bound>>,
    pub global_constraints: Vec<TermId>,
}

impl CompilerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_node(&mut self, node: NodeRecord) {
        self.nodes.insert(0, node);
    }

    pub fn find_node(&self, name: &str) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| n.name.as_ref() == name)
    }
}
