//! The node generator (`spec.md` §4.5): turns a normalized [`crate::ast::NodeDecl`]
//! plus its [`crate::normalize::GeneratedIdentifiers`] into a [`NodeRecord`]
//! of state variables, equations, calls, and contract structure.

pub mod compiler_state;
pub mod generator;
pub mod identifier_map;
pub mod node_record;
pub mod state_var;
pub mod types;

pub use compiler_state::CompilerState;
pub use generator::NodeGenerator;
pub use identifier_map::{Bound, IdentifierMap};
pub use node_record::{
    CallRecord, Contract, ContractSvar, ContractSvarKind, EquationRecord, Mode, NodeRecord,
    NodeRecordFlags, Opacity, PropertyKind,
};
pub use state_var::{StateVarArena, StateVariable, StateVarSource};
pub use types::compile_type;
