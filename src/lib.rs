//! # nodegraph-core
//!
//! Front-end compilation core for a model checker targeting a synchronous
//! dataflow language. Consumes a type-checked syntax tree (produced by an
//! external parser and type checker) and lowers it into an intermediate
//! node graph suitable for encoding into a transition-system verification
//! backend.
//!
//! ## Module structure (dependency order)
//!
//! ```text
//! depgraph  → cone-of-influence over the generated transition system
//!   ↑
//! nodegen   → lowers normalized nodes into NodeRecords
//!   ↑
//! normalize → rewrites the AST: pre-guarding, call-argument lifting
//!   ↑
//! expr      → the (init, step) expression layer
//!   ↑
//! ast       → the type-checked input AST and typing context (stand-ins
//!             for the external parser/checker this core consumes)
//!   ↑
//! index_trie → typed index trie: the universal structured-value container
//!   ↑
//! term      → hash-consed terms, types, symbols, variables
//!   ↑
//! core, base → string interning, fresh-name counter, source positions
//! ```
//!
//! This crate does no parsing, no type checking, and no solving: its single
//! output is the [`nodegen::CompilerState`] data structure, described in
//! full in `spec.md` §3.

pub mod base;
pub mod core;

pub mod term;

pub mod index_trie;

pub mod expr;

pub mod ast;

pub mod normalize;

pub mod nodegen;

pub mod depgraph;

pub mod error;

pub use error::CoreError;
