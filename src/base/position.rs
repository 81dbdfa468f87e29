//! Source positions carried alongside AST nodes and state variables.
//!
//! `Span`s are the only location information this crate keeps: a
//! `(start, end)` pair of line/column `Position`s, attached to declarations,
//! equations, and diagnostics so a `CoreError` can report where a failure
//! happened. This crate has no parser of its own, so a `Span` is opaque
//! input data handed down from the upstream syntax tree, not derived here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// A line/column position (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}
