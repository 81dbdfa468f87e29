//! Foundation types used throughout the compilation core.
//!
//! This module has no dependencies on other crate modules.

mod position;

pub use position::{Position, Span};
