//! Foundation utilities shared by every compilation stage: string interning
//! and the process-wide fresh-name counter.
//!
//! This module has no dependencies on other crate modules.

pub mod fresh;
pub mod interner;

pub use fresh::NameCounter;
pub use interner::IStr;
