//! Error kinds for the compilation core (`spec.md` §7).
//!
//! `TypeMismatch` and `InvariantViolation` are modeled as fatal: the
//! constructor or normalization step that detects them aborts the whole
//! compilation run. The remaining kinds carry a [`Span`] and the name of the
//! node being compiled, so a caller compiling a forest of nodes can catch
//! one, skip that node, and continue with its siblings — `spec.md` §7 calls
//! this out explicitly as the one place partial progress is allowed.

use std::fmt;

use thiserror::Error;

use crate::base::Span;

/// The five error kinds named by `spec.md` §7.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Operand types disagree with a symbol's signature (`spec.md` §4.1).
    #[error("type mismatch: {message}")]
    TypeMismatch {
        message: String,
        span: Option<Span>,
    },

    /// Two index tries have incompatible key shapes (`spec.md` §4.2, §4.5).
    #[error("shape mismatch at {}: {mismatch}", DisplayOptSpan(*span))]
    ShapeMismatch {
        mismatch: ShapeMismatchDetail,
        span: Option<Span>,
    },

    /// A reference points to an identifier neither declared nor generated
    /// (`spec.md` §4.8, §9 Open Questions).
    #[error("unbound identifier '{name}' in node '{node}'")]
    UnboundIdentifier {
        name: String,
        node: String,
        span: Option<Span>,
    },

    /// A normalization postcondition was violated, e.g. `pre` applied to a
    /// non-atomic subterm that reached the node generator unlifted.
    #[error("invariant violation in node '{node}': {message}")]
    InvariantViolation { node: String, message: String },

    /// A language feature that an earlier pass should have eliminated is
    /// still present when the node generator reaches it.
    #[error("unsupported construct '{construct}' in node '{node}'")]
    UnsupportedConstruct {
        construct: String,
        node: String,
        span: Option<Span>,
    },
}

/// Detail attached to a [`CoreError::ShapeMismatch`]: the offending index
/// tags on each side, per `spec.md` §4.8 ("report position and offending
/// index tags").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMismatchDetail {
    pub left_only: Vec<String>,
    pub right_only: Vec<String>,
}

impl fmt::Display for ShapeMismatchDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "left has {:?} not in right, right has {:?} not in left",
            self.left_only, self.right_only
        )
    }
}

struct DisplayOptSpan(Option<Span>);

impl fmt::Display for DisplayOptSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(span) => write!(f, "{}:{}", span.start.line, span.start.column),
            None => write!(f, "<unknown>"),
        }
    }
}

impl CoreError {
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
            span: None,
        }
    }

    pub fn shape_mismatch(left_only: Vec<String>, right_only: Vec<String>) -> Self {
        Self::ShapeMismatch {
            mismatch: ShapeMismatchDetail {
                left_only,
                right_only,
            },
            span: None,
        }
    }

    pub fn unbound(name: impl Into<String>, node: impl Into<String>) -> Self {
        Self::UnboundIdentifier {
            name: name.into(),
            node: node.into(),
            span: None,
        }
    }

    pub fn invariant(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            node: node.into(),
            message: message.into(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        match &mut self {
            CoreError::TypeMismatch { span: s, .. }
            | CoreError::ShapeMismatch { span: s, .. }
            | CoreError::UnboundIdentifier { span: s, .. }
            | CoreError::UnsupportedConstruct { span: s, .. } => *s = Some(span),
            CoreError::InvariantViolation { .. } => {}
        }
        self
    }

    /// `TypeMismatch` and `InvariantViolation` abort the whole run; the
    /// others abort only the node currently being compiled (`spec.md` §7).
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(
            self,
            CoreError::TypeMismatch { .. } | CoreError::InvariantViolation { .. }
        )
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_mismatch_and_invariant_are_fatal() {
        assert!(CoreError::type_mismatch("x").is_fatal_to_run());
        assert!(CoreError::invariant("N", "x").is_fatal_to_run());
    }

    #[test]
    fn shape_mismatch_and_unbound_are_not_fatal() {
        assert!(!CoreError::shape_mismatch(vec![], vec![]).is_fatal_to_run());
        assert!(!CoreError::unbound("x", "N").is_fatal_to_run());
    }
}
