//! Compile errors. Every kind is fatal: the first occurrence unwinds the
//! whole compilation through `Result`, and the CLI is responsible for
//! presenting it. The core performs no logging and flushes no partial
//! output on error.

use crate::ast::Provenance;
use crate::path::AttributePath;

/// All errors the semantic analyzer and lowering backend can raise.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompileError {
    /// A referenced path resolves in no scope on the parent chain.
    #[error("unbound name '{path}'{}", fmt_prov(.prov))]
    UnboundName {
        path: AttributePath,
        prov: Option<Provenance>,
    },

    /// The path exists but is private to a scope the reference is outside of.
    #[error("name '{path}' is hidden from this scope{}", fmt_prov(.prov))]
    HiddenName {
        path: AttributePath,
        prov: Option<Provenance>,
    },

    /// A capability was invoked on a value that does not implement it, or
    /// between two incompatible value kinds. No implicit promotion exists
    /// beyond the literal <-> score coercions of the value model.
    #[error("unsupported operation: cannot apply '{op}' to {left} and {right}")]
    UnsupportedOperation {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    /// A construct was asked for a slot it does not own, or Reference ran
    /// before Formalize populated the required state.
    #[error("malformed construct: {detail}")]
    MalformedConstruct { detail: String },
}

impl CompileError {
    pub fn malformed(detail: impl Into<String>) -> Self {
        CompileError::MalformedConstruct {
            detail: detail.into(),
        }
    }
}

fn fmt_prov(prov: &Option<Provenance>) -> String {
    match prov {
        Some(p) => format!(" at {}:{}", p.file, p.line),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbound_name_message() {
        let err = CompileError::UnboundName {
            path: AttributePath::from("ns.x"),
            prov: Some(Provenance {
                file: "main.sap".into(),
                line: 7,
            }),
        };
        assert_eq!(err.to_string(), "unbound name 'ns.x' at main.sap:7");
    }

    #[test]
    fn test_unsupported_operation_message() {
        let err = CompileError::UnsupportedOperation {
            op: "+",
            left: "string",
            right: "score",
        };
        assert_eq!(
            err.to_string(),
            "unsupported operation: cannot apply '+' to string and score"
        );
    }
}
