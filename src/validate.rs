use serde::Serialize;

use crate::{
    diagnostic::{Diagnostic, Position, Stage},
    engine::Engine,
    lexer::lexical_errors,
};

/// Result of checking a source without evaluating it.
///
/// Serializes to the shape hosts return from a "validate rule" endpoint:
///
/// ```json
/// {
///   "is_valid": false,
///   "normalized": null,
///   "node_count": 0,
///   "errors": [
///     {"stage": "parse", "code": "DSL_UNEXPECTED_END_OF_INPUT",
///      "message": "expected an expression, found end of input",
///      "position": {"offset": 8, "line": 1, "column": 9}, "near": ""}
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Validation {
    pub is_valid: bool,
    /// Canonical rendering of the expression, when valid
    pub normalized: Option<String>,
    /// Number of nodes in the parsed tree, 0 when invalid
    pub node_count: usize,
    pub errors: Vec<Report>,
}

/// One problem found by [`Validation`], detached from the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub stage: Stage,
    pub code: &'static str,
    pub message: String,
    pub position: Position,
    /// Source text starting at `position`
    pub near: String,
}

impl Report {
    pub fn new(diagnostic: &Diagnostic, source: &str) -> Self {
        Report {
            stage: diagnostic.stage(),
            code: diagnostic.code(),
            message: diagnostic.message(),
            position: diagnostic.position,
            near: diagnostic.near(source),
        }
    }
}

impl Validation {
    /// Reports every lexical error in one pass; when there are none, parses
    /// and reports the syntax error, if any.
    pub fn check(engine: &Engine, source: &str) -> Self {
        let invalid = |errors: Vec<Report>| Validation {
            is_valid: false,
            normalized: None,
            node_count: 0,
            errors,
        };

        if let Err(too_long) = engine.check_length(source) {
            return invalid(vec![Report::new(&too_long, source)]);
        }

        let lexical = lexical_errors(source);
        if !lexical.is_empty() {
            return invalid(lexical.iter().map(|d| Report::new(d, source)).collect());
        }

        match engine.parse(source) {
            Ok(expr) => Validation {
                is_valid: true,
                normalized: Some(expr.to_string()),
                node_count: expr.node_count(),
                errors: vec![],
            },
            Err(diagnostic) => invalid(vec![Report::new(&diagnostic, source)]),
        }
    }
}
