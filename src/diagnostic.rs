use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::value::ValueKind;

/// A location in the source text.
///
/// `offset` counts characters from the start of the source (0-based);
/// `line` and `column` are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(offset: usize, line: usize, column: usize) -> Self {
        Position {
            offset,
            line,
            column,
        }
    }

    /// The position of the first character of any source.
    pub fn start() -> Self {
        Position::new(0, 1, 1)
    }

    /// Computes the line and column of the character at `offset` in `source`.
    ///
    /// Offsets past the end resolve to the position just after the last character.
    pub fn locate(source: &str, offset: usize) -> Self {
        let mut position = Position::start();
        for ch in source.chars().take(offset) {
            position.offset += 1;
            if ch == '\n' {
                position.line += 1;
                position.column = 1;
            } else {
                position.column += 1;
            }
        }
        position
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The pipeline stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Lex,
    Parse,
    Eval,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Lex => write!(f, "lexical"),
            Stage::Parse => write!(f, "syntax"),
            Stage::Eval => write!(f, "evaluation"),
        }
    }
}

/// Everything that can go wrong while lexing, parsing or evaluating.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagnosticKind {
    // Lexical
    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("invalid escape sequence `\\{escape}`")]
    InvalidEscape { escape: char },

    #[error("unrecognized character `{character}`")]
    UnrecognizedCharacter { character: char },

    #[error("number literal is too large to represent ({digits} digits)")]
    NumberOutOfRange { digits: usize },

    // Syntactic
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    #[error("expected {expected}, found end of input")]
    UnexpectedEndOfInput { expected: String },

    #[error("unexpected trailing input: {found}")]
    UnexpectedTrailingInput { found: String },

    #[error("expression is {length} characters long, the limit is {limit}")]
    SourceTooLong { length: usize, limit: usize },

    #[error("expression nesting exceeds the limit of {limit}")]
    NestingTooDeep { limit: usize },

    // Runtime
    #[error("unbound identifier `{name}`")]
    UnboundIdentifier { name: String },

    #[error("record has no field `{field}`")]
    UnknownField { field: String },

    #[error("unknown function `{name}`")]
    UnknownFunction { name: String },

    #[error("function `{function}` expects {expected} argument(s), got {found}")]
    ArityMismatch {
        function: String,
        expected: String,
        found: usize,
    },

    #[error("type mismatch: `{operation}` cannot be applied to {}", join_kinds(.operands))]
    TypeMismatch {
        operation: String,
        operands: Vec<ValueKind>,
    },

    #[error("division by zero")]
    DivisionByZero,

    #[error("index {index} is out of range for a list of length {length}")]
    IndexOutOfRange { index: f64, length: usize },

    #[error("invalid argument to `{function}`: {message}")]
    InvalidArgument { function: String, message: String },
}

fn join_kinds(kinds: &[ValueKind]) -> String {
    kinds
        .iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(" and ")
}

impl DiagnosticKind {
    /// Shorthand for a [`DiagnosticKind::TypeMismatch`].
    pub fn type_mismatch(operation: impl Into<String>, operands: &[ValueKind]) -> Self {
        DiagnosticKind::TypeMismatch {
            operation: operation.into(),
            operands: operands.to_vec(),
        }
    }

    /// The stage this kind of problem belongs to.
    pub fn stage(&self) -> Stage {
        use DiagnosticKind::*;
        match self {
            UnterminatedString
            | InvalidEscape { .. }
            | UnrecognizedCharacter { .. }
            | NumberOutOfRange { .. } => Stage::Lex,
            UnexpectedToken { .. }
            | UnexpectedEndOfInput { .. }
            | UnexpectedTrailingInput { .. }
            | SourceTooLong { .. }
            | NestingTooDeep { .. } => Stage::Parse,
            _ => Stage::Eval,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        use DiagnosticKind::*;
        match self {
            UnterminatedString => "DSL_UNTERMINATED_STRING",
            InvalidEscape { .. } => "DSL_INVALID_ESCAPE",
            UnrecognizedCharacter { .. } => "DSL_UNRECOGNIZED_CHARACTER",
            NumberOutOfRange { .. } => "DSL_NUMBER_OUT_OF_RANGE",
            UnexpectedToken { .. } => "DSL_UNEXPECTED_TOKEN",
            UnexpectedEndOfInput { .. } => "DSL_UNEXPECTED_END_OF_INPUT",
            UnexpectedTrailingInput { .. } => "DSL_UNEXPECTED_TRAILING_INPUT",
            SourceTooLong { .. } => "DSL_SOURCE_TOO_LONG",
            NestingTooDeep { .. } => "DSL_NESTING_TOO_DEEP",
            UnboundIdentifier { .. } => "DSL_UNBOUND_IDENTIFIER",
            UnknownField { .. } => "DSL_UNKNOWN_FIELD",
            UnknownFunction { .. } => "DSL_UNKNOWN_FUNCTION",
            ArityMismatch { .. } => "DSL_ARITY_MISMATCH",
            TypeMismatch { .. } => "DSL_TYPE_MISMATCH",
            DivisionByZero => "DSL_DIVISION_BY_ZERO",
            IndexOutOfRange { .. } => "DSL_INDEX_OUT_OF_RANGE",
            InvalidArgument { .. } => "DSL_INVALID_ARGUMENT",
        }
    }
}

/// A positioned error produced by any stage of the engine.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} error at {position}: {kind}", .kind.stage())]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub position: Position,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, position: Position) -> Self {
        Diagnostic { kind, position }
    }

    pub fn stage(&self) -> Stage {
        self.kind.stage()
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Up to 20 characters of `source` starting at this diagnostic's position.
    pub fn near(&self, source: &str) -> String {
        source.chars().skip(self.position.offset).take(20).collect()
    }
}
