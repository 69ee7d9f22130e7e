pub mod ast;
pub mod builtins;
pub mod config;
pub mod diagnostic;
pub mod engine;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod rule;
pub mod validate;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{BinOp, Expr, ExprKind, Token, TokenKind, UnaryOp};
pub use builtins::{BuiltinFn, FunctionRegistry};
pub use config::Limits;
pub use diagnostic::{Diagnostic, DiagnosticKind, Position, Stage};
pub use engine::Engine;
pub use evaluator::{EvalContext, Evaluator};
pub use lexer::Lexer;
pub use parser::Parser;
pub use rule::{Rule, RuleOutcome, RuleSet};
pub use validate::{Report, Validation};
pub use value::{Value, ValueKind};

/// Parses `source` with the default engine.
pub fn parse(source: &str) -> Result<Expr, Diagnostic> {
    Engine::global().parse(source)
}

/// Evaluates a parsed expression with the standard built-ins.
pub fn evaluate(expr: &Expr, context: &EvalContext) -> Result<Value, Diagnostic> {
    Engine::global().evaluate(expr, context)
}

/// Parses and evaluates `source` with the default engine.
pub fn run(source: &str, context: &EvalContext) -> Result<Value, Diagnostic> {
    Engine::global().run(source, context)
}

pub fn validate(source: &str) -> Validation {
    Engine::global().validate(source)
}
