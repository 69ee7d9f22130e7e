use std::sync::LazyLock;

use log::{debug, trace};

use crate::{
    ast::Expr,
    builtins::FunctionRegistry,
    config::Limits,
    diagnostic::{Diagnostic, DiagnosticKind, Position},
    evaluator::{EvalContext, Evaluator},
    lexer::Lexer,
    parser::Parser,
    validate::Validation,
    value::Value,
};

/// A configured instance of the language: a function registry plus limits.
///
/// An engine is immutable once built and can be shared freely between threads.
///
/// # Examples
///
/// ```
/// use rule_dsl::{Engine, EvalContext, Value};
///
/// let engine = Engine::new();
/// let context = EvalContext::new().with("amount", 1500);
///
/// let result = engine.run("amount > 1000", &context).unwrap();
/// assert_eq!(result, Value::Boolean(true));
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    registry: FunctionRegistry,
    limits: Limits,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

static DEFAULT_ENGINE: LazyLock<Engine> = LazyLock::new(Engine::new);

impl Engine {
    /// Standard built-ins and default limits.
    pub fn new() -> Self {
        Engine {
            registry: FunctionRegistry::standard(),
            limits: Limits::default(),
        }
    }

    /// The process-wide engine used by the free functions of this crate.
    pub fn global() -> &'static Engine {
        &DEFAULT_ENGINE
    }

    pub fn with_registry(mut self, registry: FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub(crate) fn check_length(&self, source: &str) -> Result<(), Diagnostic> {
        let limit = self.limits.max_source_len;
        // Only count as far as needed to know the limit is exceeded
        if source.chars().nth(limit).is_some() {
            let length = source.chars().count();
            debug!("rejecting source of {} characters (limit {})", length, limit);
            return Err(Diagnostic::new(
                DiagnosticKind::SourceTooLong { length, limit },
                Position::locate(source, limit),
            ));
        }
        Ok(())
    }

    /// Lexes and parses `source`, returning the first diagnostic encountered.
    pub fn parse(&self, source: &str) -> Result<Expr, Diagnostic> {
        self.check_length(source)?;
        let result = Parser::new(Lexer::new(source))
            .and_then(|parser| parser.with_max_depth(self.limits.max_depth).parse());
        match &result {
            Ok(expr) => debug!("parsed {:?} into {} nodes", source, expr.node_count()),
            Err(diagnostic) => debug!("failed to parse {:?}: {}", source, diagnostic),
        }
        result
    }

    pub fn evaluate(&self, expr: &Expr, context: &EvalContext) -> Result<Value, Diagnostic> {
        let result = Evaluator::new(&self.registry).evaluate(expr, context);
        trace!("evaluated `{}` -> {:?}", expr, result);
        result
    }

    /// Parses and evaluates in one step.
    pub fn run(&self, source: &str, context: &EvalContext) -> Result<Value, Diagnostic> {
        let expr = self.parse(source)?;
        self.evaluate(&expr, context)
    }

    /// Checks `source` without evaluating it. See [`Validation`].
    pub fn validate(&self, source: &str) -> Validation {
        Validation::check(self, source)
    }
}
