//! Named boolean rules
//!
//! A [`Rule`] is an expression parsed once and evaluated many times, whose
//! result must be a boolean. A [`RuleSet`] evaluates several rules against the
//! same context, in the order they were added.
//!
//! ```
//! use rule_dsl::{EvalContext, Rule};
//!
//! let rule = Rule::new("large-order", "amount > 1000 and status == \"pending\"").unwrap();
//! let context = EvalContext::new()
//!     .with("amount", 1500)
//!     .with("status", "pending");
//!
//! let outcome = rule.evaluate(&context).unwrap();
//! assert!(outcome.matched);
//! assert_eq!(outcome.description, "amount > 1000 and status == \"pending\" matched");
//! ```

use serde::Serialize;

use crate::{
    ast::Expr,
    diagnostic::{Diagnostic, DiagnosticKind},
    engine::Engine,
    evaluator::EvalContext,
    value::Value,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    name: String,
    source: String,
    expr: Expr,
}

/// The result of evaluating one [`Rule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleOutcome {
    pub rule: String,
    pub matched: bool,
    pub description: String,
}

impl Rule {
    /// Parses `source` with the global engine.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self, Diagnostic> {
        Rule::compile(Engine::global(), name, source)
    }

    /// Parses `source` with `engine`'s limits.
    pub fn compile(
        engine: &Engine,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self, Diagnostic> {
        let source = source.into();
        let expr = engine.parse(&source)?;
        Ok(Rule {
            name: name.into(),
            source,
            expr,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluates against `context` with the global engine's functions.
    pub fn evaluate(&self, context: &EvalContext) -> Result<RuleOutcome, Diagnostic> {
        self.evaluate_with(Engine::global(), context)
    }

    pub fn evaluate_with(
        &self,
        engine: &Engine,
        context: &EvalContext,
    ) -> Result<RuleOutcome, Diagnostic> {
        let matched = match engine.evaluate(&self.expr, context)? {
            Value::Boolean(b) => b,
            other => {
                return Err(Diagnostic::new(
                    DiagnosticKind::type_mismatch("rule", &[other.kind()]),
                    self.expr.position,
                ));
            }
        };

        let verdict = if matched { "matched" } else { "did not match" };
        Ok(RuleOutcome {
            rule: self.name.clone(),
            matched,
            description: format!("{} {}", self.expr, verdict),
        })
    }
}

/// An ordered collection of rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: Rule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    /// Parses and appends a rule, keeping the set unchanged on error.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<&mut Self, Diagnostic> {
        let rule = Rule::new(name, source)?;
        Ok(self.push(rule))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn evaluate(&self, context: &EvalContext) -> Result<Vec<RuleOutcome>, Diagnostic> {
        self.evaluate_with(Engine::global(), context)
    }

    /// Evaluates every rule in insertion order; the first diagnostic aborts.
    pub fn evaluate_with(
        &self,
        engine: &Engine,
        context: &EvalContext,
    ) -> Result<Vec<RuleOutcome>, Diagnostic> {
        self.rules
            .iter()
            .map(|rule| rule.evaluate_with(engine, context))
            .collect()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        RuleSet {
            rules: iter.into_iter().collect(),
        }
    }
}
