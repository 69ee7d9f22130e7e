//! Execute rule-dsl commands against an engine

use super::CliError;
use crate::{Diagnostic, Engine, EvalContext, Lexer, Rule, RuleOutcome, Token, Validation, Value};

/// Validates an expression without evaluating it
pub fn execute_check(engine: &Engine, expression: &str) -> Validation {
    engine.validate(expression)
}

/// Parses and evaluates an expression against a context
pub fn execute_eval(
    engine: &Engine,
    expression: &str,
    context: &EvalContext,
) -> Result<Value, CliError> {
    engine
        .run(expression, context)
        .map_err(|d| CliError::diagnostic(expression, d))
}

/// Evaluates an expression as a named boolean rule
pub fn execute_rule(
    engine: &Engine,
    name: &str,
    expression: &str,
    context: &EvalContext,
) -> Result<RuleOutcome, CliError> {
    Rule::compile(engine, name, expression)
        .and_then(|rule| rule.evaluate_with(engine, context))
        .map_err(|d| CliError::diagnostic(expression, d))
}

/// Every token of an expression, with lexical errors in place
pub fn list_tokens(expression: &str) -> Vec<Result<Token, Diagnostic>> {
    Lexer::new(expression).collect()
}

/// `name/arity` for every registered function
pub fn list_functions(engine: &Engine) -> Vec<String> {
    engine
        .registry()
        .signatures()
        .into_iter()
        .map(|(name, arity)| format!("{}/{}", name, arity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_error_carries_expression() {
        let engine = Engine::new();
        let err = execute_eval(&engine, "1 / 0", &EvalContext::new()).unwrap_err();
        assert!(err.to_string().contains("1 | 1 / 0"));
    }

    #[test]
    fn tokens_keep_going_after_errors() {
        let tokens = list_tokens("a # b");
        assert_eq!(tokens.len(), 4);
        assert!(tokens[1].is_err());
        assert!(tokens[3].as_ref().unwrap().is_eof());
    }

    #[test]
    fn functions_are_listed_by_signature() {
        let functions = list_functions(&Engine::new());
        assert!(functions.contains(&"round/2".to_string()));
        assert!(functions.contains(&"len/1".to_string()));
    }
}
