//! CLI support for rule-dsl
//!
//! Provides programmatic access to the `rule-dsl` commands so other tools can
//! embed them without spawning the binary.

mod check;
mod report;

pub use check::{execute_check, execute_eval, execute_rule, list_functions, list_tokens};
pub use report::{render_diagnostic, render_report};

use std::{fs, io, path::Path};

use thiserror::Error;

use crate::{Diagnostic, Engine, EvalContext, Limits};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{}", render_diagnostic(.expression, .diagnostic))]
    Diagnostic {
        expression: String,
        diagnostic: Diagnostic,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("context must be a JSON object")]
    InvalidContext,

    #[error("cannot load config `{path}`: {message}")]
    Config { path: String, message: String },
}

impl CliError {
    pub fn diagnostic(expression: &str, diagnostic: Diagnostic) -> Self {
        CliError::Diagnostic {
            expression: expression.to_string(),
            diagnostic,
        }
    }
}

/// Limit overrides given on the command line
#[derive(Debug, Clone, Default)]
pub struct EngineOptions<'a> {
    pub config: Option<&'a Path>,
    pub max_length: Option<usize>,
    pub max_depth: Option<usize>,
}

/// Builds an engine from an optional JSON config file plus overrides.
pub fn load_engine(options: &EngineOptions<'_>) -> Result<Engine, CliError> {
    let mut limits = match options.config {
        Some(path) => {
            let config_error = |message: String| CliError::Config {
                path: path.display().to_string(),
                message,
            };
            let text = fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
            serde_json::from_str::<Limits>(&text).map_err(|e| config_error(e.to_string()))?
        }
        None => Limits::default(),
    };

    if let Some(max_length) = options.max_length {
        limits.max_source_len = max_length;
    }
    if let Some(max_depth) = options.max_depth {
        limits.max_depth = max_depth;
    }
    log::debug!("using limits {:?}", limits);
    Ok(Engine::new().with_limits(limits))
}

/// Parses a JSON object into an evaluation context; no input means an empty one.
pub fn parse_context(input: Option<&str>) -> Result<EvalContext, CliError> {
    let Some(text) = input.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(EvalContext::new());
    };
    let json: serde_json::Value = serde_json::from_str(text)?;
    EvalContext::from_json(json).ok_or(CliError::InvalidContext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn empty_context_input() {
        assert!(parse_context(None).unwrap().is_empty());
        assert!(parse_context(Some("  \n")).unwrap().is_empty());
    }

    #[test]
    fn context_must_be_an_object() {
        assert!(matches!(
            parse_context(Some("[1, 2]")),
            Err(CliError::InvalidContext)
        ));
        let context = parse_context(Some(r#"{"amount": 3}"#)).unwrap();
        assert_eq!(context.get("amount"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let engine = load_engine(&EngineOptions {
            max_depth: Some(4),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(engine.limits().max_depth, 4);
        assert_eq!(engine.limits().max_source_len, Limits::DEFAULT_MAX_SOURCE_LEN);
    }
}
