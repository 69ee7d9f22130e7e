use std::collections::HashMap;

use crate::{
    ast::{BinOp, Expr, ExprKind, UnaryOp},
    builtins::{FunctionRegistry, Lookup},
    diagnostic::{Diagnostic, DiagnosticKind, Position},
    value::{Value, ValueKind},
};

/// Named values an expression is evaluated against.
///
/// The evaluator only reads from the context; the same context can be
/// reused across evaluations and shared between threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalContext {
    bindings: HashMap<String, Value>,
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style binding, e.g. `EvalContext::new().with("amount", 1500)`.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bindings.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Builds a context from a JSON object, one binding per top-level key.
    ///
    /// Returns `None` when `json` is not an object.
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        match json {
            serde_json::Value::Object(obj) => Some(
                obj.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for EvalContext {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        EvalContext {
            bindings: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Walks an expression tree and computes its value.
///
/// The evaluator holds no state of its own besides the borrowed registry, so
/// evaluation is a pure function of the tree, the context and the registry.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'r> {
    registry: &'r FunctionRegistry,
}

impl Default for Evaluator<'static> {
    fn default() -> Self {
        Evaluator::new(FunctionRegistry::global())
    }
}

fn fail<T>(kind: DiagnosticKind, position: Position) -> Result<T, Diagnostic> {
    Err(Diagnostic::new(kind, position))
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Evaluator { registry }
    }

    /// Evaluates `expr` against `context`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rule_dsl::{EvalContext, Evaluator, Value, parser::parse_source};
    ///
    /// let expr = parse_source("amount * 2").unwrap();
    /// let context = EvalContext::new().with("amount", 21.0);
    ///
    /// let result = Evaluator::default().evaluate(&expr, &context).unwrap();
    /// assert_eq!(result, Value::Number(42.0));
    /// ```
    pub fn evaluate(&self, expr: &Expr, context: &EvalContext) -> Result<Value, Diagnostic> {
        self.eval_expr(expr, context)
    }

    fn eval_expr(&self, expr: &Expr, context: &EvalContext) -> Result<Value, Diagnostic> {
        match &expr.kind {
            ExprKind::Literal(value) => Ok(value.clone()),
            ExprKind::Identifier(name) => match context.get(name) {
                Some(value) => Ok(value.clone()),
                None => fail(
                    DiagnosticKind::UnboundIdentifier { name: name.clone() },
                    expr.position,
                ),
            },
            ExprKind::List(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    list.push(self.eval_expr(item, context)?);
                }
                Ok(Value::List(list))
            }
            ExprKind::UnaryOp { op, operand } => {
                let value = self.eval_expr(operand, context)?;
                self.apply_unary(*op, value, expr.position)
            }
            ExprKind::BinaryOp { op, left, right } => match op {
                BinOp::And | BinOp::Or => self.eval_logical(*op, left, right, context, expr.position),
                _ => {
                    let left_val = self.eval_expr(left, context)?;
                    let right_val = self.eval_expr(right, context)?;
                    self.apply_binop(*op, &left_val, &right_val, expr.position)
                }
            },
            ExprKind::FunctionCall { name, args } => {
                self.eval_call(name, args, context, expr.position)
            }
            ExprKind::Conditional {
                test,
                then_branch,
                else_branch,
            } => match self.eval_expr(test, context)? {
                Value::Boolean(true) => self.eval_expr(then_branch, context),
                Value::Boolean(false) => self.eval_expr(else_branch, context),
                other => fail(
                    DiagnosticKind::type_mismatch("if", &[other.kind()]),
                    test.position,
                ),
            },
            ExprKind::MemberAccess { base, field } => match self.eval_expr(base, context)? {
                Value::Record(mut fields) => match fields.remove(field) {
                    Some(value) => Ok(value),
                    None => fail(
                        DiagnosticKind::UnknownField {
                            field: field.clone(),
                        },
                        expr.position,
                    ),
                },
                other => fail(
                    DiagnosticKind::type_mismatch(format!(".{}", field), &[other.kind()]),
                    expr.position,
                ),
            },
            ExprKind::Index { base, index } => {
                let base_val = self.eval_expr(base, context)?;
                let index_val = self.eval_expr(index, context)?;
                self.apply_index(base_val, &index_val, expr.position)
            }
        }
    }

    /// `and` / `or` with short-circuiting; the right side is only evaluated
    /// when the left side does not decide the result.
    fn eval_logical(
        &self,
        op: BinOp,
        left: &Expr,
        right: &Expr,
        context: &EvalContext,
        position: Position,
    ) -> Result<Value, Diagnostic> {
        let left_val = self.eval_expr(left, context)?;
        let Some(l) = left_val.as_bool() else {
            return fail(
                DiagnosticKind::type_mismatch(op.symbol(), &[left_val.kind()]),
                position,
            );
        };

        match (op, l) {
            (BinOp::And, false) => return Ok(Value::Boolean(false)),
            (BinOp::Or, true) => return Ok(Value::Boolean(true)),
            _ => {}
        }

        match self.eval_expr(right, context)? {
            Value::Boolean(r) => Ok(Value::Boolean(r)),
            other => fail(
                DiagnosticKind::type_mismatch(op.symbol(), &[left_val.kind(), other.kind()]),
                position,
            ),
        }
    }

    fn apply_unary(&self, op: UnaryOp, value: Value, position: Position) -> Result<Value, Diagnostic> {
        match (op, value) {
            (UnaryOp::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
            (UnaryOp::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
            (op, other) => fail(
                DiagnosticKind::type_mismatch(op.symbol(), &[other.kind()]),
                position,
            ),
        }
    }

    fn apply_binop(
        &self,
        op: BinOp,
        left: &Value,
        right: &Value,
        position: Position,
    ) -> Result<Value, Diagnostic> {
        let mismatch = || -> Result<Value, Diagnostic> {
            fail(
                DiagnosticKind::type_mismatch(op.symbol(), &[left.kind(), right.kind()]),
                position,
            )
        };

        match op {
            BinOp::Equal => Ok(Value::Boolean(left == right)),
            BinOp::NotEqual => Ok(Value::Boolean(left != right)),

            BinOp::LessThan | BinOp::LessEqual | BinOp::GreaterThan | BinOp::GreaterEqual => {
                let ordering = match (left, right) {
                    (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                    (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                    _ => return mismatch(),
                };
                // NaN compares false against everything
                let result = ordering.is_some_and(|o| match op {
                    BinOp::LessThan => o.is_lt(),
                    BinOp::LessEqual => o.is_le(),
                    BinOp::GreaterThan => o.is_gt(),
                    _ => o.is_ge(),
                });
                Ok(Value::Boolean(result))
            }

            BinOp::Add => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
                _ => mismatch(),
            },

            BinOp::Subtract | BinOp::Multiply | BinOp::Divide | BinOp::Modulo => {
                let (Value::Number(a), Value::Number(b)) = (left, right) else {
                    return mismatch();
                };
                let result = match op {
                    BinOp::Subtract => a - b,
                    BinOp::Multiply => a * b,
                    _ if *b == 0.0 => return fail(DiagnosticKind::DivisionByZero, position),
                    BinOp::Divide => a / b,
                    _ => a % b,
                };
                Ok(Value::Number(result))
            }

            // Handled with short-circuiting in eval_logical
            BinOp::And | BinOp::Or => mismatch(),
        }
    }

    fn apply_index(&self, base: Value, index: &Value, position: Position) -> Result<Value, Diagnostic> {
        let mut items = match base {
            Value::List(items) => items,
            other => {
                return fail(
                    DiagnosticKind::type_mismatch("[]", &[other.kind(), index.kind()]),
                    position,
                );
            }
        };
        let Value::Number(n) = index else {
            return fail(
                DiagnosticKind::type_mismatch("[]", &[ValueKind::List, index.kind()]),
                position,
            );
        };

        let length = items.len();
        if n.fract() != 0.0 || *n < 0.0 || *n >= length as f64 {
            return fail(
                DiagnosticKind::IndexOutOfRange { index: *n, length },
                position,
            );
        }
        Ok(items.swap_remove(*n as usize))
    }

    fn eval_call(
        &self,
        name: &str,
        args: &[Expr],
        context: &EvalContext,
        position: Position,
    ) -> Result<Value, Diagnostic> {
        let function = match self.registry.lookup(name, args.len()) {
            Lookup::Found(function) => function,
            Lookup::WrongArity { expected } => {
                let expected = expected
                    .iter()
                    .map(|n| n.to_string())
                    .collect::<Vec<_>>()
                    .join(" or ");
                return fail(
                    DiagnosticKind::ArityMismatch {
                        function: name.to_string(),
                        expected,
                        found: args.len(),
                    },
                    position,
                );
            }
            Lookup::Unknown => {
                return fail(
                    DiagnosticKind::UnknownFunction {
                        name: name.to_string(),
                    },
                    position,
                );
            }
        };

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg, context)?);
        }
        function(&values).map_err(|kind| Diagnostic::new(kind, position))
    }
}
