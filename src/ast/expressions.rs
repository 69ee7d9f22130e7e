use crate::{
    ast::{BinOp, Precedence, UnaryOp},
    diagnostic::Position,
    value::Value,
};

/// A node of the abstract syntax tree.
///
/// The tree is built once by the parser and never modified afterwards; each
/// node owns its children. `position` is where the node's introducing token
/// starts (the operator for operations, the name for calls and fields) and is
/// what runtime diagnostics point at.
///
/// Equality is structural: positions are ignored, so the same expression
/// written with different spacing compares equal.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Literal scalar: number, string, boolean or `null`
    ///
    /// # Example
    /// ```text
    /// 42
    /// "hello"
    /// true
    /// ```
    Literal(Value),

    /// Reference to a binding in the evaluation context
    ///
    /// # Example
    /// ```text
    /// amount
    /// ```
    Identifier(String),

    /// List literal
    ///
    /// # Example
    /// ```text
    /// [1, 2, amount]
    /// ```
    List(Vec<Expr>),

    /// Prefix operation
    ///
    /// # Example
    /// ```text
    /// not blocked
    /// -amount
    /// ```
    UnaryOp { op: UnaryOp, operand: Box<Expr> },

    /// Binary operation (arithmetic, comparison, logical)
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Built-in function call
    ///
    /// # Example
    /// ```text
    /// len(tags)
    /// max(amount, 100)
    /// ```
    FunctionCall { name: String, args: Vec<Expr> },

    /// `if test then a else b`; only the selected branch is evaluated
    Conditional {
        test: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },

    /// Record field access
    ///
    /// # Example
    /// ```text
    /// user.region
    /// ```
    MemberAccess { base: Box<Expr>, field: String },

    /// List indexing
    ///
    /// # Example
    /// ```text
    /// items[0]
    /// ```
    Index { base: Box<Expr>, index: Box<Expr> },
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Expr {
    pub fn new(kind: ExprKind, position: Position) -> Self {
        Expr { kind, position }
    }

    /// How tightly this node binds when printed next to operators.
    pub fn precedence(&self) -> Precedence {
        match &self.kind {
            ExprKind::Literal(Value::Number(n)) if n.is_sign_negative() => Precedence::Negate,
            ExprKind::Literal(_) | ExprKind::Identifier(_) | ExprKind::List(_) => {
                Precedence::Primary
            }
            ExprKind::UnaryOp { op, .. } => op.precedence(),
            ExprKind::BinaryOp { op, .. } => op.precedence(),
            ExprKind::FunctionCall { .. }
            | ExprKind::MemberAccess { .. }
            | ExprKind::Index { .. } => Precedence::Postfix,
            ExprKind::Conditional { .. } => Precedence::Conditional,
        }
    }

    /// Number of nodes in this tree, this node included.
    pub fn node_count(&self) -> usize {
        1 + match &self.kind {
            ExprKind::Literal(_) | ExprKind::Identifier(_) => 0,
            ExprKind::List(items) => items.iter().map(Expr::node_count).sum(),
            ExprKind::UnaryOp { operand, .. } => operand.node_count(),
            ExprKind::BinaryOp { left, right, .. } => left.node_count() + right.node_count(),
            ExprKind::FunctionCall { args, .. } => args.iter().map(Expr::node_count).sum(),
            ExprKind::Conditional {
                test,
                then_branch,
                else_branch,
            } => test.node_count() + then_branch.node_count() + else_branch.node_count(),
            ExprKind::MemberAccess { base, .. } => base.node_count(),
            ExprKind::Index { base, index } => base.node_count() + index.node_count(),
        }
    }
}
