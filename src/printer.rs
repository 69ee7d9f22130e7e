//! Canonical source rendering of expression trees.
//!
//! Printing inserts only the parentheses required by precedence and left
//! associativity, single spaces around binary operators and double quotes
//! around strings, so that parsing the printed text yields an equal tree.

use std::fmt;

use crate::ast::{Expr, ExprKind, Precedence, UnaryOp};

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(value) => write!(f, "{}", value),
            ExprKind::Identifier(name) => f.write_str(name),
            ExprKind::List(items) => {
                f.write_str("[")?;
                write_separated(f, items)?;
                f.write_str("]")
            }
            ExprKind::UnaryOp { op, operand } => {
                f.write_str(op.symbol())?;
                if *op == UnaryOp::Not {
                    f.write_str(" ")?;
                }
                write_operand(f, operand, operand.precedence() < op.precedence())
            }
            ExprKind::BinaryOp { op, left, right } => {
                let prec = op.precedence();
                write_operand(f, left, left.precedence() < prec)?;
                write!(f, " {} ", op.symbol())?;
                write_operand(f, right, right.precedence() <= prec)
            }
            ExprKind::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                write_separated(f, args)?;
                f.write_str(")")
            }
            ExprKind::Conditional {
                test,
                then_branch,
                else_branch,
            } => write!(f, "if {} then {} else {}", test, then_branch, else_branch),
            ExprKind::MemberAccess { base, field } => {
                write_operand(f, base, base.precedence() < Precedence::Postfix)?;
                write!(f, ".{}", field)
            }
            ExprKind::Index { base, index } => {
                write_operand(f, base, base.precedence() < Precedence::Postfix)?;
                write!(f, "[{}]", index)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, parenthesize: bool) -> fmt::Result {
    if parenthesize {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}

fn write_separated(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}
