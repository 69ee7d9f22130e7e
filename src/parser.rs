use std::mem;

use crate::{
    ast::{BinOp, Expr, ExprKind, Keyword, Token, TokenKind, UnaryOp},
    diagnostic::{Diagnostic, DiagnosticKind},
    lexer::Lexer,
    value::Value,
};

/// Recursive-descent parser producing a single [`Expr`].
///
/// The first lexical or syntax error stops parsing; no partial tree is ever
/// returned.
pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    depth: usize,
    max_depth: Option<usize>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, Diagnostic> {
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
            depth: 0,
            max_depth: None,
        })
    }

    /// Rejects sources nested deeper than `max_depth` with `NestingTooDeep`.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    fn advance(&mut self) -> Result<Token, Diagnostic> {
        let next = self.lexer.next_token()?;
        Ok(mem::replace(&mut self.current_token, next))
    }

    fn check(&self, kind: &TokenKind) -> bool {
        mem::discriminant(&self.current_token.kind) == mem::discriminant(kind)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current_token.kind == TokenKind::Keyword(keyword)
    }

    /// Error for the current token, given what would have been accepted here.
    fn unexpected(&self, expected: &str) -> Diagnostic {
        let kind = if self.current_token.is_eof() {
            DiagnosticKind::UnexpectedEndOfInput {
                expected: expected.to_string(),
            }
        } else {
            DiagnosticKind::UnexpectedToken {
                expected: expected.to_string(),
                found: self.current_token.kind.describe(),
            }
        };
        Diagnostic::new(kind, self.current_token.position)
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, Diagnostic> {
        if !self.check(&expected) {
            return Err(self.unexpected(&format!("`{}`", expected)));
        }
        self.advance()
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token, Diagnostic> {
        if !self.check_keyword(keyword) {
            return Err(self.unexpected(&format!("keyword `{}`", keyword.as_str())));
        }
        self.advance()
    }

    /// Runs `parse` one nesting level deeper, enforcing the depth limit.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, Diagnostic>,
    ) -> Result<T, Diagnostic> {
        self.depth += 1;
        if let Some(limit) = self.max_depth
            && self.depth > limit
        {
            return Err(Diagnostic::new(
                DiagnosticKind::NestingTooDeep { limit },
                self.current_token.position,
            ));
        }
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Parse primary expressions (atoms): literals, identifiers, lists,
    /// parenthesized expressions and conditionals
    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        if self.check(&TokenKind::LParen) {
            self.advance()?;
            let expr = self.parse_expression()?;
            self.expect(TokenKind::RParen)?;
            return Ok(expr);
        }
        if self.check(&TokenKind::LBracket) {
            let position = self.advance()?.position;
            let elements = self.parse_comma_separated(TokenKind::RBracket)?;
            return Ok(Expr::new(ExprKind::List(elements), position));
        }
        if self.check_keyword(Keyword::If) {
            return self.parse_conditional();
        }

        let kind = match &self.current_token.kind {
            TokenKind::Number(n) => ExprKind::Literal(Value::Number(*n)),
            TokenKind::String(s) => ExprKind::Literal(Value::String(s.clone())),
            TokenKind::Keyword(Keyword::True) => ExprKind::Literal(Value::Boolean(true)),
            TokenKind::Keyword(Keyword::False) => ExprKind::Literal(Value::Boolean(false)),
            TokenKind::Keyword(Keyword::Null) => ExprKind::Literal(Value::Null),
            TokenKind::Identifier(name) => ExprKind::Identifier(name.clone()),
            _ => return Err(self.unexpected("an expression")),
        };
        let position = self.advance()?.position;
        Ok(Expr::new(kind, position))
    }

    fn parse_conditional(&mut self) -> Result<Expr, Diagnostic> {
        let position = self.expect_keyword(Keyword::If)?.position;
        let test = self.parse_expression()?;
        self.expect_keyword(Keyword::Then)?;
        let then_branch = self.parse_expression()?;
        self.expect_keyword(Keyword::Else)?;
        let else_branch = self.parse_expression()?;

        Ok(Expr::new(
            ExprKind::Conditional {
                test: Box::new(test),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            position,
        ))
    }

    /// Parses `expr (, expr)*` up to and including `close`. The opening
    /// delimiter has already been consumed. A trailing comma is an error.
    fn parse_comma_separated(&mut self, close: TokenKind) -> Result<Vec<Expr>, Diagnostic> {
        let mut items = vec![];

        if self.check(&close) {
            self.advance()?;
            return Ok(items);
        }

        loop {
            items.push(self.parse_expression()?);

            if self.check(&TokenKind::Comma) {
                self.advance()?;
            } else if self.check(&close) {
                self.advance()?;
                return Ok(items);
            } else {
                return Err(self.unexpected(&format!("`,` or `{}`", close)));
            }
        }
    }

    /// Parse postfix chains: `.field`, `[index]` and calls `name(args)`
    fn parse_postfix(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&TokenKind::Dot) {
                self.advance()?; // consume '.'

                // After dot, we expect an identifier
                let field = match &self.current_token.kind {
                    TokenKind::Identifier(name) => name.clone(),
                    _ => return Err(self.unexpected("field name")),
                };
                let position = self.advance()?.position;

                expr = Expr::new(
                    ExprKind::MemberAccess {
                        base: Box::new(expr),
                        field,
                    },
                    position,
                );
            } else if self.check(&TokenKind::LBracket) {
                let position = self.advance()?.position; // consume '['
                let index = self.parse_expression()?;
                self.expect(TokenKind::RBracket)?;

                expr = Expr::new(
                    ExprKind::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                    },
                    position,
                );
            } else if self.check(&TokenKind::LParen)
                && let ExprKind::Identifier(name) = &expr.kind
            {
                // Only a bare name can be called
                let name = name.clone();
                self.advance()?; // consume '('
                let args = self.parse_comma_separated(TokenKind::RParen)?;

                expr = Expr::new(ExprKind::FunctionCall { name, args }, expr.position);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, Diagnostic> {
        if self.check(&TokenKind::Minus) {
            let position = self.advance()?.position;
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expr::new(
                ExprKind::UnaryOp {
                    op: UnaryOp::Negate,
                    operand: Box::new(operand),
                },
                position,
            ));
        }
        self.parse_postfix()
    }

    /// Parses one left-associative binary level: `next (op next)*`.
    fn parse_binary_level(
        &mut self,
        operator: fn(&TokenKind) -> Option<BinOp>,
        next: fn(&mut Self) -> Result<Expr, Diagnostic>,
    ) -> Result<Expr, Diagnostic> {
        let mut left = next(self)?;

        while let Some(op) = operator(&self.current_token.kind) {
            let position = self.advance()?.position;
            let right = next(self)?;

            left = Expr::new(
                ExprKind::BinaryOp {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                position,
            );
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_binary_level(
            |kind| match kind {
                TokenKind::Star => Some(BinOp::Multiply),
                TokenKind::Slash => Some(BinOp::Divide),
                TokenKind::Percent => Some(BinOp::Modulo),
                _ => None,
            },
            Self::parse_unary,
        )
    }

    fn parse_additive(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_binary_level(
            |kind| match kind {
                TokenKind::Plus => Some(BinOp::Add),
                TokenKind::Minus => Some(BinOp::Subtract),
                _ => None,
            },
            Self::parse_multiplicative,
        )
    }

    fn parse_relational(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_binary_level(
            |kind| match kind {
                TokenKind::Lt => Some(BinOp::LessThan),
                TokenKind::LtEq => Some(BinOp::LessEqual),
                TokenKind::Gt => Some(BinOp::GreaterThan),
                TokenKind::GtEq => Some(BinOp::GreaterEqual),
                _ => None,
            },
            Self::parse_additive,
        )
    }

    fn parse_equality(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_binary_level(
            |kind| match kind {
                TokenKind::EqEq => Some(BinOp::Equal),
                TokenKind::NotEq => Some(BinOp::NotEqual),
                _ => None,
            },
            Self::parse_relational,
        )
    }

    fn parse_not(&mut self) -> Result<Expr, Diagnostic> {
        if self.check_keyword(Keyword::Not) {
            let position = self.advance()?.position;
            let operand = self.nested(Self::parse_not)?;
            return Ok(Expr::new(
                ExprKind::UnaryOp {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                position,
            ));
        }
        self.parse_equality()
    }

    fn parse_and(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_binary_level(
            |kind| match kind {
                TokenKind::Keyword(Keyword::And) => Some(BinOp::And),
                _ => None,
            },
            Self::parse_not,
        )
    }

    fn parse_or(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_binary_level(
            |kind| match kind {
                TokenKind::Keyword(Keyword::Or) => Some(BinOp::Or),
                _ => None,
            },
            Self::parse_and,
        )
    }

    pub fn parse_expression(&mut self) -> Result<Expr, Diagnostic> {
        self.nested(Self::parse_or)
    }

    /// Parses a complete source: one expression followed by end of input.
    pub fn parse(&mut self) -> Result<Expr, Diagnostic> {
        let expr = self.parse_expression()?;
        if !self.current_token.is_eof() {
            return Err(Diagnostic::new(
                DiagnosticKind::UnexpectedTrailingInput {
                    found: self.current_token.kind.describe(),
                },
                self.current_token.position,
            ));
        }
        Ok(expr)
    }
}

/// Lexes and parses `source` with no limits applied.
pub fn parse_source(source: &str) -> Result<Expr, Diagnostic> {
    Parser::new(Lexer::new(source))?.parse()
}
