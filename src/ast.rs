//! # Abstract Syntax Tree
//!
//! This module defines the tokens and the expression tree of the rule
//! language: a small, side-effect free expression language for validation
//! predicates, filters and derived fields evaluated against record data.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, identifiers, operations, calls)
//! - **[operators]** - Unary and binary operators with their precedence
//!
//! ## Quick Start
//!
//! ```text
//! amount > 1000 and user.region == "EU"
//! ```
//!
//! This rule matches transactions above 1000 made by users in the EU region.
//!
//! ## Core Concepts
//!
//! ### One Expression
//!
//! Every source is exactly one expression. There are no statements, no
//! assignments and no user-defined functions: an expression reads the
//! bindings supplied by the host and produces a value.
//!
//! ### Precedence
//!
//! From loosest to tightest binding:
//!
//! ```text
//! or  <  and  <  not  <  == !=  <  < <= > >=  <  + -  <  * / %  <  -x  <  .field [index] (args)
//! ```
//!
//! All binary operators associate to the left.
//!
//! ### Type System
//!
//! Values are `null`, booleans, numbers (double precision), strings, lists
//! and records. Operators never coerce between kinds: `1 + "1"` is a type
//! error, and `1 == "1"` is `false`.
//!
//! ## Examples
//!
//! ### Conditional
//!
//! ```text
//! if user.age >= 18 then "adult" else "minor"
//! ```
//!
//! ### Built-in Functions
//!
//! ```text
//! len(tags) > 0 and contains(lower(merchant), "casino")
//! ```
//!
//! ### Indexing
//!
//! ```text
//! items[0].price * 1.2
//! ```
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{Expr, ExprKind};
pub use operators::{BinOp, Precedence, UnaryOp};
pub use tokens::{Keyword, Token, TokenKind};
