//! # xy AST
//!
//! Abstract Syntax Tree definitions for the xy language.
//! The parser produces a single root [`Block`]; everything downstream only
//! reads the tree.

use std::fmt;

// =============================================================================
// Core Types (kept in lib.rs - used by all modules)
// =============================================================================

/// Source location information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub file_id: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, file_id: usize) -> Self {
        Self { start, end, file_id }
    }

    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            file_id: self.file_id,
        }
    }
}

/// AST node wrapper that includes span information
#[derive(Debug, Clone, PartialEq)]
pub struct Node<T> {
    pub span: Span,
    pub value: T,
}

impl<T> Node<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { span, value }
    }
}

/// Identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: String,
}

impl Ident {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// =============================================================================
// Module Declarations
// =============================================================================

pub mod expr;
pub mod stmt;
pub mod decl;

pub use expr::*;
pub use stmt::*;
pub use decl::*;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_span() -> Span {
        Span::new(0, 0, 0)
    }

    #[test]
    fn test_span_merge() {
        let a = Span::new(4, 9, 0);
        let b = Span::new(1, 6, 0);
        assert_eq!(a.merge(&b), Span::new(1, 9, 0));
    }

    #[test]
    fn test_expressions() {
        let literal = Expr::IntegerLiteral(42);
        assert!(matches!(literal, Expr::IntegerLiteral(42)));

        let ident = Expr::Identifier(Ident::new("x"));
        assert!(matches!(ident, Expr::Identifier(_)));
    }

    #[test]
    fn test_binary_op_display() {
        assert_eq!(format!("{}", BinaryOp::Add), "+");
        assert_eq!(format!("{}", BinaryOp::Div), "/");
        assert_eq!(format!("{}", BinaryOp::LtEq), "<=");
    }

    #[test]
    fn test_function_decl() {
        let func = FunctionDecl {
            name: Node::new(Ident::new("foo"), dummy_span()),
            params: vec![Node::new(Ident::new("a"), dummy_span())],
            body: Node::new(Block::new(vec![]), dummy_span()),
        };

        assert_eq!(func.name.value.name, "foo");
        assert_eq!(func.arity(), 1);
        assert!(func.body.value.is_empty());
    }
}
