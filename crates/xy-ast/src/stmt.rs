//! Statement definitions for the AST

use super::*;

/// Statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Expression statement
    Expression(Node<Expr>),

    /// Return statement; records the enclosing frame's return value
    Return(Node<Expr>),

    /// Function declaration with a body
    FunctionDecl(FunctionDecl),

    /// Body-less external function declaration
    ExternDecl(ExternDecl),
}

/// Ordered sequence of statements
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Node<Stmt>>,
}

impl Block {
    pub fn new(stmts: Vec<Node<Stmt>>) -> Self {
        Self { stmts }
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }
}
