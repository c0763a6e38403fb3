//! Expression definitions for the AST

use super::*;
use std::fmt;

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Signed 64-bit integer literal
    IntegerLiteral(i64),

    /// Variable reference
    Identifier(Ident),

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Node<Expr>>,
        op: BinaryOp,
        right: Box<Node<Expr>>,
    },

    /// Assignment: target = value
    Assignment {
        target: Node<Ident>,
        value: Box<Node<Expr>>,
    },

    /// Call of a declared function: callee(args)
    MethodCall {
        callee: Node<Ident>,
        args: Vec<Node<Expr>>,
    },
}

/// Binary operators the front end can produce.
///
/// Only the arithmetic family (`+ - * /`) lowers to IR; the rest parse so the
/// lowering stage can reject them with a located error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
        };
        write!(f, "{}", s)
    }
}
