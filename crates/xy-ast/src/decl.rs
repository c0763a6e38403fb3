//! Function and extern declarations

use super::*;

/// Function declaration: fn name(params) { body }
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Node<Ident>,
    pub params: Vec<Node<Ident>>,
    pub body: Node<Block>,
}

impl FunctionDecl {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Extern declaration: extern name(params)
#[derive(Debug, Clone, PartialEq)]
pub struct ExternDecl {
    pub name: Node<Ident>,
    pub params: Vec<Node<Ident>>,
}

impl ExternDecl {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}
