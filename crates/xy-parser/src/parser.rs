//! Core Parser struct and the program entry point

use super::*;

/// Recursive descent parser for xy
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) current: usize,
}

impl Parser {
    /// Creates a new parser from a token stream
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parses a complete program into its root block.
    ///
    /// Errors are collected rather than returned on the first failure; the
    /// parser resynchronises at statement boundaries and keeps going.
    pub fn parse_program(&mut self) -> Result<Node<Block>, Vec<ParseError>> {
        let start_span = self.current_token().span;
        let mut stmts: Vec<Node<Stmt>> = Vec::new();
        let mut errors = Vec::new();

        while !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(err) => {
                    errors.push(err);
                    self.synchronize();
                }
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        let span = match stmts.last() {
            Some(last) => start_span.merge(&last.span),
            None => start_span,
        };
        Ok(Node::new(Block::new(stmts), span))
    }
}
