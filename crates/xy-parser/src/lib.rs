//! # xy Parser
//!
//! Recursive descent parser for xy. Produces the root [`Block`] that the
//! lowering engine consumes; expressions use precedence climbing.

use xy_ast::*;
use xy_lexer::{Token, TokenKind};

// Module declarations
mod error;
mod parser;
mod expr;
mod stmt;
mod helpers;

// Re-export public types
pub use error::{ParseError, ParseResult};
pub use parser::Parser;

/// Lexes and parses `source` in one step.
pub fn parse_source(source: &str, file_id: usize) -> Result<Node<Block>, Vec<ParseError>> {
    let tokens = xy_lexer::Lexer::with_file_id(source, file_id).tokenize();
    Parser::new(tokens).parse_program()
}

// =============================================================================
// Tests
// =============================================================================
