//! # xy Lexer
//!
//! Tokenizer for xy source text. Lexing never fails outright: malformed input
//! is reported as [`TokenKind::Error`] tokens for the driver to render.

pub mod token;
pub mod lexer;

// Re-export all public types from modules
pub use token::{Token, TokenKind};
pub use lexer::Lexer;
