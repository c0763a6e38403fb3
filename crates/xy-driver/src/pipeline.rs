//! Compilation pipeline stages.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use xy_ast::{Block, Node};
use xy_codegen::{CodegenError, JitEngine};
use xy_ir::{IrModule, LowerError, LowerOptions, Lowerer, UndeclaredPolicy};
use xy_lexer::{Lexer, Token, TokenKind};
use xy_parser::{ParseError, Parser};

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Error tokens produced by the lexer
    #[error("{} lexical error(s)", .0.len())]
    Lex(Vec<Token>),

    #[error("{} parse error(s)", .0.len())]
    Parse(Vec<ParseError>),

    #[error(transparent)]
    Lower(#[from] LowerError),

    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

/// Options for one compile-and-run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Fail on reads of never-assigned variables instead of auto-declaring
    pub strict: bool,
}

impl RunOptions {
    pub fn lower_options(&self) -> LowerOptions {
        LowerOptions {
            undeclared: if self.strict {
                UndeclaredPolicy::Reject
            } else {
                UndeclaredPolicy::AutoDeclare
            },
        }
    }
}

pub fn read_source(path: &Path) -> Result<String, DriverError> {
    fs::read_to_string(path).map_err(|source| DriverError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Lexes and parses `source`. Lexical errors are reported before any parsing.
pub fn parse(source: &str) -> Result<Node<Block>, DriverError> {
    let tokens = Lexer::new(source).tokenize();
    let errors: Vec<Token> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Error)
        .cloned()
        .collect();
    if !errors.is_empty() {
        return Err(DriverError::Lex(errors));
    }
    debug!("lexed {} token(s)", tokens.len());

    let root = Parser::new(tokens).parse_program().map_err(DriverError::Parse)?;
    debug!("parsed {} top-level statement(s)", root.value.stmts.len());
    Ok(root)
}

pub fn compile_to_ir(source: &str, options: RunOptions) -> Result<IrModule, DriverError> {
    let root = parse(source)?;
    Ok(Lowerer::new(options.lower_options()).lower_program(&root)?)
}

/// Lowers `root` and hands the finished module to `engine`.
pub fn run_program(root: &Node<Block>, options: RunOptions, engine: JitEngine) -> Result<i64, DriverError> {
    let module = Lowerer::new(options.lower_options()).lower_program(root)?;
    debug!("lowered {} function(s)", module.functions.len());

    let result = engine.compile_and_run(module)?;
    debug!("program returned {}", result);
    Ok(result)
}

pub fn run_source(source: &str, options: RunOptions) -> Result<i64, DriverError> {
    run_source_with(source, options, JitEngine::new())
}

pub fn run_source_with(source: &str, options: RunOptions, engine: JitEngine) -> Result<i64, DriverError> {
    let root = parse(source)?;
    run_program(&root, options, engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_options() {
        assert_eq!(
            RunOptions::default().lower_options().undeclared,
            UndeclaredPolicy::AutoDeclare
        );
        assert_eq!(
            RunOptions { strict: true }.lower_options().undeclared,
            UndeclaredPolicy::Reject
        );
    }

    #[test]
    fn test_lex_errors_come_first() {
        // Also a parse error, but lexing is checked first
        match parse("x = @ ;") {
            Err(DriverError::Lex(tokens)) => {
                assert_eq!(tokens.len(), 1);
                assert_eq!(tokens[0].value, "Unexpected character: @");
            }
            other => panic!("expected lexical error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse("x = ;"), Err(DriverError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = read_source(Path::new("/definitely/not/here.xy")).unwrap_err();
        assert!(matches!(err, DriverError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.xy"));
    }
}
