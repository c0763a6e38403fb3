use xy_ast::Span;

/// Represents the different kinds of tokens in xy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Extern,
    Fn,
    Return,

    // Literals
    IntegerLiteral,

    // Identifier
    Identifier,

    // Operators
    Plus,              // +
    Minus,             // -
    Star,              // *
    Slash,             // /
    Percent,           // %
    Eq,                // =
    EqEq,              // ==
    BangEq,            // !=
    Lt,                // <
    LtEq,              // <=
    Gt,                // >
    GtEq,              // >=

    // Delimiters
    LParen,            // (
    RParen,            // )
    LBrace,            // {
    RBrace,            // }
    Comma,             // ,
    Semicolon,         // ;

    // Special
    Eof,
    Error,
}

/// Represents a token with its kind, span, and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub value: String,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, span: Span, value: String) -> Self {
        Self { kind, span, value }
    }
}
