use xy_ast::Span;
use crate::token::{Token, TokenKind};

/// The lexer/tokenizer for xy.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>,
    current_pos: usize,
    current_char: Option<char>,
    file_id: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer from source code.
    pub fn new(source: &'a str) -> Self {
        Self::with_file_id(source, 0)
    }

    /// Creates a new lexer with a specific file ID.
    pub fn with_file_id(source: &'a str, file_id: usize) -> Self {
        let mut chars = source.char_indices();
        let current_char = chars.next().map(|(_, c)| c);
        Self {
            source,
            chars,
            current_pos: 0,
            current_char,
            file_id,
        }
    }

    /// Tokenizes the entire source code and returns all tokens.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Gets the next token from the source.
    pub fn next_token(&mut self) -> Token {
        if let Some(error_token) = self.skip_whitespace_and_comments() {
            return error_token;
        }

        let start = self.current_pos;

        match self.current_char {
            None => Token::new(TokenKind::Eof, self.span_from(start), String::new()),
            Some(ch) => match ch {
                '0'..='9' => self.read_integer(),
                'a'..='z' | 'A'..='Z' | '_' => self.read_identifier_or_keyword(),

                '+' => self.single(TokenKind::Plus, "+"),
                '-' => self.single(TokenKind::Minus, "-"),
                '*' => self.single(TokenKind::Star, "*"),
                '/' => self.single(TokenKind::Slash, "/"),
                '%' => self.single(TokenKind::Percent, "%"),
                '=' => self.one_or_two('=', TokenKind::Eq, "=", TokenKind::EqEq, "=="),
                '<' => self.one_or_two('=', TokenKind::Lt, "<", TokenKind::LtEq, "<="),
                '>' => self.one_or_two('=', TokenKind::Gt, ">", TokenKind::GtEq, ">="),
                '!' => {
                    self.advance();
                    if self.current_char == Some('=') {
                        self.advance();
                        Token::new(TokenKind::BangEq, self.span_from(start), "!=".to_string())
                    } else {
                        Token::new(
                            TokenKind::Error,
                            self.span_from(start),
                            "Unexpected character: !".to_string(),
                        )
                    }
                }

                '(' => self.single(TokenKind::LParen, "("),
                ')' => self.single(TokenKind::RParen, ")"),
                '{' => self.single(TokenKind::LBrace, "{"),
                '}' => self.single(TokenKind::RBrace, "}"),
                ',' => self.single(TokenKind::Comma, ","),
                ';' => self.single(TokenKind::Semicolon, ";"),

                _ => {
                    self.advance();
                    Token::new(
                        TokenKind::Error,
                        self.span_from(start),
                        format!("Unexpected character: {}", ch),
                    )
                }
            },
        }
    }

    // Helper methods

    fn advance(&mut self) {
        if let Some((pos, ch)) = self.chars.next() {
            self.current_pos = pos;
            self.current_char = Some(ch);
        } else {
            self.current_pos = self.source.len();
            self.current_char = None;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next().map(|(_, c)| c)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.current_pos, self.file_id)
    }

    fn single(&mut self, kind: TokenKind, text: &str) -> Token {
        let start = self.current_pos;
        self.advance();
        Token::new(kind, self.span_from(start), text.to_string())
    }

    /// Lexes `first` alone, or `first` followed by `next` as the longer token.
    fn one_or_two(
        &mut self,
        next: char,
        short: TokenKind,
        short_text: &str,
        long: TokenKind,
        long_text: &str,
    ) -> Token {
        let start = self.current_pos;
        self.advance();
        if self.current_char == Some(next) {
            self.advance();
            Token::new(long, self.span_from(start), long_text.to_string())
        } else {
            Token::new(short, self.span_from(start), short_text.to_string())
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Option<Token> {
        loop {
            match self.current_char {
                Some(ch) if ch.is_whitespace() => {
                    self.advance();
                }
                Some('/') => {
                    if self.peek() == Some('/') {
                        self.skip_single_line_comment();
                    } else if self.peek() == Some('*') {
                        let start = self.current_pos;
                        if !self.skip_multi_line_comment() {
                            return Some(Token::new(
                                TokenKind::Error,
                                self.span_from(start),
                                "Unterminated multi-line comment".to_string(),
                            ));
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
        None
    }

    fn skip_single_line_comment(&mut self) {
        // Skip //
        self.advance();
        self.advance();

        while let Some(ch) = self.current_char {
            if ch == '\n' {
                self.advance();
                break;
            }
            self.advance();
        }
    }

    fn skip_multi_line_comment(&mut self) -> bool {
        // Skip /*
        self.advance();
        self.advance();

        while let Some(ch) = self.current_char {
            if ch == '*' && self.peek() == Some('/') {
                self.advance(); // *
                self.advance(); // /
                return true;
            }
            self.advance();
        }
        false // Unterminated
    }

    /// Reads a run of decimal digits. Range checking is left to the parser,
    /// which knows whether a leading minus applies.
    fn read_integer(&mut self) -> Token {
        let start = self.current_pos;
        let mut value = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() || ch == '_' {
                if ch != '_' {
                    value.push(ch);
                }
                self.advance();
            } else {
                break;
            }
        }

        // Identifier characters glued onto a number, e.g. `12ab`
        if matches!(self.current_char, Some(c) if c.is_alphabetic() || c == '_') {
            while matches!(self.current_char, Some(c) if c.is_alphanumeric() || c == '_') {
                self.advance();
            }
            return Token::new(
                TokenKind::Error,
                self.span_from(start),
                format!("Invalid integer literal: {}", &self.source[start..self.current_pos]),
            );
        }

        Token::new(TokenKind::IntegerLiteral, self.span_from(start), value)
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let start = self.current_pos;
        let mut value = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let kind = match value.as_str() {
            "extern" => TokenKind::Extern,
            "fn" => TokenKind::Fn,
            "return" => TokenKind::Return,
            _ => TokenKind::Identifier,
        };

        Token::new(kind, self.span_from(start), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords() {
        let tokens = Lexer::new("extern fn return returned").tokenize();

        assert_eq!(tokens[0].kind, TokenKind::Extern);
        assert_eq!(tokens[1].kind, TokenKind::Fn);
        assert_eq!(tokens[2].kind, TokenKind::Return);
        assert_eq!(tokens[3].kind, TokenKind::Identifier);
        assert_eq!(tokens[3].value, "returned");
        assert_eq!(tokens[4].kind, TokenKind::Eof);
    }

    #[test]
    fn test_integers() {
        let tokens = Lexer::new("0 42 1_000_000").tokenize();

        assert_eq!(tokens[0].kind, TokenKind::IntegerLiteral);
        assert_eq!(tokens[0].value, "0");
        assert_eq!(tokens[1].value, "42");
        assert_eq!(tokens[2].value, "1000000");
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("+ - * / % = == != < <= > >="),
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Eq,
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments() {
        let source = r#"
            // Single line comment
            x = 5;
            /* Multi-line
               comment */
            return x
        "#;

        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Identifier,
                TokenKind::Eq,
                TokenKind::IntegerLiteral,
                TokenKind::Semicolon,
                TokenKind::Return,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_spans() {
        let tokens = Lexer::new("ab <= 7").tokenize();

        assert_eq!((tokens[0].span.start, tokens[0].span.end), (0, 2));
        assert_eq!((tokens[1].span.start, tokens[1].span.end), (3, 5));
        assert_eq!((tokens[2].span.start, tokens[2].span.end), (6, 7));
        assert_eq!((tokens[3].span.start, tokens[3].span.end), (7, 7));
    }

    #[test]
    fn test_errors() {
        let tokens = Lexer::new("x = 1 @ 2 ! 12ab /* open").tokenize();
        let errors: Vec<_> = tokens.iter().filter(|t| t.kind == TokenKind::Error).collect();

        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0].value, "Unexpected character: @");
        assert_eq!(errors[1].value, "Unexpected character: !");
        assert_eq!(errors[2].value, "Invalid integer literal: 12ab");
        assert_eq!(errors[3].value, "Unterminated multi-line comment");
        assert_eq!(tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
    }

    #[test]
    fn test_function_declaration() {
        assert_eq!(
            kinds("fn add(a, b) { return a + b }"),
            vec![
                TokenKind::Fn,
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::Comma,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::Return,
                TokenKind::Identifier,
                TokenKind::Plus,
                TokenKind::Identifier,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }
}
