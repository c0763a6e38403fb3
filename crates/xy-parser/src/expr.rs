//! Expression parsing
//!
//! Precedence climbing over the binary operators. Assignment sits at the
//! lowest level and associates to the right.

use super::*;

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> ParseResult<Node<Expr>> {
        self.parse_expression_with_precedence(1)
    }

    pub(crate) fn parse_expression_with_precedence(&mut self, min_precedence: u8) -> ParseResult<Node<Expr>> {
        let mut left = self.parse_primary_expression()?;

        loop {
            let precedence = self.get_infix_precedence();

            if precedence == 0 || precedence < min_precedence {
                break;
            }

            left = self.parse_infix_expression(left, precedence)?;
        }

        Ok(left)
    }

    fn parse_infix_expression(&mut self, left: Node<Expr>, precedence: u8) -> ParseResult<Node<Expr>> {
        let start = left.span;

        let expr = if self.check(&TokenKind::Eq) {
            let target = match left.value {
                Expr::Identifier(ident) => Node::new(ident, left.span),
                _ => {
                    return Err(ParseError {
                        message: "Invalid assignment target".to_string(),
                        span: left.span,
                    })
                }
            };
            self.advance();
            let value = Box::new(self.parse_expression_with_precedence(precedence)?);
            Expr::Assignment { target, value }
        } else {
            let op = self.parse_binary_operator()?;
            let right = Box::new(self.parse_expression_with_precedence(precedence + 1)?);
            Expr::BinaryOp {
                left: Box::new(left),
                op,
                right,
            }
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(expr, span))
    }

    fn parse_primary_expression(&mut self) -> ParseResult<Node<Expr>> {
        let start = self.current_token().span;

        let expr = match self.current_token().kind {
            TokenKind::IntegerLiteral => {
                let text = self.advance().value.clone();
                Expr::IntegerLiteral(self.parse_integer(&text, start)?)
            }
            TokenKind::Minus => {
                self.advance();
                if !self.check(&TokenKind::IntegerLiteral) {
                    return Err(self.error("Expected integer literal after '-'".to_string()));
                }
                let text = format!("-{}", self.advance().value);
                let span = start.merge(&self.previous_token().span);
                Expr::IntegerLiteral(self.parse_integer(&text, span)?)
            }
            TokenKind::Identifier => {
                let callee = self.parse_identifier()?;
                if self.check(&TokenKind::LParen) {
                    let args = self.parse_arguments()?;
                    Expr::MethodCall { callee, args }
                } else {
                    Expr::Identifier(callee.value)
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.consume(TokenKind::RParen)?;
                let span = start.merge(&self.previous_token().span);
                return Ok(Node::new(inner.value, span));
            }
            TokenKind::Error => {
                let message = self.current_token().value.clone();
                return Err(self.error(message));
            }
            _ => {
                return Err(self.error(format!(
                    "Expected expression, found {:?}",
                    self.current_token().kind
                )))
            }
        };

        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(expr, span))
    }

    fn parse_arguments(&mut self) -> ParseResult<Vec<Node<Expr>>> {
        self.consume(TokenKind::LParen)?;
        let mut args = Vec::new();

        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            args.push(self.parse_expression()?);
            if !self.check(&TokenKind::RParen) {
                self.consume(TokenKind::Comma)?;
            }
        }

        self.consume(TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_integer(&self, text: &str, span: Span) -> ParseResult<i64> {
        text.parse::<i64>().map_err(|_| ParseError {
            message: format!("Integer literal out of range: {}", text),
            span,
        })
    }
}
