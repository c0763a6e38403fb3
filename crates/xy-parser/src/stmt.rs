//! Statement parsing

use super::*;

impl Parser {
    pub(crate) fn parse_statement(&mut self) -> ParseResult<Node<Stmt>> {
        let start = self.current_token().span;

        let stmt = match self.current_token().kind {
            TokenKind::Extern => Stmt::ExternDecl(self.parse_extern_decl()?),
            TokenKind::Fn => Stmt::FunctionDecl(self.parse_function_decl()?),
            TokenKind::Return => {
                self.advance();
                let expr = self.parse_expression()?;
                Stmt::Return(expr)
            }
            _ => Stmt::Expression(self.parse_expression()?),
        };

        let span = start.merge(&self.previous_token().span);
        self.consume_semicolon();
        Ok(Node::new(stmt, span))
    }

    fn parse_extern_decl(&mut self) -> ParseResult<ExternDecl> {
        self.consume(TokenKind::Extern)?;
        let name = self.parse_identifier()?;
        let params = self.parse_params()?;
        Ok(ExternDecl { name, params })
    }

    fn parse_function_decl(&mut self) -> ParseResult<FunctionDecl> {
        self.consume(TokenKind::Fn)?;
        let name = self.parse_identifier()?;
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Ok(FunctionDecl { name, params, body })
    }

    pub(crate) fn parse_block(&mut self) -> ParseResult<Node<Block>> {
        let start = self.consume(TokenKind::LBrace)?.span;
        let mut stmts = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            stmts.push(self.parse_statement()?);
        }

        self.consume(TokenKind::RBrace)?;
        let span = start.merge(&self.previous_token().span);
        Ok(Node::new(Block::new(stmts), span))
    }
}
