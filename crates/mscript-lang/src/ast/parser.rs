use std::iter::Peekable;

use crate::{
    Target,
    lexer::token::{Token, TokenKind},
};

use super::{
    DEFAULT_MAX_DEPTH, Program,
    error::ParseError,
    node::{Literal, Node},
};

/// `x[i]` is read as a call to this function.
pub const INDEX_FUNCTION: &str = "array_get";

pub struct Parser<'a> {
    tokens: Peekable<core::slice::Iter<'a, Token>>,
    depth: u32,
    max_depth: u32,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: core::slice::Iter<'a, Token>) -> Self {
        Self {
            tokens: tokens.peekable(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parses `;` separated statements up to the end of input.
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut program = Vec::new();

        loop {
            while self.next_if(|kind| matches!(kind, TokenKind::SemiColon)).is_some() {}

            match self.tokens.peek() {
                Some(Token {
                    kind: TokenKind::Eof,
                    ..
                })
                | None => break,
                _ => {}
            }

            program.push(self.parse_expr()?);

            match self.tokens.next() {
                Some(Token {
                    kind: TokenKind::SemiColon,
                    ..
                }) => continue,
                Some(Token {
                    kind: TokenKind::Eof,
                    ..
                })
                | None => break,
                Some(token) => return Err(unexpected(token)),
            }
        }

        Ok(program)
    }

    fn parse_expr(&mut self) -> Result<Node, ParseError> {
        if self.depth >= self.max_depth {
            let target = self
                .tokens
                .peek()
                .map(|token| token.target.clone())
                .unwrap_or_default();
            return Err(ParseError::NestingTooDeep(target, self.max_depth));
        }

        self.depth += 1;
        let node = self.parse_postfix();
        self.depth -= 1;

        node
    }

    fn parse_postfix(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_primary()?;

        while let Some(bracket) = self.next_if(|kind| matches!(kind, TokenKind::LBracket)) {
            let index = self.parse_expr()?;
            self.expect(|kind| matches!(kind, TokenKind::RBracket))?;
            node = Node::call(INDEX_FUNCTION, bracket.target.clone(), vec![node, index]);
        }

        Ok(node)
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        let token = self.tokens.next().ok_or_else(|| {
            ParseError::UnexpectedEOFDetected(Target::default())
        })?;

        match &token.kind {
            TokenKind::StringLiteral(s) => Ok(Node::string(s.clone(), token.target.clone())),
            TokenKind::IntegerLiteral(n) => n
                .parse::<i64>()
                .map(|n| Node::integer(n, token.target.clone()))
                .map_err(|_| ParseError::IntegerOutOfRange(token.target.clone(), n.to_string())),
            TokenKind::Null => Ok(Node::literal(Literal::Null, token.target.clone())),
            TokenKind::Ident(name) => {
                self.expect(|kind| matches!(kind, TokenKind::LParen))?;
                let args = self.parse_args()?;
                Ok(Node::call(name.clone(), token.target.clone(), args))
            }
            TokenKind::LParen => {
                let node = self.parse_expr()?;
                self.expect(|kind| matches!(kind, TokenKind::RParen))?;
                Ok(node)
            }
            TokenKind::Eof => Err(ParseError::UnexpectedEOFDetected(token.target.clone())),
            _ => Err(unexpected(token)),
        }
    }

    fn parse_args(&mut self) -> Result<Vec<Node>, ParseError> {
        let mut args = Vec::new();

        if self.next_if(|kind| matches!(kind, TokenKind::RParen)).is_some() {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expr()?);

            let token = self.expect(|kind| matches!(kind, TokenKind::Comma | TokenKind::RParen))?;
            if token.kind == TokenKind::RParen {
                return Ok(args);
            }
        }
    }

    fn next_if(&mut self, f: impl Fn(&TokenKind) -> bool) -> Option<&'a Token> {
        self.tokens.next_if(|token| f(&token.kind))
    }

    fn expect(&mut self, f: impl Fn(&TokenKind) -> bool) -> Result<&'a Token, ParseError> {
        match self.tokens.next() {
            Some(token) if f(&token.kind) => Ok(token),
            Some(Token {
                kind: TokenKind::Eof,
                target,
            }) => Err(ParseError::UnexpectedEOFDetected(target.clone())),
            Some(token) => Err(unexpected(token)),
            None => Err(ParseError::UnexpectedEOFDetected(Target::default())),
        }
    }
}

fn unexpected(token: &Token) -> ParseError {
    ParseError::UnexpectedToken(token.target.clone(), token.to_string())
}
