use std::fmt::{self, Display, Formatter};

use smol_str::SmolStr;

use crate::Target;

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Token {
    pub target: Target,
    pub kind: TokenKind,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum TokenKind {
    Comma,
    Eof,
    Ident(SmolStr),
    /// Kept as written so that the parser can report an out of range literal.
    IntegerLiteral(SmolStr),
    LBracket,
    LParen,
    Null,
    RBracket,
    RParen,
    SemiColon,
    StringLiteral(String),
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Comma => write!(f, ","),
            TokenKind::Eof => write!(f, ""),
            TokenKind::Ident(ident) => write!(f, "{}", ident),
            TokenKind::IntegerLiteral(n) => write!(f, "{}", n),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::LParen => write!(f, "("),
            TokenKind::Null => write!(f, "null"),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::SemiColon => write!(f, ";"),
            TokenKind::StringLiteral(s) => write!(f, "{:?}", s),
        }
    }
}
