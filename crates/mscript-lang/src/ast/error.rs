use thiserror::Error;

use crate::Target;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token `{1}`")]
    UnexpectedToken(Target, String),
    #[error("Unexpected EOF detected")]
    UnexpectedEOFDetected(Target),
    #[error("Integer literal `{1}` is out of range")]
    IntegerOutOfRange(Target, String),
    #[error("Expressions are nested deeper than {1} levels")]
    NestingTooDeep(Target, u32),
}

impl ParseError {
    #[cold]
    pub fn target(&self) -> &Target {
        match self {
            ParseError::UnexpectedToken(target, _) => target,
            ParseError::UnexpectedEOFDetected(target) => target,
            ParseError::IntegerOutOfRange(target, _) => target,
            ParseError::NestingTooDeep(target, _) => target,
        }
    }
}
