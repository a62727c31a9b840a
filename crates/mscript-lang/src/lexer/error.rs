use thiserror::Error;

use crate::Target;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexerError {
    #[error("Unexpected character `{1}`")]
    UnexpectedToken(Target, char),
    #[error("Unterminated string literal")]
    UnterminatedString(Target),
}

impl LexerError {
    #[cold]
    pub fn target(&self) -> &Target {
        match self {
            LexerError::UnexpectedToken(target, _) => target,
            LexerError::UnterminatedString(target) => target,
        }
    }
}
