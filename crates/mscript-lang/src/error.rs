pub mod compile;
pub mod runtime;

use miette::{Diagnostic, SourceOffset, SourceSpan};

use crate::{Target, ast::error::ParseError, lexer::error::LexerError};

use compile::CompileError;
use runtime::{ExceptionKind, RuntimeError};

#[allow(clippy::useless_conversion)]
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InnerError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl InnerError {
    pub fn target(&self) -> &Target {
        match self {
            InnerError::Lexer(e) => e.target(),
            InnerError::Parse(e) => e.target(),
            InnerError::Compile(e) => e.target(),
            InnerError::Runtime(e) => e.target(),
        }
    }

    /// The exception category, when the error was raised by a function.
    pub fn exception_kind(&self) -> Option<ExceptionKind> {
        match self {
            InnerError::Compile(CompileError::Exception(e))
            | InnerError::Runtime(RuntimeError::Exception(e)) => Some(e.kind),
            _ => None,
        }
    }
}

/// Represents a high-level error with diagnostic information for the user.
#[derive(PartialEq, Debug, thiserror::Error)]
#[error("{cause}")]
pub struct Error {
    /// The underlying cause of the error.
    pub cause: InnerError,
    /// The source code related to the error.
    pub source_code: String,
    /// The location in the source code for diagnostics.
    pub location: SourceSpan,
}

impl Error {
    pub fn from_error(source_code: impl Into<String>, cause: InnerError) -> Self {
        let source_code = source_code.into();
        let target = cause.target();
        let location = if source_code.is_empty() {
            SourceSpan::new(SourceOffset::from(0), 0)
        } else {
            let offset =
                SourceOffset::from_location(&source_code, target.line as usize, target.column);
            let length = usize::from(offset.offset() < source_code.len());
            SourceSpan::new(offset, length)
        };

        Self {
            cause,
            source_code,
            location,
        }
    }

    pub fn target(&self) -> &Target {
        self.cause.target()
    }
}

impl Diagnostic for Error {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let c = match &self.cause {
            InnerError::Lexer(LexerError::UnexpectedToken(..)) => "LexerError::UnexpectedToken".to_string(),
            InnerError::Lexer(LexerError::UnterminatedString(_)) => {
                "LexerError::UnterminatedString".to_string()
            }
            InnerError::Parse(ParseError::UnexpectedToken(..)) => "ParseError::UnexpectedToken".to_string(),
            InnerError::Parse(ParseError::UnexpectedEOFDetected(_)) => {
                "ParseError::UnexpectedEOFDetected".to_string()
            }
            InnerError::Parse(ParseError::IntegerOutOfRange(..)) => {
                "ParseError::IntegerOutOfRange".to_string()
            }
            InnerError::Parse(ParseError::NestingTooDeep(..)) => "ParseError::NestingTooDeep".to_string(),
            InnerError::Compile(CompileError::NotDefined(..)) => "CompileError::NotDefined".to_string(),
            InnerError::Compile(CompileError::InvalidNumberOfArguments { .. }) => {
                "CompileError::InvalidNumberOfArguments".to_string()
            }
            InnerError::Compile(CompileError::NestingTooDeep(..)) => "CompileError::NestingTooDeep".to_string(),
            InnerError::Compile(CompileError::Exception(e)) => format!("CompileError::{}", e.kind),
            InnerError::Runtime(RuntimeError::NotDefined(..)) => "RuntimeError::NotDefined".to_string(),
            InnerError::Runtime(RuntimeError::InvalidNumberOfArguments { .. }) => {
                "RuntimeError::InvalidNumberOfArguments".to_string()
            }
            InnerError::Runtime(RuntimeError::NestingTooDeep(..)) => "RuntimeError::NestingTooDeep".to_string(),
            InnerError::Runtime(RuntimeError::Exception(e)) => format!("RuntimeError::{}", e.kind),
        };

        Some(Box::new(c))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let msg = match &self.cause {
            InnerError::Lexer(LexerError::UnexpectedToken(..)) => {
                Some("This character cannot start a token.".to_string())
            }
            InnerError::Lexer(LexerError::UnterminatedString(_)) => {
                Some("Add the closing quote to the string literal.".to_string())
            }
            InnerError::Parse(ParseError::UnexpectedToken(..)) => {
                Some("Check for syntax errors or misplaced tokens.".to_string())
            }
            InnerError::Parse(ParseError::UnexpectedEOFDetected(_)) => Some(
                "Input ended unexpectedly. Check for missing closing parentheses or quotes."
                    .to_string(),
            ),
            InnerError::Parse(ParseError::IntegerOutOfRange(..)) => {
                Some("Integers must fit in a signed 64-bit value.".to_string())
            }
            InnerError::Compile(CompileError::NotDefined(_, name))
            | InnerError::Runtime(RuntimeError::NotDefined(_, name)) => {
                Some(format!("'{name}' is not a known function."))
            }
            InnerError::Compile(CompileError::InvalidNumberOfArguments { expected, got, .. })
            | InnerError::Runtime(RuntimeError::InvalidNumberOfArguments { expected, got, .. }) => {
                Some(format!(
                    "Invalid number of arguments: expected {expected}, got {got}."
                ))
            }
            InnerError::Parse(ParseError::NestingTooDeep(_, max))
            | InnerError::Compile(CompileError::NestingTooDeep(_, max))
            | InnerError::Runtime(RuntimeError::NestingTooDeep(_, max)) => Some(format!(
                "Split the expression into smaller statements, or raise the limit of {max}."
            )),
            InnerError::Compile(CompileError::Exception(e))
            | InnerError::Runtime(RuntimeError::Exception(e)) => match e.kind {
                ExceptionKind::Format => {
                    Some("Check the pattern, flags and backreferences.".to_string())
                }
                ExceptionKind::Cast => Some("Check the types of the arguments.".to_string()),
                ExceptionKind::IndexOverflow => {
                    Some("The key does not exist in the array.".to_string())
                }
            },
        };

        msg.map(|m| Box::new(m) as Box<dyn std::fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(
            miette::LabeledSpan::new_with_span(Some(format!("{}", self.cause)), self.location),
        )))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.source_code)
    }
}
