use std::fmt::{self, Display, Formatter};

use thiserror::Error;

use crate::{Target, function::Arity};

type FunctionName = String;

/// Closed set of error categories a function may raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExceptionKind {
    Format,
    Cast,
    IndexOverflow,
}

impl ExceptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceptionKind::Format => "FormatException",
            ExceptionKind::Cast => "CastException",
            ExceptionKind::IndexOverflow => "IndexOverflowException",
        }
    }
}

impl Display for ExceptionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed failure raised by a function while validating or executing.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct Exception {
    pub kind: ExceptionKind,
    pub message: String,
    pub target: Target,
}

impl Exception {
    pub fn new(kind: ExceptionKind, message: impl Into<String>, target: Target) -> Self {
        Self {
            kind,
            message: message.into(),
            target,
        }
    }

    pub fn format(message: impl Into<String>, target: &Target) -> Self {
        Self::new(ExceptionKind::Format, message, target.clone())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error(transparent)]
    Exception(#[from] Exception),
    #[error("\"{1}\" is not defined")]
    NotDefined(Target, FunctionName),
    #[error("Invalid number of arguments in \"{name}\", expected {expected}, got {got}")]
    InvalidNumberOfArguments {
        target: Target,
        name: FunctionName,
        expected: Arity,
        got: usize,
    },
    #[error("Expressions are nested deeper than {1} levels")]
    NestingTooDeep(Target, u32),
}

impl RuntimeError {
    #[cold]
    pub fn target(&self) -> &Target {
        match self {
            RuntimeError::Exception(e) => &e.target,
            RuntimeError::NotDefined(target, _) => target,
            RuntimeError::InvalidNumberOfArguments { target, .. } => target,
            RuntimeError::NestingTooDeep(target, _) => target,
        }
    }
}
