use thiserror::Error;

use crate::{Target, function::Arity};

use super::runtime::Exception;

type FunctionName = String;

/// Failures detected while optimizing, before the script runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
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
    /// A literal argument failed eager validation.
    #[error(transparent)]
    Exception(#[from] Exception),
}

impl CompileError {
    #[cold]
    pub fn target(&self) -> &Target {
        match self {
            CompileError::NotDefined(target, _) => target,
            CompileError::InvalidNumberOfArguments { target, .. } => target,
            CompileError::NestingTooDeep(target, _) => target,
            CompileError::Exception(e) => &e.target,
        }
    }
}
