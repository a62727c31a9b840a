//! `mscript-lang` provides the lexer, parser, optimizer and evaluator for mscript,
//! a small call-expression language whose built-ins are regular expression and
//! string functions.
//!
//! ## Examples
//!
//! ```rust
//! use mscript_lang::{Engine, Value};
//!
//! let engine = Engine::default();
//!
//! assert_eq!(
//!     engine.eval("reg_replace('(\\w+)@(\\w+)', '$2 at $1', 'me@home')").unwrap(),
//!     Value::from("home at me")
//! );
//!
//! // Literal patterns are rewritten into plain string functions before evaluation.
//! let program = engine.compile("reg_split(',', 'a,b,c')").unwrap();
//! assert_eq!(program[0].to_string(), "split(',', 'a,b,c')");
//! ```
mod ast;
mod engine;
mod error;
mod eval;
mod function;
mod lexer;
mod optimizer;
mod target;
mod value;

use smol_str::SmolStr;

use error::InnerError;

pub use ast::{DEFAULT_MAX_DEPTH, Program};
pub use ast::error::ParseError;
pub use ast::node::{Expr, Literal, MemoKey, Node};
pub use ast::parser::Parser as AstParser;
pub use engine::{Engine, Options};
pub use error::Error;
pub use error::InnerError as ErrorCause;
pub use error::compile::CompileError;
pub use error::runtime::{Exception, ExceptionKind, RuntimeError};
pub use eval::Evaluator;
pub use eval::env::Environment;
pub use function::console::{BufferConsole, Console, StdoutConsole};
pub use function::pattern::{Flags, is_literal_regex, literal_regex};
pub use function::registry::{Registry, RegistryBuilder, RegistryError};
pub use function::{Arity, Example, Function, OptimizationOption, ThreadAffinity};
pub use lexer::error::LexerError;
pub use lexer::token::{Token, TokenKind};
pub use optimizer::{Optimizer, OptimizerOptions};
pub use target::Target;
pub use value::{Array, Key, Value};

/// Parses `code` into a program. `file` is recorded in every node's [`Target`].
#[allow(clippy::result_large_err)]
pub fn parse(code: &str, file: Option<&str>) -> Result<Program, Error> {
    let file = file.map(SmolStr::new);
    parse_with_file(code, file.as_ref(), DEFAULT_MAX_DEPTH)
}

#[allow(clippy::result_large_err)]
pub fn tokenize(code: &str, file: Option<&str>) -> Result<Vec<Token>, Error> {
    let file = file.map(SmolStr::new);
    lexer::tokenize(code, file.as_ref()).map_err(|e| Error::from_error(code, InnerError::Lexer(e)))
}

#[allow(clippy::result_large_err)]
pub(crate) fn parse_with_file(
    code: &str,
    file: Option<&SmolStr>,
    max_depth: u32,
) -> Result<Program, Error> {
    let tokens =
        lexer::tokenize(code, file).map_err(|e| Error::from_error(code, InnerError::Lexer(e)))?;

    AstParser::new(tokens.iter())
        .with_max_depth(max_depth)
        .parse()
        .map_err(|e| Error::from_error(code, InnerError::Parse(e)))
}
