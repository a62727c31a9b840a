pub mod error;
pub mod node;
pub mod parser;

/// Statements in source order. The value of a program is the value of its last statement.
pub type Program = Vec<node::Node>;

/// Deepest nesting of expressions the parser, optimizer and evaluator accept.
/// The outermost expression of a statement is at depth 1.
pub const DEFAULT_MAX_DEPTH: u32 = 128;
