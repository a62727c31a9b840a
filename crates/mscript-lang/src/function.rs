//! The contract every built-in function implements, and the built-ins themselves.
//!
//! A function describes itself (name, arity, documentation, the exceptions it
//! may raise) and tells the [`Optimizer`](crate::Optimizer) which compile-time
//! treatment is legal for it through [`OptimizationOption`]s.
pub mod array;
pub mod console;
pub mod pattern;
pub mod regex;
pub mod registry;
pub mod string;

use std::fmt::{self, Debug, Display, Formatter};

use itertools::Itertools;

use crate::{
    Environment, Target, Value,
    ast::node::{Expr, Literal, Node},
    error::runtime::{Exception, ExceptionKind},
};

/// Accepted argument counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    Fixed(u8),
    Range(u8, u8),
    AtLeast(u8),
}

impl Arity {
    #[inline(always)]
    pub fn is_valid(&self, num_args: usize) -> bool {
        match self {
            Arity::Fixed(n) => num_args == *n as usize,
            Arity::Range(min, max) => num_args >= *min as usize && num_args <= *max as usize,
            Arity::AtLeast(min) => num_args >= *min as usize,
        }
    }

    /// Every accepted count, for documentation. Open-ended ranges are not expanded.
    pub fn counts(&self) -> Vec<u8> {
        match self {
            Arity::Fixed(n) => vec![*n],
            Arity::Range(min, max) => (*min..=*max).collect(),
            Arity::AtLeast(min) => vec![*min],
        }
    }
}

impl Display for Arity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{}", n),
            Arity::Range(min, max) => write!(f, "{}", (*min..=*max).join(" or ")),
            Arity::AtLeast(min) => write!(f, "{} or more", min),
        }
    }
}

/// Whether a function may be scheduled away from the main thread.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ThreadAffinity {
    #[default]
    Unspecified,
    AnyThread,
    MainThread,
}

/// Compile-time treatments a function opts into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptimizationOption {
    /// Validate the arguments during compilation when all of them are literals.
    ConstantOffline,
    /// The result depends only on the arguments, so a call with literal
    /// arguments can be memoised.
    CacheReturn,
    /// Call [`Function::optimize_dynamic`] with the unevaluated children.
    OptimizeDynamic,
    /// The call can be dropped when its result is unused.
    NoSideEffects,
}

/// An executable usage example. `output` is the `Display` form of the result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Example {
    pub description: &'static str,
    pub script: &'static str,
    pub output: &'static str,
}

impl Example {
    pub const fn new(description: &'static str, script: &'static str, output: &'static str) -> Self {
        Self {
            description,
            script,
            output,
        }
    }
}

static NULL: Value = Value::Null;

/// The argument at `index`, or `Null` when the call supplied fewer.
#[inline(always)]
pub(crate) fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&NULL)
}

/// The string literal a child node holds, if it is one.
pub(crate) fn string_literal(node: &Node) -> Option<&str> {
    match &node.expr {
        Expr::Literal(Literal::String(s)) => Some(s.as_str()),
        _ => None,
    }
}

/// Reports an exception whose kind the function does not declare in [`Function::thrown`].
pub(crate) fn check_thrown(function: &dyn Function, exception: &Exception) {
    if !function.thrown().contains(&exception.kind) {
        tracing::warn!(
            function = function.name(),
            kind = %exception.kind,
            "function raised an undeclared exception kind"
        );
        debug_assert!(
            false,
            "{} raised undeclared {}",
            function.name(),
            exception.kind
        );
    }
}

pub trait Function: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn arity(&self) -> Arity;

    /// Names of the parameters, in order.
    fn params(&self) -> &'static [&'static str];

    /// Human readable usage text.
    fn docs(&self) -> &'static str;

    fn examples(&self) -> &'static [Example];

    /// The only exception kinds `validate`, `execute` and `optimize_dynamic` may raise.
    fn thrown(&self) -> &'static [ExceptionKind];

    fn thread_affinity(&self) -> ThreadAffinity {
        ThreadAffinity::Unspecified
    }

    fn optimizations(&self) -> &'static [OptimizationOption] {
        &[]
    }

    fn has_optimization(&self, option: OptimizationOption) -> bool {
        self.optimizations().contains(&option)
    }

    /// The checks `execute` would make on its arguments, without doing the work.
    fn validate(&self, _args: &[Value], _target: &Target) -> Result<(), Exception> {
        Ok(())
    }

    fn execute(&self, args: &[Value], target: &Target, env: &Environment) -> Result<Value, Exception>;

    /// Returns an equivalent, cheaper replacement for the call, if there is one.
    fn optimize_dynamic(&self, _children: &[Node], _target: &Target) -> Result<Option<Node>, Exception> {
        Ok(None)
    }
}
