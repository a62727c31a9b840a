use std::sync::Arc;

use crate::{
    Program, Value,
    ast::{
        DEFAULT_MAX_DEPTH,
        node::{Expr, MemoKey, Node},
    },
    error::compile::CompileError,
    function::{OptimizationOption, check_thrown, registry::Registry},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizerOptions {
    /// Mark calls whose result can be memoised.
    pub cache_results: bool,
    /// Drop statements whose value is unused and that have no side effects.
    pub eliminate_dead_code: bool,
    /// Deepest expression nesting accepted.
    pub max_depth: u32,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            cache_results: true,
            eliminate_dead_code: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Rewrites a program before it runs, driven by the [`OptimizationOption`]s
/// each function declares.
///
/// For every call, children are optimized first. Then, in order:
///
/// 1. unknown functions and wrong argument counts are rejected;
/// 2. `ConstantOffline`: when every argument is a literal, the function's
///    `validate` runs now and its failure becomes a compile error;
/// 3. `OptimizeDynamic`: the function may return a replacement, which is
///    optimized again in place of the call;
/// 4. `CacheReturn`: a call with literal arguments gets a memo key so the
///    evaluator computes it once. The key is the call itself, so the same call
///    in later programs reuses the result.
///
/// At the program level, a statement that is not the last one and whose whole
/// subtree is `NoSideEffects` is removed.
#[derive(Debug, Clone)]
pub struct Optimizer {
    registry: Arc<Registry>,
    options: OptimizerOptions,
}

impl Optimizer {
    pub fn new(registry: Arc<Registry>, options: OptimizerOptions) -> Self {
        Self { registry, options }
    }

    pub fn optimize(&self, program: &Program) -> Result<Program, CompileError> {
        let last = program.len().saturating_sub(1);
        let mut optimized = Vec::with_capacity(program.len());

        for (i, node) in program.iter().enumerate() {
            let node = self.optimize_node(node.clone())?;

            if self.options.eliminate_dead_code && i != last && self.has_no_side_effects(&node) {
                tracing::debug!(location = %node.target, node = %node, "removing unused statement");
                continue;
            }

            optimized.push(node);
        }

        Ok(optimized)
    }

    pub fn optimize_node(&self, node: Node) -> Result<Node, CompileError> {
        self.optimize_at(node, 1)
    }

    fn optimize_at(&self, mut node: Node, depth: u32) -> Result<Node, CompileError> {
        if depth > self.options.max_depth {
            return Err(CompileError::NestingTooDeep(
                node.target.clone(),
                self.options.max_depth,
            ));
        }

        let name = match &node.expr {
            Expr::Literal(_) => return Ok(node),
            Expr::Call(name) => name.clone(),
        };

        node.children = std::mem::take(&mut node.children)
            .into_iter()
            .map(|child| self.optimize_at(child, depth + 1))
            .collect::<Result<_, _>>()?;

        let function = self
            .registry
            .get(&name)
            .ok_or_else(|| CompileError::NotDefined(node.target.clone(), name.to_string()))?;

        if !function.arity().is_valid(node.children.len()) {
            return Err(CompileError::InvalidNumberOfArguments {
                target: node.target.clone(),
                name: name.to_string(),
                expected: function.arity(),
                got: node.children.len(),
            });
        }

        let all_literal = node.children.iter().all(Node::is_literal);

        if all_literal && function.has_optimization(OptimizationOption::ConstantOffline) {
            let args: Vec<Value> = node.children.iter().filter_map(Node::literal_value).collect();
            function.validate(&args, &node.target).inspect_err(|e| {
                check_thrown(&**function, e);
            })?;
        }

        if function.has_optimization(OptimizationOption::OptimizeDynamic) {
            let replacement = function
                .optimize_dynamic(&node.children, &node.target)
                .inspect_err(|e| check_thrown(&**function, e))?;

            if let Some(replacement) = replacement {
                tracing::debug!(
                    location = %node.target,
                    from = %node,
                    to = %replacement,
                    "rewrote call"
                );
                return self.optimize_at(replacement, depth);
            }
        }

        if self.options.cache_results
            && all_literal
            && node.memo.is_none()
            && function.has_optimization(OptimizationOption::CacheReturn)
        {
            node.memo = MemoKey::from_call(&node);
        }

        Ok(node)
    }

    fn has_no_side_effects(&self, node: &Node) -> bool {
        match &node.expr {
            Expr::Literal(_) => true,
            Expr::Call(name) => {
                self.registry.get(name).is_some_and(|function| {
                    function.has_optimization(OptimizationOption::NoSideEffects)
                }) && node.children.iter().all(|child| self.has_no_side_effects(child))
            }
        }
    }
}
