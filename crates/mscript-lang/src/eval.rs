pub mod env;

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    Program, Value,
    ast::{
        DEFAULT_MAX_DEPTH,
        node::{Expr, MemoKey, Node},
    },
    error::runtime::RuntimeError,
    function::{check_thrown, registry::Registry},
};

use env::Environment;

const MAX_MEMO_ENTRIES: usize = 4096;

/// Tree-walking evaluator.
///
/// Clones share the registry and the memo table, so one evaluator can serve
/// concurrent evaluations of independent scripts.
#[derive(Debug, Clone)]
pub struct Evaluator {
    registry: Arc<Registry>,
    memo: Arc<DashMap<MemoKey, Value>>,
    pub(crate) max_depth: u32,
}

impl Evaluator {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            memo: Arc::new(DashMap::new()),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Evaluates every statement and returns the value of the last one.
    pub fn eval(&self, program: &Program, env: &Environment) -> Result<Value, RuntimeError> {
        program
            .iter()
            .try_fold(Value::Null, |_, node| self.eval_node(node, env))
    }

    pub fn eval_node(&self, node: &Node, env: &Environment) -> Result<Value, RuntimeError> {
        self.eval_at(node, env, 1)
    }

    fn eval_at(&self, node: &Node, env: &Environment, depth: u32) -> Result<Value, RuntimeError> {
        if depth > self.max_depth {
            return Err(RuntimeError::NestingTooDeep(node.target.clone(), self.max_depth));
        }

        match &node.expr {
            Expr::Literal(literal) => Ok(literal.into()),
            Expr::Call(name) => match &node.memo {
                Some(key) => self.eval_memoised(key, name, node, env, depth),
                None => self.eval_call(name, node, env, depth),
            },
        }
    }

    fn eval_memoised(
        &self,
        key: &MemoKey,
        name: &str,
        node: &Node,
        env: &Environment,
        depth: u32,
    ) -> Result<Value, RuntimeError> {
        if let Some(value) = self.memo.get(key) {
            tracing::trace!(key = %key, "memo hit");
            return Ok(value.clone());
        }

        if self.memo.len() >= MAX_MEMO_ENTRIES {
            tracing::trace!(size = MAX_MEMO_ENTRIES, "clearing memo table");
            self.memo.clear();
        }

        // Memoised calls only have literal arguments, so computing under the
        // entry lock never re-enters the table.
        let entry = self
            .memo
            .entry(key.clone())
            .or_try_insert_with(|| self.eval_call(name, node, env, depth))?;

        Ok(entry.value().clone())
    }

    fn eval_call(
        &self,
        name: &str,
        node: &Node,
        env: &Environment,
        depth: u32,
    ) -> Result<Value, RuntimeError> {
        let function = self
            .registry
            .get(name)
            .ok_or_else(|| RuntimeError::NotDefined(node.target.clone(), name.to_string()))?;

        if !function.arity().is_valid(node.children.len()) {
            return Err(RuntimeError::InvalidNumberOfArguments {
                target: node.target.clone(),
                name: name.to_string(),
                expected: function.arity(),
                got: node.children.len(),
            });
        }

        let args = node
            .children
            .iter()
            .map(|child| self.eval_at(child, env, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;

        function.execute(&args, &node.target, env).map_err(|e| {
            check_thrown(&**function, &e);
            RuntimeError::from(e)
        })
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Number of memoised results.
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    pub fn clear_memo(&self) {
        self.memo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Target,
        error::runtime::ExceptionKind,
        function::{Arity, console::{BufferConsole, Console}},
        optimizer::{Optimizer, OptimizerOptions},
    };
    use rstest::rstest;

    fn s(text: &str) -> Node {
        Node::string(text, Target::default())
    }

    fn call(name: &str, children: Vec<Node>) -> Node {
        Node::call(name, Target::default(), children)
    }

    fn evaluator() -> Evaluator {
        Evaluator::new(Registry::standard())
    }

    #[rstest]
    #[case::empty(vec![], Value::Null)]
    #[case::last_statement(vec![s("a"), Node::integer(2, Target::default())], Value::Integer(2))]
    #[case::nested(
        vec![call("reg_count", vec![s("\\d"), call("reg_replace", vec![s("a"), s("1"), s("aXa")])])],
        Value::Integer(2)
    )]
    fn test_eval(#[case] program: Program, #[case] expected: Value) {
        assert_eq!(evaluator().eval(&program, &Environment::default()), Ok(expected));
    }

    #[test]
    fn test_unknown_function_at_runtime() {
        assert_eq!(
            evaluator().eval_node(&call("nope", vec![]), &Environment::default()),
            Err(RuntimeError::NotDefined(Target::default(), "nope".to_string()))
        );
    }

    #[test]
    fn test_arity_is_checked_without_optimizer() {
        assert_eq!(
            evaluator().eval_node(&call("reg_escape", vec![]), &Environment::default()),
            Err(RuntimeError::InvalidNumberOfArguments {
                target: Target::default(),
                name: "reg_escape".to_string(),
                expected: Arity::Fixed(1),
                got: 0,
            })
        );
    }

    #[rstest]
    #[case::at_limit(3, true)]
    #[case::over_limit(4, false)]
    fn test_nesting_limit(#[case] depth: usize, #[case] ok: bool) {
        let node = (1..depth).fold(s("a"), |node, _| call("reg_escape", vec![node]));
        let result = evaluator()
            .with_max_depth(3)
            .eval_node(&node, &Environment::default());

        match result {
            Ok(value) => {
                assert!(ok);
                assert_eq!(value, Value::from("a"));
            }
            Err(e) => {
                assert!(!ok);
                assert_eq!(e, RuntimeError::NestingTooDeep(Target::default(), 3));
            }
        }
    }

    #[test]
    fn test_dynamic_pattern_fails_at_runtime() {
        let node = call(
            "reg_match",
            vec![call("replace", vec![s("(x"), s("x"), s("")]), s("abc")],
        );
        match evaluator().eval_node(&node, &Environment::default()) {
            Err(RuntimeError::Exception(e)) => assert_eq!(e.kind, ExceptionKind::Format),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_memoised_result_is_computed_once() {
        let console = Arc::new(BufferConsole::default());
        let env = Environment::default().with_console(console.clone());

        let mut node = call("console", vec![s("once")]);
        node.memo = MemoKey::from_call(&node);

        let evaluator = evaluator();
        evaluator.eval_node(&node, &env).unwrap();
        evaluator.eval_node(&node, &env).unwrap();

        assert_eq!(console.lines(), vec!["once".to_string()]);
        assert_eq!(evaluator.memo_len(), 1);
    }

    #[test]
    fn test_memo_table_is_bounded() {
        let evaluator = evaluator();

        for i in 0..MAX_MEMO_ENTRIES + 10 {
            let mut node = call("reg_escape", vec![s(&format!("a.{i}"))]);
            node.memo = MemoKey::from_call(&node);
            evaluator.eval_node(&node, &Environment::default()).unwrap();
        }

        assert!(evaluator.memo_len() <= MAX_MEMO_ENTRIES);
        assert!(evaluator.memo_len() > 0);
    }

    #[test]
    fn test_memo_table_is_shared_between_clones() {
        let optimizer = Optimizer::new(Registry::standard(), OptimizerOptions::default());
        let node = optimizer
            .optimize_node(call("reg_match", vec![s("b"), s("abc")]))
            .unwrap();

        let evaluator = evaluator();
        let clone = evaluator.clone();
        let first = evaluator.eval_node(&node, &Environment::default()).unwrap();
        let second = clone.eval_node(&node, &Environment::default()).unwrap();

        assert_eq!(first, second);
        assert_eq!(clone.memo_len(), 1);
        evaluator.clear_memo();
        assert_eq!(clone.memo_len(), 0);
    }

    #[test]
    fn test_concurrent_memoised_evaluation() {
        let optimizer = Optimizer::new(Registry::standard(), OptimizerOptions::default());
        let node = Arc::new(
            optimizer
                .optimize_node(call("reg_split", vec![s("\\d"), s("a1b2c3")]))
                .unwrap(),
        );
        let evaluator = evaluator();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let evaluator = evaluator.clone();
                let node = Arc::clone(&node);
                std::thread::spawn(move || evaluator.eval_node(&node, &Environment::default()))
            })
            .collect();

        for handle in handles {
            assert_eq!(
                handle.join().unwrap().unwrap().to_string(),
                "{a, b, c, }"
            );
        }
        assert_eq!(evaluator.memo_len(), 1);
    }

    #[test]
    fn test_console_is_reached_through_environment() {
        let console = Arc::new(BufferConsole::default());
        let env = Environment::default().with_console(console.clone() as Arc<dyn Console>);

        evaluator()
            .eval(&vec![call("console", vec![s("hi")])], &env)
            .unwrap();

        assert_eq!(console.lines(), vec!["hi".to_string()]);
    }
}
