use std::sync::Arc;

use smol_str::SmolStr;

use crate::{
    Environment, Program, Value,
    ast::DEFAULT_MAX_DEPTH,
    error::{Error, InnerError},
    eval::Evaluator,
    function::{console::Console, registry::Registry},
    optimizer::{Optimizer, OptimizerOptions},
};

#[derive(Debug, Clone)]
pub struct Options {
    /// Run the optimizer between parsing and evaluation.
    pub optimize: bool,
    /// Let the optimizer mark calls for memoisation. Ignored when `optimize` is off.
    pub cache_results: bool,
    /// Attached to every source location the engine reports.
    pub file_name: Option<SmolStr>,
    /// Deepest expression nesting the parser, optimizer and evaluator accept.
    pub max_depth: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            optimize: true,
            cache_results: true,
            file_name: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug)]
pub struct Engine {
    pub(crate) evaluator: Evaluator,
    pub(crate) options: Options,
    env: Environment,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Registry::standard())
    }
}

impl Engine {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            evaluator: Evaluator::new(registry),
            options: Options::default(),
            env: Environment::default(),
        }
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.evaluator.max_depth = options.max_depth;
        self.options = options;
        self
    }

    pub fn with_console(mut self, console: Arc<dyn Console>) -> Self {
        self.env.insert(console);
        self
    }

    pub fn set_optimize(&mut self, optimize: bool) {
        self.options.optimize = optimize;
    }

    pub fn set_cache_results(&mut self, cache_results: bool) {
        self.options.cache_results = cache_results;
    }

    pub fn set_file_name(&mut self, file_name: impl Into<SmolStr>) {
        self.options.file_name = Some(file_name.into());
    }

    pub fn set_max_depth(&mut self, max_depth: u32) {
        self.options.max_depth = max_depth;
        self.evaluator.max_depth = max_depth;
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn registry(&self) -> &Arc<Registry> {
        self.evaluator.registry()
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Drops every memoised result.
    pub fn clear_cache(&self) {
        self.evaluator.clear_memo();
    }

    #[allow(clippy::result_large_err)]
    pub fn parse(&self, code: &str) -> Result<Program, Error> {
        crate::parse_with_file(code, self.options.file_name.as_ref(), self.options.max_depth)
    }

    /// Parses `code` and, when enabled, runs the optimizer over it.
    #[allow(clippy::result_large_err)]
    pub fn compile(&self, code: &str) -> Result<Program, Error> {
        let program = self.parse(code)?;

        if !self.options.optimize {
            return Ok(program);
        }

        Optimizer::new(
            Arc::clone(self.registry()),
            OptimizerOptions {
                cache_results: self.options.cache_results,
                max_depth: self.options.max_depth,
                ..OptimizerOptions::default()
            },
        )
        .optimize(&program)
        .map_err(|e| Error::from_error(code, InnerError::Compile(e)))
    }

    #[allow(clippy::result_large_err)]
    pub fn eval(&self, code: &str) -> Result<Value, Error> {
        let program = self.compile(code)?;
        self.eval_program(&program, code)
    }

    /// Evaluates an already compiled program. `code` is only used to render diagnostics.
    #[allow(clippy::result_large_err)]
    pub fn eval_program(&self, program: &Program, code: &str) -> Result<Value, Error> {
        self.evaluator
            .eval(program, &self.env)
            .map_err(|e| Error::from_error(code, InnerError::Runtime(e)))
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
