use std::sync::{Arc, LazyLock};

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use thiserror::Error;

use super::{
    Function,
    array::{ArrayGet, ArrayNew},
    console::ConsoleWrite,
    regex::{RegCount, RegEscape, RegMatch, RegMatchAll, RegReplace, RegSplit},
    string::{Replace, Split},
};

static STANDARD_REGISTRY: LazyLock<Arc<Registry>> = LazyLock::new(|| {
    let mut builder = RegistryBuilder::new();

    for function in builtin_functions() {
        if let Err(e) = builder.register_arc(function) {
            tracing::error!(error = %e, "failed to register built-in function");
        }
    }

    Arc::new(builder.build())
});

/// Every built-in, grouped by family.
fn builtin_functions() -> Vec<Arc<dyn Function>> {
    vec![
        Arc::new(ArrayNew),
        Arc::new(ArrayGet),
        Arc::new(Replace),
        Arc::new(Split),
        Arc::new(ConsoleWrite),
        Arc::new(RegMatch),
        Arc::new(RegMatchAll),
        Arc::new(RegReplace),
        Arc::new(RegSplit),
        Arc::new(RegCount),
        Arc::new(RegEscape),
    ]
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Function \"{0}\" is already registered")]
    Duplicate(SmolStr),
}

#[derive(Debug, Default)]
pub struct RegistryBuilder {
    functions: FxHashMap<SmolStr, Arc<dyn Function>>,
    order: Vec<SmolStr>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from every function of `registry`, so that a host can add its own.
    pub fn extend(registry: &Registry) -> Self {
        Self {
            functions: registry.functions.clone(),
            order: registry.order.clone(),
        }
    }

    pub fn register(&mut self, function: impl Function + 'static) -> Result<&mut Self, RegistryError> {
        self.register_arc(Arc::new(function))
    }

    pub fn register_arc(&mut self, function: Arc<dyn Function>) -> Result<&mut Self, RegistryError> {
        let name = SmolStr::new(function.name());

        if self.functions.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }

        self.order.push(name.clone());
        self.functions.insert(name, function);
        Ok(self)
    }

    pub fn build(self) -> Registry {
        Registry {
            functions: self.functions,
            order: self.order,
        }
    }
}

/// Name to function lookup. Immutable once built.
#[derive(Debug)]
pub struct Registry {
    functions: FxHashMap<SmolStr, Arc<dyn Function>>,
    order: Vec<SmolStr>,
}

impl Registry {
    /// The process-wide registry of built-in functions.
    pub fn standard() -> Arc<Registry> {
        Arc::clone(&STANDARD_REGISTRY)
    }

    #[inline(always)]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Functions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Function>> {
        self.order.iter().filter_map(|name| self.functions.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(SmolStr::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Environment, Target, Value,
        error::runtime::{Exception, ExceptionKind},
        function::{Arity, Example, ThreadAffinity},
    };
    use rstest::rstest;

    #[derive(Debug)]
    struct Answer;

    impl Function for Answer {
        fn name(&self) -> &'static str {
            "answer"
        }

        fn arity(&self) -> Arity {
            Arity::Fixed(0)
        }

        fn params(&self) -> &'static [&'static str] {
            &[]
        }

        fn docs(&self) -> &'static str {
            "Returns 42."
        }

        fn examples(&self) -> &'static [Example] {
            const EXAMPLES: &[Example] = &[Example::new("The answer", "answer()", "42")];
            EXAMPLES
        }

        fn thrown(&self) -> &'static [ExceptionKind] {
            &[]
        }

        fn execute(&self, _: &[Value], _: &Target, _: &Environment) -> Result<Value, Exception> {
            Ok(Value::Integer(42))
        }
    }

    #[test]
    fn test_builtins_register_without_duplicates() {
        let mut builder = RegistryBuilder::new();
        for function in builtin_functions() {
            assert!(builder.register_arc(function).is_ok());
        }
        assert_eq!(builder.build().len(), Registry::standard().len());
    }

    #[test]
    fn test_standard_registration_order() {
        let names: Vec<_> = Registry::standard().names().map(str::to_string).collect();
        assert_eq!(
            names,
            vec![
                "array",
                "array_get",
                "replace",
                "split",
                "console",
                "reg_match",
                "reg_match_all",
                "reg_replace",
                "reg_split",
                "reg_count",
                "reg_escape",
            ]
        );
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut builder = RegistryBuilder::new();
        builder.register(Answer).unwrap();
        assert_eq!(
            builder.register(Answer).err(),
            Some(RegistryError::Duplicate(SmolStr::new("answer")))
        );
    }

    #[test]
    fn test_extend_standard_registry() {
        let mut builder = RegistryBuilder::extend(&Registry::standard());
        builder.register(Answer).unwrap();
        let registry = builder.build();

        assert!(registry.contains("reg_match"));
        assert!(registry.contains("answer"));
        assert_eq!(registry.names().last(), Some("answer"));
        assert!(!Registry::standard().contains("answer"));
    }

    #[test]
    fn test_every_function_documents_itself() {
        for function in Registry::standard().iter() {
            assert!(!function.docs().is_empty(), "{}", function.name());
            assert!(!function.examples().is_empty(), "{}", function.name());
            assert!(
                function.params().len() >= function.arity().counts()[0] as usize,
                "{}",
                function.name()
            );
        }
    }

    #[rstest]
    #[case::reg_match("reg_match", ThreadAffinity::AnyThread)]
    #[case::reg_match_all("reg_match_all", ThreadAffinity::AnyThread)]
    #[case::reg_replace("reg_replace", ThreadAffinity::AnyThread)]
    #[case::reg_split("reg_split", ThreadAffinity::AnyThread)]
    #[case::reg_count("reg_count", ThreadAffinity::AnyThread)]
    #[case::reg_escape("reg_escape", ThreadAffinity::AnyThread)]
    #[case::replace("replace", ThreadAffinity::AnyThread)]
    #[case::split("split", ThreadAffinity::AnyThread)]
    #[case::array("array", ThreadAffinity::AnyThread)]
    #[case::array_get("array_get", ThreadAffinity::AnyThread)]
    #[case::console("console", ThreadAffinity::MainThread)]
    fn test_thread_affinity(#[case] name: &str, #[case] expected: ThreadAffinity) {
        let registry = Registry::standard();
        let function = registry.get(name).unwrap();
        assert_eq!(function.thread_affinity(), expected);
    }

    #[test]
    fn test_every_standard_function_declares_thread_affinity() {
        for function in Registry::standard().iter() {
            assert_ne!(
                function.thread_affinity(),
                ThreadAffinity::Unspecified,
                "{}",
                function.name()
            );
        }
        assert_eq!(Answer.thread_affinity(), ThreadAffinity::Unspecified);
    }
}
