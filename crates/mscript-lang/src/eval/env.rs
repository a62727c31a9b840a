use std::{
    any::{Any, TypeId},
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use rustc_hash::FxHashMap;

use crate::function::console::Console;

/// Execution context handed to every function call.
///
/// The evaluator never looks inside. It is a type map, so a host can install
/// whatever services its functions need; `console` reads an `Arc<dyn Console>`.
#[derive(Default)]
pub struct Environment {
    values: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_console(mut self, console: Arc<dyn Console>) -> Self {
        self.insert(console);
        self
    }

    /// Stores `value`, returning the value of the same type it replaced.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.values
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn remove<T: Any + Send + Sync>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Debug for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("values", &self.values.len())
            .finish()
    }
}
