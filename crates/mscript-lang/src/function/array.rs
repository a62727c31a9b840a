use crate::{
    Environment, Target, Value,
    error::runtime::{Exception, ExceptionKind},
    value::{Array, Key},
};

use super::{Arity, Example, Function, OptimizationOption, ThreadAffinity, arg};

#[derive(Debug)]
pub struct ArrayNew;

impl Function for ArrayNew {
    fn name(&self) -> &'static str {
        "array"
    }

    fn arity(&self) -> Arity {
        Arity::AtLeast(0)
    }

    fn params(&self) -> &'static [&'static str] {
        &["values"]
    }

    fn docs(&self) -> &'static str {
        "Creates an array holding the arguments, indexed from 0."
    }

    fn examples(&self) -> &'static [Example] {
        const EXAMPLES: &[Example] = &[
            Example::new("Three integers", "array(1, 2, 3)", "{1, 2, 3}"),
            Example::new("Empty", "array()", "{}"),
        ];
        EXAMPLES
    }

    fn thrown(&self) -> &'static [ExceptionKind] {
        &[]
    }

    fn thread_affinity(&self) -> ThreadAffinity {
        ThreadAffinity::AnyThread
    }

    fn optimizations(&self) -> &'static [OptimizationOption] {
        &[OptimizationOption::CacheReturn, OptimizationOption::NoSideEffects]
    }

    fn execute(&self, args: &[Value], _target: &Target, _env: &Environment) -> Result<Value, Exception> {
        Ok(args.iter().cloned().collect::<Array>().into())
    }
}

#[derive(Debug)]
pub struct ArrayGet;

impl Function for ArrayGet {
    fn name(&self) -> &'static str {
        "array_get"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }

    fn params(&self) -> &'static [&'static str] {
        &["array", "index"]
    }

    fn docs(&self) -> &'static str {
        "Returns the value stored under index, which is an integer or a name. `x[i]` is shorthand \
         for array_get(x, i)."
    }

    fn examples(&self) -> &'static [Example] {
        const EXAMPLES: &[Example] = &[
            Example::new("By index", "array('a', 'b')[0]", "a"),
            Example::new("A numeric string addresses the index", "array_get(array('a', 'b'), '1')", "b"),
        ];
        EXAMPLES
    }

    fn thrown(&self) -> &'static [ExceptionKind] {
        &[ExceptionKind::Cast, ExceptionKind::IndexOverflow]
    }

    fn thread_affinity(&self) -> ThreadAffinity {
        ThreadAffinity::AnyThread
    }

    fn optimizations(&self) -> &'static [OptimizationOption] {
        &[OptimizationOption::NoSideEffects]
    }

    fn execute(&self, args: &[Value], target: &Target, _env: &Environment) -> Result<Value, Exception> {
        let array = match arg(args, 0) {
            Value::Array(array) => array,
            other => {
                return Err(Exception::new(
                    ExceptionKind::Cast,
                    format!("Expecting an array, but received {}", other.name()),
                    target.clone(),
                ));
            }
        };

        let key = match arg(args, 1) {
            Value::Integer(i) => Key::Index(*i),
            Value::String(name) => Key::name(name),
            other => {
                return Err(Exception::new(
                    ExceptionKind::Cast,
                    format!("Expecting an array key, but received {}", other.name()),
                    target.clone(),
                ));
            }
        };

        array.get(&key).cloned().ok_or_else(|| {
            Exception::new(
                ExceptionKind::IndexOverflow,
                format!("The key \"{}\" does not exist in the array", key),
                target.clone(),
            )
        })
    }
}
