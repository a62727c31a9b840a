use crate::{
    Environment, Target, Value,
    error::runtime::{Exception, ExceptionKind},
    value::Array,
};

use super::{Arity, Example, Function, OptimizationOption, ThreadAffinity, arg};

/// Converts a split limit into the number of cuts allowed. `None` means no bound.
///
/// A limit of `0` allows one cut, like `1`; a negative or missing limit is unbounded.
pub(crate) fn split_count(limit: Option<&Value>, target: &Target) -> Result<Option<usize>, Exception> {
    match limit {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let limit = value.to_integer(target)?;
            Ok((limit >= 0).then(|| limit.max(1) as usize))
        }
    }
}

#[derive(Debug)]
pub struct Replace;

impl Function for Replace {
    fn name(&self) -> &'static str {
        "replace"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(3)
    }

    fn params(&self) -> &'static [&'static str] {
        &["subject", "what", "with"]
    }

    fn docs(&self) -> &'static str {
        "Replaces every occurrence of the plain text what in subject with the plain text with, \
         left to right and without overlaps."
    }

    fn examples(&self) -> &'static [Example] {
        const EXAMPLES: &[Example] = &[
            Example::new("Replace a prefix", "replace('abc123', 'abc', 'X')", "X123"),
            Example::new("Every occurrence", "replace('a.b.c', '.', '-')", "a-b-c"),
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
        &[
            OptimizationOption::ConstantOffline,
            OptimizationOption::CacheReturn,
            OptimizationOption::NoSideEffects,
        ]
    }

    fn execute(&self, args: &[Value], _target: &Target, _env: &Environment) -> Result<Value, Exception> {
        let subject = arg(args, 0).to_text();
        let what = arg(args, 1).to_text();

        if what.is_empty() {
            return Ok(subject.into_owned().into());
        }

        Ok(subject.replace(&*what, &arg(args, 2).to_text()).into())
    }
}

#[derive(Debug)]
pub struct Split;

impl Function for Split {
    fn name(&self) -> &'static str {
        "split"
    }

    fn arity(&self) -> Arity {
        Arity::Range(2, 3)
    }

    fn params(&self) -> &'static [&'static str] {
        &["delimiter", "subject", "limit"]
    }

    fn docs(&self) -> &'static str {
        "Splits subject on the plain text delimiter. The optional limit is the number of cuts \
         allowed, as in reg_split. An empty delimiter splits between characters."
    }

    fn examples(&self) -> &'static [Example] {
        const EXAMPLES: &[Example] = &[
            Example::new("Split on commas", "split(',', 'a,b,c')", "{a, b, c}"),
            Example::new("At most one cut", "split(',', 'a,b,c', 1)", "{a, b,c}"),
            Example::new("Characters", "split('', 'abc')", "{a, b, c}"),
        ];
        EXAMPLES
    }

    fn thrown(&self) -> &'static [ExceptionKind] {
        &[ExceptionKind::Cast]
    }

    fn thread_affinity(&self) -> ThreadAffinity {
        ThreadAffinity::AnyThread
    }

    fn optimizations(&self) -> &'static [OptimizationOption] {
        &[
            OptimizationOption::ConstantOffline,
            OptimizationOption::CacheReturn,
            OptimizationOption::NoSideEffects,
        ]
    }

    fn validate(&self, args: &[Value], target: &Target) -> Result<(), Exception> {
        split_count(args.get(2), target).map(|_| ())
    }

    fn execute(&self, args: &[Value], target: &Target, _env: &Environment) -> Result<Value, Exception> {
        let delimiter = arg(args, 0).to_text();
        let subject = arg(args, 1).to_text();
        let max_cuts = split_count(args.get(2), target)?;

        let parts: Array = if delimiter.is_empty() {
            let cuts = subject
                .char_indices()
                .skip(1)
                .map(|(i, _)| i)
                .take(max_cuts.unwrap_or(usize::MAX))
                .chain(std::iter::once(subject.len()));

            let mut last = 0;
            cuts.map(|cut| {
                let part = &subject[last..cut];
                last = cut;
                part
            })
            .collect()
        } else {
            match max_cuts {
                Some(cuts) => subject.splitn(cuts + 1, &*delimiter).collect(),
                None => subject.split(&*delimiter).collect(),
            }
        };

        Ok(parts.into())
    }
}
