//! Regular expression functions.
//!
//! A pattern argument is either a string or an array `[pattern, flags]` where
//! flags combine `i` (case-insensitive), `m` (multi-line) and `s` (dot matches
//! newline).
use crate::{
    Environment, Target, Value,
    ast::node::Node,
    error::runtime::{Exception, ExceptionKind},
    value::Array,
};

use super::{
    Arity, Example, Function, OptimizationOption, ThreadAffinity, arg,
    pattern::{
        CompiledPattern, Replacement, compile_pattern, expand_literal_replacement, literal_regex,
    },
    string::split_count,
    string_literal,
};

const PURE_VALIDATED: &[OptimizationOption] = &[
    OptimizationOption::ConstantOffline,
    OptimizationOption::CacheReturn,
    OptimizationOption::OptimizeDynamic,
    OptimizationOption::NoSideEffects,
];

const FORMAT: &[ExceptionKind] = &[ExceptionKind::Format];

/// Compiles the pattern child when it is a literal, so that a malformed
/// pattern is reported before the script runs even if the other arguments are
/// dynamic.
fn validate_literal_pattern(
    children: &[Node],
    target: &Target,
) -> Result<Option<std::sync::Arc<CompiledPattern>>, Exception> {
    children
        .first()
        .and_then(Node::literal_value)
        .map(|pattern| compile_pattern(&pattern, target))
        .transpose()
}

#[derive(Debug)]
pub struct RegMatch;

impl Function for RegMatch {
    fn name(&self) -> &'static str {
        "reg_match"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }

    fn params(&self) -> &'static [&'static str] {
        &["pattern", "subject"]
    }

    fn docs(&self) -> &'static str {
        "Searches subject for the first match of pattern. Index 0 of the result is the whole match, \
         indexes 1..n are the capture groups and every named group is also stored under its name. \
         A group that did not participate is null. Returns an empty array when nothing matches."
    }

    fn examples(&self) -> &'static [Example] {
        const EXAMPLES: &[Example] = &[
            Example::new(
                "Numbered groups",
                r"reg_match('(\\d)(\\d)(\\d)', 'abc123')",
                "{0: 123, 1: 1, 2: 2, 3: 3}",
            ),
            Example::new(
                "Named groups are stored under their index and their name",
                r"reg_match('abc(?<foo>\\d+)(xyz)', 'abc123xyz')",
                "{0: abc123xyz, 1: 123, 2: xyz, foo: 123}",
            ),
            Example::new(
                "An optional group that did not participate",
                "reg_match('a(?<x>b)?c', 'ac')",
                "{0: ac, 1: null, x: null}",
            ),
            Example::new(
                "Flags are passed with the pattern",
                "reg_match(array('ABC', 'i'), 'xabcx')[0]",
                "abc",
            ),
        ];
        EXAMPLES
    }

    fn thrown(&self) -> &'static [ExceptionKind] {
        FORMAT
    }

    fn thread_affinity(&self) -> ThreadAffinity {
        ThreadAffinity::AnyThread
    }

    fn optimizations(&self) -> &'static [OptimizationOption] {
        PURE_VALIDATED
    }

    fn validate(&self, args: &[Value], target: &Target) -> Result<(), Exception> {
        compile_pattern(arg(args, 0), target).map(|_| ())
    }

    fn execute(&self, args: &[Value], target: &Target, _env: &Environment) -> Result<Value, Exception> {
        let pattern = compile_pattern(arg(args, 0), target)?;
        let subject = arg(args, 1).to_text();

        Ok(match pattern.regex.captures(&subject) {
            Some(captures) => pattern.captures_to_array(&captures).into(),
            None => Array::new().into(),
        })
    }

    fn optimize_dynamic(&self, children: &[Node], target: &Target) -> Result<Option<Node>, Exception> {
        validate_literal_pattern(children, target).map(|_| None)
    }
}

#[derive(Debug)]
pub struct RegMatchAll;

impl Function for RegMatchAll {
    fn name(&self) -> &'static str {
        "reg_match_all"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }

    fn params(&self) -> &'static [&'static str] {
        &["pattern", "subject"]
    }

    fn docs(&self) -> &'static str {
        "Returns every match of pattern in subject as an array of match arrays, each shaped like \
         the result of reg_match. Each search starts where the previous match ended."
    }

    fn examples(&self) -> &'static [Example] {
        const EXAMPLES: &[Example] = &[
            Example::new(
                "Consecutive matches",
                r"reg_match_all('(\\d{3})', 'abc123456')",
                "{{0: 123, 1: 123}, {0: 456, 1: 456}}",
            ),
            Example::new(
                "Reading a named group of the first match",
                r"reg_match_all('abc(?<foo>\\d+)(xyz)', 'abc123xyz')[0]['foo']",
                "123",
            ),
            Example::new("No match", "reg_match_all('x', 'abc')", "{}"),
        ];
        EXAMPLES
    }

    fn thrown(&self) -> &'static [ExceptionKind] {
        FORMAT
    }

    fn thread_affinity(&self) -> ThreadAffinity {
        ThreadAffinity::AnyThread
    }

    fn optimizations(&self) -> &'static [OptimizationOption] {
        PURE_VALIDATED
    }

    fn validate(&self, args: &[Value], target: &Target) -> Result<(), Exception> {
        compile_pattern(arg(args, 0), target).map(|_| ())
    }

    fn execute(&self, args: &[Value], target: &Target, _env: &Environment) -> Result<Value, Exception> {
        let pattern = compile_pattern(arg(args, 0), target)?;
        let subject = arg(args, 1).to_text();
        let mut matches = Array::new();
        let mut start = 0;

        while start <= subject.len() {
            let Some(captures) = pattern.regex.captures_at(&subject, start) else {
                break;
            };
            let Some(m) = captures.get(0) else {
                break;
            };

            matches.push(pattern.captures_to_array(&captures));

            start = if m.end() > m.start() {
                m.end()
            } else {
                subject[m.end()..]
                    .chars()
                    .next()
                    .map_or(subject.len() + 1, |c| m.end() + c.len_utf8())
            };
        }

        Ok(matches.into())
    }

    fn optimize_dynamic(&self, children: &[Node], target: &Target) -> Result<Option<Node>, Exception> {
        validate_literal_pattern(children, target).map(|_| None)
    }
}

#[derive(Debug)]
pub struct RegReplace;

impl Function for RegReplace {
    fn name(&self) -> &'static str {
        "reg_replace"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(3)
    }

    fn params(&self) -> &'static [&'static str] {
        &["pattern", "replacement", "subject"]
    }

    fn docs(&self) -> &'static str {
        "Replaces every match of pattern in subject with replacement. The replacement may refer \
         to groups with $n or ${name}; a backslash makes the next character literal. \
         Referring to a group the pattern does not have is a FormatException."
    }

    fn examples(&self) -> &'static [Example] {
        const EXAMPLES: &[Example] = &[
            Example::new(
                "Replace every digit",
                r"reg_replace('\\d', 'Z', '123abc')",
                "ZZZabc",
            ),
            Example::new(
                "Numbered backreference",
                r"reg_replace('abc(\\d+)', '$1', 'abc123')",
                "123",
            ),
            Example::new(
                "Named backreference",
                r"reg_replace('abc(?<foo>\\d+)', '${foo}', 'abc123')",
                "123",
            ),
        ];
        EXAMPLES
    }

    fn thrown(&self) -> &'static [ExceptionKind] {
        FORMAT
    }

    fn thread_affinity(&self) -> ThreadAffinity {
        ThreadAffinity::AnyThread
    }

    fn optimizations(&self) -> &'static [OptimizationOption] {
        PURE_VALIDATED
    }

    fn validate(&self, args: &[Value], target: &Target) -> Result<(), Exception> {
        let pattern = compile_pattern(arg(args, 0), target)?;
        Replacement::parse(&arg(args, 1).to_text(), &pattern, target).map(|_| ())
    }

    fn execute(&self, args: &[Value], target: &Target, _env: &Environment) -> Result<Value, Exception> {
        let pattern = compile_pattern(arg(args, 0), target)?;
        let replacement = Replacement::parse(&arg(args, 1).to_text(), &pattern, target)?;
        let subject = arg(args, 2).to_text();

        Ok(replacement.replace_all(&pattern, &subject).into())
    }

    fn optimize_dynamic(&self, children: &[Node], target: &Target) -> Result<Option<Node>, Exception> {
        let Some(pattern) = validate_literal_pattern(children, target)? else {
            return Ok(None);
        };

        let Some(replacement) = children.get(1).and_then(string_literal) else {
            return Ok(None);
        };
        Replacement::parse(replacement, &pattern, target)?;

        let [_, _, subject] = children else {
            return Ok(None);
        };

        match children.first().and_then(string_literal).and_then(literal_regex) {
            Some(literal) if !literal.is_empty() => {
                let expanded = expand_literal_replacement(replacement, &literal, target)?;
                tracing::debug!(location = %target, literal = %literal, "rewriting reg_replace to replace");

                Ok(Some(Node::call(
                    "replace",
                    target.clone(),
                    vec![
                        subject.clone(),
                        Node::string(literal.into_owned(), children[0].target.clone()),
                        Node::string(expanded, children[1].target.clone()),
                    ],
                )))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Debug)]
pub struct RegSplit;

impl Function for RegSplit {
    fn name(&self) -> &'static str {
        "reg_split"
    }

    fn arity(&self) -> Arity {
        Arity::Range(2, 3)
    }

    fn params(&self) -> &'static [&'static str] {
        &["pattern", "subject", "limit"]
    }

    fn docs(&self) -> &'static str {
        "Splits subject on every match of pattern. The optional limit is the number of cuts \
         allowed, so the result has at most limit + 1 elements; a limit of 0 still allows one cut \
         and a negative limit allows any number."
    }

    fn examples(&self) -> &'static [Example] {
        const EXAMPLES: &[Example] = &[
            Example::new(
                "Split on digits",
                r"reg_split('\\d', 'a1b2c3d')",
                "{a, b, c, d}",
            ),
            Example::new(
                "A limit of 0 allows one cut",
                r"reg_split('\\d', 'a1b2c3', 0)",
                "{a, b2c3}",
            ),
            Example::new(
                "At most limit + 1 elements",
                r"reg_split('\\d', 'a1b2c3d', 2)",
                "{a, b, c3d}",
            ),
        ];
        EXAMPLES
    }

    fn thrown(&self) -> &'static [ExceptionKind] {
        &[ExceptionKind::Format, ExceptionKind::Cast]
    }

    fn thread_affinity(&self) -> ThreadAffinity {
        ThreadAffinity::AnyThread
    }

    fn optimizations(&self) -> &'static [OptimizationOption] {
        &[
            OptimizationOption::CacheReturn,
            OptimizationOption::OptimizeDynamic,
            OptimizationOption::NoSideEffects,
        ]
    }

    fn validate(&self, args: &[Value], target: &Target) -> Result<(), Exception> {
        compile_pattern(arg(args, 0), target)?;
        split_count(args.get(2), target).map(|_| ())
    }

    fn execute(&self, args: &[Value], target: &Target, _env: &Environment) -> Result<Value, Exception> {
        let pattern = compile_pattern(arg(args, 0), target)?;
        let subject = arg(args, 1).to_text();
        let max_cuts = split_count(args.get(2), target)?;

        let mut parts = Array::new();
        let mut last = 0;
        let mut cuts = 0;

        for m in pattern.regex.find_iter(&subject) {
            if max_cuts.is_some_and(|max| cuts >= max) {
                break;
            }
            if m.end() == 0 {
                continue;
            }
            parts.push(&subject[last..m.start()]);
            last = m.end();
            cuts += 1;
        }
        parts.push(&subject[last..]);

        Ok(parts.into())
    }

    fn optimize_dynamic(&self, children: &[Node], target: &Target) -> Result<Option<Node>, Exception> {
        if validate_literal_pattern(children, target)?.is_none() {
            return Ok(None);
        }

        match children.first().and_then(string_literal).and_then(literal_regex) {
            Some(literal) if !literal.is_empty() => {
                tracing::debug!(location = %target, literal = %literal, "rewriting reg_split to split");

                let mut rewritten =
                    vec![Node::string(literal.into_owned(), children[0].target.clone())];
                rewritten.extend(children[1..].iter().cloned());

                Ok(Some(Node::call("split", target.clone(), rewritten)))
            }
            _ => Ok(None),
        }
    }
}

#[derive(Debug)]
pub struct RegCount;

impl Function for RegCount {
    fn name(&self) -> &'static str {
        "reg_count"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(2)
    }

    fn params(&self) -> &'static [&'static str] {
        &["pattern", "subject"]
    }

    fn docs(&self) -> &'static str {
        "Counts the non-overlapping matches of pattern in subject."
    }

    fn examples(&self) -> &'static [Example] {
        const EXAMPLES: &[Example] = &[
            Example::new("Count digits", r"reg_count('\\d', '123abc')", "3"),
            Example::new("No match", "reg_count('x', 'abc')", "0"),
        ];
        EXAMPLES
    }

    fn thrown(&self) -> &'static [ExceptionKind] {
        FORMAT
    }

    fn thread_affinity(&self) -> ThreadAffinity {
        ThreadAffinity::AnyThread
    }

    fn optimizations(&self) -> &'static [OptimizationOption] {
        PURE_VALIDATED
    }

    fn validate(&self, args: &[Value], target: &Target) -> Result<(), Exception> {
        compile_pattern(arg(args, 0), target).map(|_| ())
    }

    fn execute(&self, args: &[Value], target: &Target, _env: &Environment) -> Result<Value, Exception> {
        let pattern = compile_pattern(arg(args, 0), target)?;
        let subject = arg(args, 1).to_text();

        Ok(pattern.regex.find_iter(&subject).count().into())
    }

    fn optimize_dynamic(&self, children: &[Node], target: &Target) -> Result<Option<Node>, Exception> {
        validate_literal_pattern(children, target).map(|_| None)
    }
}

#[derive(Debug)]
pub struct RegEscape;

impl Function for RegEscape {
    fn name(&self) -> &'static str {
        "reg_escape"
    }

    fn arity(&self) -> Arity {
        Arity::Fixed(1)
    }

    fn params(&self) -> &'static [&'static str] {
        &["text"]
    }

    fn docs(&self) -> &'static str {
        "Escapes every regular expression metacharacter in text, so that it matches itself \
         when used as a pattern."
    }

    fn examples(&self) -> &'static [Example] {
        const EXAMPLES: &[Example] = &[
            Example::new("Escape a pattern", r"reg_escape('\\d+')", r"\\d\+"),
            Example::new(
                "Match text that contains metacharacters",
                "reg_count(reg_escape('a.b'), 'a.b axb')",
                "1",
            ),
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
        Ok(regex_lite::escape(&arg(args, 0).to_text()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn run(function: &dyn Function, args: Vec<Value>) -> Result<Value, Exception> {
        function.execute(&args, &Target::default(), &Environment::default())
    }

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    fn lit(text: &str) -> Node {
        Node::string(text, Target::default())
    }

    fn dynamic() -> Node {
        Node::call("console", Target::default(), vec![lit("x")])
    }

    #[rstest]
    #[case::no_match(vec![s("x"), s("abc")], "{}")]
    #[case::whole_match(vec![s("b+"), s("abbbc")], "{0: bbb}")]
    #[case::first_only(vec![s("\\d"), s("a1b2")], "{0: 1}")]
    #[case::quoted(vec![s("\\Q.\\E"), s("a.b")], "{0: .}")]
    #[case::dot_all(
        vec![Value::from(vec!["a.b", "s"]), s("a\nb")],
        "{0: a\nb}"
    )]
    fn test_reg_match(#[case] args: Vec<Value>, #[case] expected: &str) {
        assert_eq!(run(&RegMatch, args).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case::bad_pattern(vec![s("("), s("x")])]
    #[case::bad_flag(vec![Value::from(vec!["a", "q"]), s("a")])]
    fn test_reg_match_format_errors(#[case] args: Vec<Value>) {
        assert_eq!(run(&RegMatch, args).unwrap_err().kind, ExceptionKind::Format);
    }

    #[rstest]
    #[case::zero_width(vec![s("x*"), s("ab")], "{{0: }, {0: }, {0: }}")]
    #[case::empty_subject(vec![s("a"), s("")], "{}")]
    #[case::multibyte_zero_width(vec![s(""), s("é")], "{{0: }, {0: }}")]
    #[case::adjacent(vec![s("a"), s("aa")], "{{0: a}, {0: a}}")]
    fn test_reg_match_all(#[case] args: Vec<Value>, #[case] expected: &str) {
        assert_eq!(run(&RegMatchAll, args).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case::no_match(vec![s("x"), s("y"), s("abc")], "abc")]
    #[case::swap(vec![s("(\\w)(\\d)"), s("$2$1"), s("a1 b2")], "1a 2b")]
    #[case::escaped(vec![s("a"), s("\\$"), s("aa")], "$$")]
    #[case::case_insensitive(vec![Value::from(vec!["A", "i"]), s("-"), s("aA")], "--")]
    fn test_reg_replace(#[case] args: Vec<Value>, #[case] expected: &str) {
        assert_eq!(run(&RegReplace, args).unwrap(), Value::from(expected));
    }

    #[test]
    fn test_reg_replace_missing_group_fails_without_match() {
        let err = run(&RegReplace, vec![s("x"), s("$1"), s("abc")]).unwrap_err();
        assert_eq!(err.kind, ExceptionKind::Format);
    }

    #[rstest]
    #[case::unbounded(vec![s(","), s("a,b,,c,")], "{a, b, , c, }")]
    #[case::negative(vec![s(","), s("a,b,c"), Value::from(-1_i64)], "{a, b, c}")]
    #[case::zero(vec![s(","), s("a,b,c"), Value::from(0_i64)], "{a, b,c}")]
    #[case::one(vec![s(","), s("a,b,c"), Value::from(1_i64)], "{a, b,c}")]
    #[case::numeric_string(vec![s(","), s("a,b,c"), s("1")], "{a, b,c}")]
    #[case::no_match(vec![s(","), s("abc"), Value::from(0_i64)], "{abc}")]
    #[case::empty_pattern(vec![s(""), s("abc")], "{a, b, c, }")]
    #[case::leading(vec![s(","), s(",a")], "{, a}")]
    fn test_reg_split(#[case] args: Vec<Value>, #[case] expected: &str) {
        assert_eq!(run(&RegSplit, args).unwrap().to_string(), expected);
    }

    #[test]
    fn test_reg_split_bad_limit() {
        let err = run(&RegSplit, vec![s(","), s("a"), s("x")]).unwrap_err();
        assert_eq!(err.kind, ExceptionKind::Cast);
    }

    #[rstest]
    #[case::digits(vec![s("\\d"), s("1a22")], 3)]
    #[case::non_overlapping(vec![s("aa"), s("aaaa")], 2)]
    #[case::none(vec![s("x"), s("")], 0)]
    fn test_reg_count(#[case] args: Vec<Value>, #[case] expected: i64) {
        assert_eq!(run(&RegCount, args).unwrap(), Value::Integer(expected));
    }

    #[rstest]
    #[case::plain("abc", "abc")]
    #[case::meta("a.b*c", "a\\.b\\*c")]
    #[case::brackets("[x]", "\\[x\\]")]
    fn test_reg_escape(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(run(&RegEscape, vec![s(input)]).unwrap(), Value::from(expected));
    }

    #[test]
    fn test_reg_replace_rewrites_literal_pattern() {
        let rewritten = RegReplace
            .optimize_dynamic(&[lit("abc"), lit("<$0>"), dynamic()], &Target::default())
            .unwrap();

        assert_eq!(
            rewritten,
            Some(Node::call(
                "replace",
                Target::default(),
                vec![dynamic(), lit("abc"), lit("<abc>")]
            ))
        );
    }

    #[test]
    fn test_reg_replace_rewrites_quoted_pattern() {
        let rewritten = RegReplace
            .optimize_dynamic(&[lit("\\Qa.b\\E"), lit("X"), lit("a.b")], &Target::default())
            .unwrap();

        assert_eq!(
            rewritten,
            Some(Node::call(
                "replace",
                Target::default(),
                vec![lit("a.b"), lit("a.b"), lit("X")]
            ))
        );
    }

    #[rstest]
    #[case::meta_pattern(vec![lit("a.c"), lit("X"), lit("abc")])]
    #[case::dynamic_pattern(vec![dynamic(), lit("X"), lit("abc")])]
    #[case::dynamic_replacement(vec![lit("abc"), dynamic(), lit("abc")])]
    #[case::empty_literal(vec![lit(""), lit("X"), lit("abc")])]
    fn test_reg_replace_no_rewrite(#[case] children: Vec<Node>) {
        assert_eq!(
            RegReplace.optimize_dynamic(&children, &Target::default()),
            Ok(None)
        );
    }

    #[rstest]
    #[case::bad_pattern(vec![lit("("), dynamic(), dynamic()])]
    #[case::bad_reference(vec![lit("a(b)"), lit("$2"), dynamic()])]
    #[case::bad_literal_reference(vec![lit("abc"), lit("$1"), dynamic()])]
    fn test_reg_replace_validates_literal_prefix(#[case] children: Vec<Node>) {
        let err = RegReplace
            .optimize_dynamic(&children, &Target::new(1, 1))
            .unwrap_err();
        assert_eq!(err.kind, ExceptionKind::Format);
    }

    #[test]
    fn test_reg_split_rewrite_forwards_limit() {
        let rewritten = RegSplit
            .optimize_dynamic(
                &[lit(","), dynamic(), Node::integer(2, Target::default())],
                &Target::default(),
            )
            .unwrap();

        assert_eq!(
            rewritten,
            Some(Node::call(
                "split",
                Target::default(),
                vec![lit(","), dynamic(), Node::integer(2, Target::default())]
            ))
        );
    }

    #[rstest]
    #[case::meta(vec![lit("\\d"), dynamic()])]
    #[case::flagged(vec![Node::call("array", Target::default(), vec![lit(","), lit("i")]), dynamic()])]
    fn test_reg_split_no_rewrite(#[case] children: Vec<Node>) {
        assert_eq!(RegSplit.optimize_dynamic(&children, &Target::default()), Ok(None));
    }

    #[test]
    fn test_reg_match_hook_validates_literal_pattern_with_dynamic_subject() {
        let err = RegMatch
            .optimize_dynamic(&[lit("[a"), dynamic()], &Target::new(3, 4))
            .unwrap_err();
        assert_eq!(err.kind, ExceptionKind::Format);
        assert_eq!(err.target, Target::new(3, 4));
    }
}
