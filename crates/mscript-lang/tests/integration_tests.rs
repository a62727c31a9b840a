use std::sync::Arc;

use mscript_lang::{
    BufferConsole, CompileError, Engine, ErrorCause, ExceptionKind, RuntimeError, Target, Value,
};
use rstest::{fixture, rstest};

#[fixture]
fn engine() -> Engine {
    Engine::default()
}

fn engine_with(optimize: bool) -> Engine {
    let mut engine = Engine::default();
    engine.set_optimize(optimize);
    engine
}

#[rstest]
#[case::backreferences(r"reg_replace('(\\w+)@(\\w+)', '$2 at $1', 'me@home')", "home at me")]
#[case::quoted_replace_with_whole_match(r"reg_replace('\\Q.\\E', '[$0]', 'a.b')", "a[.]b")]
#[case::literal_split_keeps_empty_elements("reg_split(',', 'a,b,,c')", "{a, b, , c}")]
#[case::split_limit("reg_split('-', 'a-b-c', 1)", "{a, b-c}")]
#[case::negative_split_limit("split(',', 'a,b,c', -1)", "{a, b, c}")]
#[case::count("reg_count('a', 'banana')", "3")]
#[case::match_all(r"reg_match_all('\\d', 'a1b2')", "{{0: 1}, {0: 2}}")]
#[case::no_match("reg_match('z', 'abc')", "{}")]
#[case::flags(r"reg_match(array('^B', 'im'), 'a\nb')[0]", "b")]
#[case::named_group("reg_match('(?<year>\\d{4})', 'in 2024')['year']", "2024")]
#[case::escape("reg_escape('a.b')", r"a\.b")]
#[case::escape_then_match("reg_count(reg_escape('1+1'), '1+1=2, 1+1')", "2")]
#[case::quoted_literal(r"reg_count('\\Q.*\\E', 'a.*b.*')", "2")]
#[case::last_statement_wins("'x'; 'y';", "y")]
#[case::comments("# leading comment\nreg_count('b', 'abba') # trailing", "2")]
#[case::empty_program("", "null")]
fn test_eval(#[values(true, false)] optimize: bool, #[case] code: &str, #[case] expected: &str) {
    let result = engine_with(optimize).eval(code);
    assert_eq!(result.map(|v| v.to_string()).unwrap(), expected);
}

#[rstest]
#[case::bad_pattern("reg_match('(', 'x')", ExceptionKind::Format)]
#[case::bad_pattern_dynamic_subject("reg_count('[a', console('x'))", ExceptionKind::Format)]
#[case::bad_group_reference("reg_replace('(a)', '$2', 'xyz')", ExceptionKind::Format)]
#[case::unknown_group_name("reg_replace('(?<a>x)', '${b}', 'xyz')", ExceptionKind::Format)]
#[case::bad_limit("reg_split('a', 'banana', 'many')", ExceptionKind::Cast)]
fn test_compile_time_exception(engine: Engine, #[case] code: &str, #[case] kind: ExceptionKind) {
    let error = engine.compile(code).unwrap_err();

    assert!(matches!(error.cause, ErrorCause::Compile(CompileError::Exception(_))));
    assert_eq!(error.cause.exception_kind(), Some(kind));
}

#[rstest]
#[case::bad_pattern("reg_match('(', 'x')", ExceptionKind::Format)]
#[case::bad_group_reference("reg_replace('(a)', '$2', 'xyz')", ExceptionKind::Format)]
#[case::bad_limit("reg_split('a', 'banana', 'many')", ExceptionKind::Cast)]
fn test_same_exception_at_runtime_without_optimizer(
    #[case] code: &str,
    #[case] kind: ExceptionKind,
) {
    let error = engine_with(false).eval(code).unwrap_err();

    assert!(matches!(error.cause, ErrorCause::Runtime(RuntimeError::Exception(_))));
    assert_eq!(error.cause.exception_kind(), Some(kind));
}

#[rstest]
#[case::unknown_flag("reg_match(array('a', 'z'), 'a')", ExceptionKind::Format)]
#[case::missing_key("array('a')[3]", ExceptionKind::IndexOverflow)]
#[case::not_an_array("array_get('a', 0)", ExceptionKind::Cast)]
fn test_runtime_exception(
    #[values(true, false)] optimize: bool,
    #[case] code: &str,
    #[case] kind: ExceptionKind,
) {
    let error = engine_with(optimize).eval(code).unwrap_err();

    assert!(matches!(error.cause, ErrorCause::Runtime(_)));
    assert_eq!(error.cause.exception_kind(), Some(kind));
}

#[rstest]
fn test_error_target_points_at_call(engine: Engine) {
    let error = engine.eval("'a';\n  reg_match('(', 'x')").unwrap_err();
    assert_eq!(error.target(), &Target::new(2, 3));
}

#[rstest]
fn test_unknown_function(engine: Engine) {
    let error = engine.eval("nope(1)").unwrap_err();
    assert_eq!(
        error.cause,
        ErrorCause::Compile(CompileError::NotDefined(Target::new(1, 1), "nope".to_string()))
    );
}

#[rstest]
fn test_invalid_number_of_arguments(engine: Engine) {
    let error = engine.eval("reg_escape('a', 'b')").unwrap_err();
    assert!(matches!(
        error.cause,
        ErrorCause::Compile(CompileError::InvalidNumberOfArguments { got: 2, .. })
    ));
}

#[test]
fn test_unused_pure_statements_are_not_run() {
    let console = Arc::new(BufferConsole::default());
    let engine = Engine::default().with_console(console.clone());

    let value = engine
        .eval("reg_count('a', 'aaa'); console('kept'); 'done'")
        .unwrap();

    assert_eq!(value, Value::from("done"));
    assert_eq!(console.lines(), vec!["kept".to_string()]);
}

#[test]
fn test_repeated_evaluation_uses_cached_results() {
    let engine = Engine::default();
    let program = engine.compile("reg_match_all('a', 'banana')").unwrap();

    let first = engine.eval_program(&program, "").unwrap();
    let second = engine.eval_program(&program, "").unwrap();

    assert_eq!(first, second);
    assert_eq!(first.to_string(), "{{0: a}, {0: a}, {0: a}}");
}

#[test]
fn test_engine_is_shareable_across_threads() {
    let engine = Arc::new(Engine::default());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                engine
                    .eval(&format!("reg_count('\\d', '{}')", "1".repeat(i + 1)))
                    .unwrap()
            })
        })
        .collect();

    let counts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(
        counts,
        vec![Value::Integer(1), Value::Integer(2), Value::Integer(3), Value::Integer(4)]
    );
}
