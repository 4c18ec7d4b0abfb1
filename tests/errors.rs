use pretty_assertions::assert_eq;
use smil::{compile, run, ErrorClass, ErrorKind, SmilError};

fn run_err(source: &str, inputs: &[&str]) -> SmilError {
    match run(source, inputs) {
        Ok(execution) => panic!("Expected an error, got {:?}", execution),
        Err(e) => e,
    }
}

fn position(err: &SmilError) -> (usize, usize) {
    let span = err.span.expect("error should have a position");
    (span.line, span.column)
}

#[test]
fn test_unknown_sigil_is_a_syntax_error() {
    let err = run_err(":P :$ :D\n  ?? o/", &["1"]);
    assert_eq!(err.class(), ErrorClass::Syntax);
    assert_eq!(err.kind, ErrorKind::UnexpectedToken("??".to_string()));
    assert_eq!(position(&err), (2, 3));
}

#[test]
fn test_unterminated_constructs() {
    assert_eq!(run_err(":P :$", &["1"]).kind, ErrorKind::Unterminated("print"));
    assert_eq!(run_err("8) :$ 8| o/", &["1"]).kind, ErrorKind::Unterminated("loop"));
    assert_eq!(run_err(":( name", &[]).kind, ErrorKind::Unterminated("variable"));
}

#[test]
fn test_operator_needs_an_operand() {
    let err = run_err(":P :$ :+ o/ :D", &["1"]);
    assert_eq!(err.class(), ErrorClass::Syntax);
    assert_eq!(position(&err), (1, 10));
}

#[test]
fn test_assignment_targets() {
    let err = run_err(":$ := :( x :)", &["1"]);
    assert_eq!(err.class(), ErrorClass::Assignability);
    assert_eq!(position(&err), (1, 1));

    let err = run_err(":= :$", &["1"]);
    assert_eq!(err.kind, ErrorKind::MissingAssignmentTarget);

    let err = run_err(":^ :$ :v :$", &["1"]);
    assert_eq!(err.class(), ErrorClass::Assignability);
}

#[test]
fn test_invalid_string_operations() {
    let err = run_err(":P :$ :* :$:$ :D", &["ab", "cd"]);
    assert_eq!(err.class(), ErrorClass::InvalidOperation);
    assert_eq!(err.kind.to_string(), "invalid operation: string * string");

    let err = run_err(":P :$ && :$:$ :D", &["ab", "1"]);
    assert_eq!(err.kind.to_string(), "invalid operation: string && integer");
}

#[test]
fn test_division_by_zero() {
    assert_eq!(
        run_err(":P :$ :/ :$:$ :D", &["1", "0"]).class(),
        ErrorClass::DivideByZero
    );
    assert_eq!(
        run_err(":P :$ :% :$:$ :D", &["1", "0"]).class(),
        ErrorClass::DivideByZero
    );
    assert_eq!(
        run_err(":P :$ :/ :$:$ :D", &["text", "0"]).class(),
        ErrorClass::DivideByZero
    );
}

#[test]
fn test_missing_inputs() {
    let err = run_err(":P :$ :$:$:$ :D", &["only", "two"]);
    assert_eq!(err.class(), ErrorClass::MissingInput);
    assert_eq!(err.kind, ErrorKind::MissingInputs { expected: 3, got: 2 });
    assert_eq!(err.span, None);
}

#[test]
fn test_pop_from_empty_stack() {
    let err = run_err("o/ :v :( x :)", &[]);
    assert_eq!(err.kind, ErrorKind::StackUnderflow);
    assert_eq!(position(&err), (1, 4));
}

#[test]
fn test_error_display_points_at_operator() {
    let source = "o/\n:P :$ :/ :$:$ :D";
    let err = run_err(source, &["1", "0"]).with_source(source);
    assert_eq!(
        err.to_string(),
        "(2:7): division by zero\n  | :P :$ :/ :$:$ :D\n  |       ^"
    );
}

#[test]
fn test_division_by_zero_is_found_at_run_time() {
    assert!(compile(":P :$ :/ :$:$ :D").is_ok());
}

#[test]
fn test_oversized_repetition_is_an_error() {
    let err = run_err(":P :$ :* :$:$ :D", &["ab", "9223372036854775807"]);
    assert_eq!(err.kind, ErrorKind::StringTooLarge);
    assert_eq!(err.class(), ErrorClass::Runtime);
    assert_eq!(position(&err), (1, 7));
}
