use crate::errors::ErrorKind;
use crate::parser::parse;

/// Returns the (line, column, message) of the compilation error
fn compilation_error(input: &str) -> (usize, usize, String) {
    let res = parse("tpl", input);
    assert!(res.is_err());
    let err = res.unwrap_err();
    match err.kind {
        ErrorKind::Compilation { ref path, line, column, ref message } => {
            assert_eq!(path, "tpl");
            (line, column, message.clone())
        }
        _ => panic!("expected a compilation error, got {:?}", err.kind),
    }
}

#[test]
fn lone_at_sign() {
    let (line, column, _) = compilation_error("Hello @ world");
    assert_eq!(line, 1);
    assert!(column >= 7);
}

#[test]
fn unterminated_explicit_expression() {
    let (line, _, _) = compilation_error("@(Model.Name");
    assert_eq!(line, 1);
}

#[test]
fn unterminated_block_points_past_the_opening() {
    let (line, _, _) = compilation_error("@if (true) {\nnever closed");
    assert_eq!(line, 2);
}

#[test]
fn missing_semicolon_in_code_block() {
    let (line, _, _) = compilation_error("text\n@{ Layout = \"x\" }");
    assert_eq!(line, 2);
}

#[test]
fn duplicate_sections_are_rejected_case_insensitively() {
    let (line, column, message) = compilation_error("@section Title {a}\n@section title {b}");
    assert_eq!((line, column), (2, 1));
    assert_eq!(message, "Section 'title' is already defined");
}

#[test]
fn model_declared_twice() {
    let (line, column, message) = compilation_error("@model A\n@model B");
    assert_eq!((line, column), (2, 1));
    assert_eq!(message, "`@model` can only be declared once");
}

#[test]
fn section_inside_a_block_is_rejected() {
    compilation_error("@if (true) {@section Title {x}}");
}

#[test]
fn integer_out_of_bounds() {
    let (line, column, message) = compilation_error("@(99999999999999999999)");
    assert_eq!((line, column), (1, 3));
    assert_eq!(message, "Integer out of bounds: `99999999999999999999`");
}
