use std::error::Error as StdError;

use crate::errors::ErrorKind;
use crate::model::Model;

use super::{engine_with, world};

#[test]
fn is_section_defined_checks_the_child() {
    let layout = "@if (IsSectionDefined(\"Scripts\")) {<script>@RenderSection(\"Scripts\")</script>}\
                  @if (!IsSectionDefined(\"Footer\")) {no footer}|@RenderBody()";
    let engine = engine_with(vec![
        ("_Layout", layout),
        ("with_scripts", "@section Scripts {run()}\nbody"),
        ("without", "body"),
    ]);
    let model = Model::new();
    assert_eq!(engine.render("with_scripts", &model).unwrap(), "<script>run()</script>no footer|body");
    assert_eq!(engine.render("without", &model).unwrap(), "no footer|body");
}

#[test]
fn is_section_defined_outside_layouts_is_false() {
    let engine = engine_with(vec![("page", "@section A {a}\n@IsSectionDefined(\"A\")")]);
    assert_eq!(engine.render("page", &Model::new()).unwrap(), "False");
}

#[test]
fn sections_are_defined_once_the_page_ran() {
    let engine = engine_with(vec![("page", "@section Title {<h1>@Model.Name</h1>}\nbody")]);
    let instance = engine.execute("page", &world()).unwrap();
    assert!(instance.is_section_defined("Title"));
    assert!(!instance.is_section_defined("Scripts"));
    assert_eq!(instance.section("Title"), Some("<h1>World</h1>"));
    assert_eq!(instance.output(), "body");
}

#[test]
fn optional_sections_render_nothing_when_missing() {
    let engine = engine_with(vec![
        ("_Layout", "[@RenderSection(\"Scripts\", required: false)]@RenderBody()"),
        ("page", "body"),
    ]);
    assert_eq!(engine.render("page", &Model::new()).unwrap(), "[]body");
}

#[test]
fn required_sections_must_be_defined() {
    let engine = engine_with(vec![
        ("_Layout", "@RenderSection(\"Title\")@RenderBody()"),
        ("page", "body"),
    ]);
    let err = engine.render("page", &Model::new()).unwrap_err();
    match err.kind {
        ErrorKind::MissingSection { ref page, ref section } => {
            assert_eq!(page, "_Layout");
            assert_eq!(section, "Title");
        }
        _ => panic!("unexpected error {:?}", err),
    }
    assert!(err.is_render_error());
}

#[test]
fn required_flag_can_be_an_expression() {
    let mut model = Model::new();
    model.insert("Strict", &false);
    let engine = engine_with(vec![
        ("_Layout", "@RenderSection(\"Title\", Model.Strict)@RenderBody()"),
        ("page", "body"),
    ]);
    assert_eq!(engine.render("page", &model).unwrap(), "body");
}

#[test]
fn section_names_are_case_insensitive() {
    let engine = engine_with(vec![
        ("_Layout", "@RenderSection(\"title\")|@RenderBody()"),
        ("page", "@section TITLE {t}\nbody"),
    ]);
    assert_eq!(engine.render("page", &Model::new()).unwrap(), "t|body");
}

#[test]
fn section_output_is_not_escaped_twice() {
    let mut model = Model::new();
    model.insert("Html", &"<b>");
    let engine = engine_with(vec![
        ("_Layout", "@RenderSection(\"S\")"),
        ("page", "@section S {<i>@Model.Html</i>}"),
    ]);
    assert_eq!(engine.render("page", &model).unwrap(), "<i>&lt;b&gt;</i>");
}

#[test]
fn sections_see_page_locals() {
    let engine = engine_with(vec![
        ("_Layout", "@RenderSection(\"S\")"),
        ("page", "@{ var greeting = \"Hi \" + Model.Name; }\n@section S {@greeting}"),
    ]);
    assert_eq!(engine.render("page", &world()).unwrap(), "Hi World");
}

#[test]
fn sections_can_be_forwarded_by_nested_layouts() {
    let engine = engine_with(vec![
        ("Base", "<head>@RenderSection(\"Scripts\", required: false)</head>@RenderBody()"),
        (
            "Main",
            "@{ Layout = \"Base\"; }\n@section Scripts {@RenderSection(\"Scripts\", required: false)}\n<main>@RenderBody()</main>",
        ),
        ("page", "@{ Layout = \"Main\"; }\n@section Scripts {<script></script>}\nbody"),
    ]);
    let result = engine.render("page", &Model::new());
    assert_eq!(result.unwrap(), "<head><script></script></head><main>body</main>");
}

#[test]
fn render_body_outside_a_layout_fails() {
    let engine = engine_with(vec![("page", "@RenderBody()")]);
    let err = engine.render("page", &Model::new()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Render { ref page } if page == "page"));
    assert_eq!(err.source().unwrap().to_string(), "`RenderBody()` can only be used in a layout");
}

#[test]
fn render_section_outside_a_layout_fails() {
    let engine = engine_with(vec![("page", "@RenderSection(\"A\", required: false)")]);
    let err = engine.render("page", &Model::new()).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Render { .. }));
}

#[test]
fn duplicate_sections_do_not_compile() {
    let engine = engine_with(vec![("page", "@section A {a}\n@section a {b}")]);
    let err = engine.render("page", &Model::new()).unwrap_err();
    match err.kind {
        ErrorKind::Compilation { ref path, line, column, ref message } => {
            assert_eq!(path, "page");
            assert_eq!((line, column), (2, 1));
            assert_eq!(message, "Section 'a' is already defined");
        }
        _ => panic!("unexpected error {:?}", err),
    }
}
